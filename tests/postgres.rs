// tests/postgres.rs
//
// Mesmos fluxos HTTP, agora sobre o `PgStore`. Cada teste recebe um banco novo com as
// migrações aplicadas. Rodar com `DATABASE_URL` apontando para um Postgres e
// `cargo test --test postgres -- --ignored`.
mod common;

use std::sync::Arc;

use agromax_backend::db::PgStore;
use axum::http::StatusCode;
use common::TestApp;
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

async fn pg_app(pool: &PgPool) -> TestApp {
    TestApp::with_store(Arc::new(PgStore::new(pool.clone()))).await
}

async fn activity_count(pool: &PgPool, activity_type: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM activity_log WHERE activity_type = $1")
        .bind(activity_type)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn uuid(id: &str) -> Uuid {
    Uuid::parse_str(id).unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer Postgres em DATABASE_URL"]
async fn tag_indexes_enforce_scopes(pool: PgPool) {
    let app = pg_app(&pool).await;
    let a = app.farmer("a@fazenda.test", "Fazenda A").await;
    let b = app.farmer("b@fazenda.test", "Fazenda B").await;

    let mimosa = app
        .create_animal(&a.token, json!({ "externalTag": "BR-001", "internalTag": "12" }))
        .await;

    let (status, body) = app.post("/api/animals", &b.token, json!({ "externalTag": "BR-001" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "External tag already exists");

    let (status, _) = app.post("/api/animals", &b.token, json!({ "internalTag": "12" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post("/api/animals", &a.token, json!({ "internalTag": "12" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Internal tag already exists in this establishment");

    // o índice parcial também barra quem passar pela checagem do service
    let err = sqlx::query("INSERT INTO animals (id, establishment_id, external_tag) VALUES ($1, $2, 'BR-001')")
        .bind(Uuid::new_v4())
        .bind(uuid(&b.establishment_id))
        .execute(&pool)
        .await
        .unwrap_err();
    assert!(err.as_database_error().is_some_and(|e| e.is_unique_violation()));

    let (status, _) = app
        .put(&format!("/api/animals/{mimosa}"), &a.token, json!({ "externalTag": "BR-001", "internalTag": "12" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(activity_count(&pool, "animal_created").await, 2);
    assert_eq!(activity_count(&pool, "animal_updated").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer Postgres em DATABASE_URL"]
async fn move_to_foreign_rodeo_changes_nothing(pool: PgPool) {
    let app = pg_app(&pool).await;
    let a = app.farmer("a@fazenda.test", "Fazenda A").await;
    let b = app.farmer("b@fazenda.test", "Fazenda B").await;

    let rodeo_a = app.create_rodeo(&a.token, "Lactação").await;
    let rodeo_b = app.create_rodeo(&b.token, "Secas").await;
    let animal = app
        .create_animal(&a.token, json!({ "externalTag": "BR-100", "currentRodeoId": rodeo_a }))
        .await;

    let (status, body) = app
        .post(&format!("/api/animals/{animal}/move"), &a.token, json!({ "toRodeoId": rodeo_b }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Target rodeo not found");

    let current: Option<Uuid> = sqlx::query_scalar("SELECT current_rodeo_id FROM animals WHERE id = $1")
        .bind(uuid(&animal))
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(current, Some(uuid(&rodeo_a)));

    let movements: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM animal_movements")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(movements, 0);
    assert_eq!(activity_count(&pool, "animal_movement").await, 0);

    // e o outro estabelecimento nem enxerga o animal
    let (status, _) = app.get(&format!("/api/animals/{animal}"), &b.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer Postgres em DATABASE_URL"]
async fn bulk_move_is_one_transaction(pool: PgPool) {
    let app = pg_app(&pool).await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let origin = app.create_rodeo(&farmer.token, "Recria").await;
    let target = app.create_rodeo(&farmer.token, "Pré-parto").await;
    let first = app
        .create_animal(&farmer.token, json!({ "externalTag": "BR-301", "currentRodeoId": origin }))
        .await;
    let second = app.create_animal(&farmer.token, json!({ "externalTag": "BR-302" })).await;

    let (status, body) = app
        .post(
            "/api/rodeos/move-animals",
            &farmer.token,
            json!({ "animalIds": [first, second, Uuid::new_v4()], "toRodeoId": target, "reason": "Parto" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movedAnimals"], 2);

    let rows: Vec<(Uuid, Option<Uuid>, Option<String>)> = sqlx::query_as(
        "SELECT animal_id, from_rodeo_id, reason FROM animal_movements WHERE to_rodeo_id = $1 ORDER BY animal_id",
    )
    .bind(uuid(&target))
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(rows.len(), 2);
    let from_first = rows.iter().find(|(id, _, _)| *id == uuid(&first)).map(|(_, from, _)| *from);
    assert_eq!(from_first, Some(Some(uuid(&origin))));
    assert!(rows.iter().all(|(_, _, reason)| reason.as_deref() == Some("Parto")));

    assert_eq!(activity_count(&pool, "bulk_animal_movement").await, 1);

    let (_, body) = app.get(&format!("/api/rodeos/{target}"), &farmer.token).await;
    assert_eq!(body["animals"].as_array().unwrap().len(), 2);

    // origem vazia pode ser apagada; destino ocupado não
    let (status, _) = app.delete(&format!("/api/rodeos/{target}"), &farmer.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.delete(&format!("/api/rodeos/{origin}"), &farmer.token).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer Postgres em DATABASE_URL"]
async fn alerts_and_photos_round_through_postgres(pool: PgPool) {
    let app = pg_app(&pool).await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let animal = app.create_animal(&farmer.token, json!({ "externalTag": "BR-500" })).await;

    let (_, body) = app
        .post(
            &format!("/api/animals/{animal}/alerts"),
            &farmer.token,
            json!({ "alertType": "pregnancy", "title": "Confirmar prenhez" }),
        )
        .await;
    let alert = body["alert"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/animals/alerts/{alert}/resolve");
    let (status, _) = app.put(&uri, &farmer.token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.put(&uri, &farmer.token, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(activity_count(&pool, "alert_resolved").await, 1);

    let photos = format!("/api/animals/{animal}/photos");
    for url in ["https://cdn.test/1.jpg", "https://cdn.test/2.jpg"] {
        let (status, _) = app
            .post(&photos, &farmer.token, json!({ "photoUrl": url, "isPrimary": true }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app.get(&format!("/api/animals/{animal}"), &farmer.token).await;
    let listed = body["photos"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["photoUrl"], "https://cdn.test/2.jpg");
    assert_eq!(listed[1]["isPrimary"], false);
    assert_eq!(body["alerts"], json!([]));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer Postgres em DATABASE_URL"]
async fn admin_stats_count_roles_and_every_establishment(pool: PgPool) {
    let app = pg_app(&pool).await;
    let admin = app.admin_token().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;

    let (status, _) = app
        .put(&format!("/api/admin/users/{}", farmer.user_id), &admin, json!({ "role": "admin" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    sqlx::query("UPDATE establishments SET is_active = FALSE")
        .execute(&pool)
        .await
        .unwrap();

    let (_, body) = app.get("/api/admin/stats", &admin).await;
    assert_eq!(body["totalAdmins"], 2);
    assert_eq!(body["totalEstablishments"], 1);
}
