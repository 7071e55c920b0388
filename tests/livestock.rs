// tests/livestock.rs
mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestApp;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};
use uuid::Uuid;

fn tags(hits: &Value, field: &str) -> Vec<String> {
    hits.as_array()
        .unwrap()
        .iter()
        .map(|hit| hit[field].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn tags_are_unique_per_scope() {
    let app = TestApp::new().await;
    let a = app.farmer("a@fazenda.test", "Fazenda A").await;
    let b = app.farmer("b@fazenda.test", "Fazenda B").await;

    let mimosa = app
        .create_animal(&a.token, json!({ "externalTag": "BR-001", "internalTag": "12", "name": "Mimosa" }))
        .await;

    // brinco externo é único no sistema inteiro
    let (status, body) = app
        .post("/api/animals", &b.token, json!({ "externalTag": "BR-001" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "External tag already exists");

    // brinco interno só dentro do estabelecimento
    let (status, _) = app.post("/api/animals", &b.token, json!({ "internalTag": "12" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post("/api/animals", &a.token, json!({ "internalTag": "12" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Internal tag already exists in this establishment");

    let (status, body) = app.post("/api/animals", &a.token, json!({ "name": "Sem brinco" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "At least one tag (external or internal) is required");

    // reenviar os próprios brincos na edição não conflita
    let (status, body) = app
        .put(
            &format!("/api/animals/{mimosa}"),
            &a.token,
            json!({ "externalTag": "BR-001", "internalTag": "12", "breed": "Holandesa" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["animal"]["breed"], "Holandesa");
    assert_eq!(body["animal"]["name"], "Mimosa");
}

#[tokio::test]
async fn establishments_are_isolated() {
    let app = TestApp::new().await;
    let a = app.farmer("a@fazenda.test", "Fazenda A").await;
    let b = app.farmer("b@fazenda.test", "Fazenda B").await;

    let rodeo_a = app.create_rodeo(&a.token, "Lactação").await;
    let rodeo_b = app.create_rodeo(&b.token, "Secas").await;
    let animal = app
        .create_animal(&a.token, json!({ "externalTag": "BR-100", "currentRodeoId": rodeo_a }))
        .await;

    let (status, body) = app.get(&format!("/api/animals/{animal}"), &b.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Animal not found");

    let (status, body) = app
        .post(&format!("/api/animals/{animal}/move"), &a.token, json!({ "toRodeoId": rodeo_b }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Target rodeo not found");

    let (status, body) = app.get(&format!("/api/animals/{animal}"), &a.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["animal"]["currentRodeoId"], rodeo_a.as_str());
    assert_eq!(body["movements"].as_array().unwrap().len(), 0);

    let (status, _) = app
        .post(
            "/api/animals",
            &a.token,
            json!({ "externalTag": "BR-101", "currentRodeoId": rodeo_b }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/animals", &b.token).await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn moving_an_animal_records_the_history() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let origin = app.create_rodeo(&farmer.token, "Recria").await;
    let target = app.create_rodeo(&farmer.token, "Lactação").await;
    let animal = app
        .create_animal(&farmer.token, json!({ "externalTag": "BR-200", "currentRodeoId": origin }))
        .await;

    let (status, body) = app
        .post(
            &format!("/api/animals/{animal}/move"),
            &farmer.token,
            json!({ "toRodeoId": target, "reason": "Pariu" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromRodeoId"], origin.as_str());
    assert_eq!(body["toRodeoId"], target.as_str());

    let (_, body) = app.get(&format!("/api/animals/{animal}"), &farmer.token).await;
    assert_eq!(body["animal"]["currentRodeoId"], target.as_str());
    assert_eq!(body["animal"]["rodeoName"], "Lactação");
    let movements = body["movements"].as_array().unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["reason"], "Pariu");
    assert_eq!(movements[0]["toRodeoName"], "Lactação");
}

#[tokio::test]
async fn rodeo_with_animals_cannot_be_deleted() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let rodeo = app.create_rodeo(&farmer.token, "Maternidade").await;
    let animal = app
        .create_animal(&farmer.token, json!({ "internalTag": "7", "currentRodeoId": rodeo }))
        .await;

    let (status, body) = app.delete(&format!("/api/rodeos/{rodeo}"), &farmer.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Cannot delete rodeo with animals. Move animals to another rodeo first."
    );

    let (status, body) = app
        .post(&format!("/api/animals/{animal}/move"), &farmer.token, json!({ "toRodeoId": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["toRodeoId"], Value::Null);

    let (status, body) = app.delete(&format!("/api/rodeos/{rodeo}"), &farmer.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Rodeo deleted successfully");

    let (_, body) = app.get("/api/rodeos", &farmer.token).await;
    assert_eq!(body["rodeos"], json!([]));

    let (status, _) = app.get(&format!("/api/rodeos/{rodeo}"), &farmer.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rodeo_names_are_unique_per_establishment() {
    let app = TestApp::new().await;
    let a = app.farmer("a@fazenda.test", "Fazenda A").await;
    let b = app.farmer("b@fazenda.test", "Fazenda B").await;
    app.create_rodeo(&a.token, "Lote 1").await;

    let (status, _) = app.post("/api/rodeos", &a.token, json!({ "name": "Lote 1" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.create_rodeo(&b.token, "Lote 1").await;

    let (status, _) = app.post("/api/rodeos", &a.token, json!({ "name": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[case::camel_case("animalIds", "toRodeoId")]
#[case::snake_case("animal_ids", "to_rodeo_id")]
#[tokio::test]
async fn bulk_move_skips_unknown_animals(#[case] ids_key: &str, #[case] target_key: &str) {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let target = app.create_rodeo(&farmer.token, "Pré-parto").await;
    let first = app.create_animal(&farmer.token, json!({ "externalTag": "BR-301" })).await;
    let second = app.create_animal(&farmer.token, json!({ "externalTag": "BR-302" })).await;

    let mut payload = serde_json::Map::new();
    payload.insert(
        ids_key.to_string(),
        json!([first, second, Uuid::new_v4().to_string()]),
    );
    payload.insert(target_key.to_string(), json!(target));

    let (status, body) = app
        .post("/api/rodeos/move-animals", &farmer.token, Value::Object(payload))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movedAnimals"], 2);
    assert_eq!(body["targetRodeo"], "Pré-parto");

    let (_, body) = app.get(&format!("/api/rodeos/{target}"), &farmer.token).await;
    assert_eq!(body["animals"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn bulk_move_validates_its_input() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let target = app.create_rodeo(&farmer.token, "Pré-parto").await;
    let animal = app.create_animal(&farmer.token, json!({ "externalTag": "BR-400" })).await;

    let (status, body) = app
        .post("/api/rodeos/move-animals", &farmer.token, json!({ "animalIds": [], "toRodeoId": target }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Animal IDs array is required");

    let (status, body) = app
        .post("/api/rodeos/move-animals", &farmer.token, json!({ "animalIds": [animal] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Target rodeo ID is required");

    let (status, body) = app
        .post(
            "/api/rodeos/move-animals",
            &farmer.token,
            json!({ "animalIds": [animal], "toRodeoId": Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Target rodeo not found");
}

#[tokio::test]
async fn animal_list_is_paginated() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    for i in 0..12 {
        app.create_animal(&farmer.token, json!({ "externalTag": format!("PG-{i:02}") }))
            .await;
    }

    let (status, body) = app.get("/api/animals?page=2&limit=5", &farmer.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["animals"].as_array().unwrap().len(), 5);
    assert_eq!(body["pagination"], json!({ "page": 2, "limit": 5, "total": 12, "pages": 3 }));

    let (_, body) = app.get("/api/animals?page=4&limit=5", &farmer.token).await;
    assert_eq!(body["animals"], json!([]));
    assert_eq!(body["pagination"]["total"], 12);

    let (_, body) = app.get("/api/animals?search=pg-1", &farmer.token).await;
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn huge_page_number_returns_an_empty_page() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    app.create_animal(&farmer.token, json!({ "externalTag": "PG-01" })).await;

    let uri = format!("/api/animals?page={}&limit=100", i64::MAX);
    let (status, body) = app.get(&uri, &farmer.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["animals"], json!([]));
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["page"], i64::MAX);

    let admin = app.admin_token().await;
    let (status, body) = app.get(&uri.replace("/api/animals", "/api/admin/users"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"], json!([]));
}

#[tokio::test]
async fn alert_resolution_is_terminal() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let animal = app.create_animal(&farmer.token, json!({ "externalTag": "BR-500" })).await;

    let (status, body) = app
        .post(
            &format!("/api/animals/{animal}/alerts"),
            &farmer.token,
            json!({ "alertType": "pregnancy", "title": "Confirmar prenhez" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["alert"]["isActive"], true);
    let alert = body["alert"]["id"].as_str().unwrap().to_string();

    let (_, body) = app.get("/api/dashboard/alerts", &farmer.token).await;
    let feed = body["alerts"].as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["type"], "pregnancy");
    assert_eq!(feed[0]["animal"]["externalTag"], "BR-500");

    let (_, body) = app.get("/api/dashboard/stats", &farmer.token).await;
    assert_eq!(body["stats"]["totalAlerts"], 1);
    assert_eq!(body["stats"]["pregnancyAlerts"], 1);

    let uri = format!("/api/animals/alerts/{alert}/resolve");
    let (status, body) = app.put(&uri, &farmer.token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alert"]["isActive"], false);
    assert_eq!(body["alert"]["resolvedBy"], farmer.user_id.as_str());

    let (status, body) = app.put(&uri, &farmer.token, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Alert not found");

    let (_, body) = app.get("/api/dashboard/alerts", &farmer.token).await;
    assert_eq!(body["alerts"], json!([]));
}

#[rstest]
#[case::quality_too_high(json!({ "recordDate": "2025-03-01", "litersPerDay": 12, "qualityRating": 11 }))]
#[case::missing_liters(json!({ "recordDate": "2025-03-01" }))]
#[case::negative_liters(json!({ "recordDate": "2025-03-01", "litersPerDay": -1 }))]
#[case::missing_date(json!({ "litersPerDay": 12 }))]
#[tokio::test]
async fn invalid_production_records_are_rejected(#[case] payload: Value) {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let animal = app.create_animal(&farmer.token, json!({ "externalTag": "BR-600" })).await;

    let (status, body) = app
        .post(&format!("/api/animals/{animal}/production"), &farmer.token, payload)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn production_summary_aggregates_by_day() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let animal = app.create_animal(&farmer.token, json!({ "externalTag": "BR-700" })).await;
    let today = Utc::now().date_naive();
    let yesterday = today - Duration::days(1);

    for (date, liters) in [(yesterday, 10.0), (today, 20.5)] {
        let (status, body) = app
            .post(
                &format!("/api/animals/{animal}/production"),
                &farmer.token,
                json!({ "recordDate": date, "litersPerDay": liters, "qualityRating": 8 }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Production record added successfully");
    }

    let (status, body) = app.get("/api/dashboard/production-summary?days=7", &farmer.token).await;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["summary"];
    assert_eq!(summary["totalRecords"], 2);
    assert_eq!(summary["daysWithData"], 2);
    assert_eq!(summary["period"], 7);
    assert_eq!(summary["totalLiters"].as_f64(), Some(30.5));
    assert_eq!(summary["avgDailyLiters"].as_f64(), Some(15.25));

    let daily = body["daily"].as_array().unwrap();
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0]["date"], yesterday.to_string());
    assert_eq!(daily[1]["totalLiters"].as_f64(), Some(20.5));

    let (_, body) = app.get("/api/dashboard/stats", &farmer.token).await;
    assert_eq!(body["production"]["daily"].as_array().unwrap().len(), 2);
    let activity = body["activity"].as_array().unwrap();
    assert!(!activity.is_empty());
    assert!(activity.iter().all(|item| item["user"] == "Maria Souza"));
}

#[tokio::test]
async fn search_ranks_external_tag_prefix_first() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    app.create_animal(&farmer.token, json!({ "externalTag": "QQ-9", "name": "Lote 10" }))
        .await;
    app.create_animal(&farmer.token, json!({ "externalTag": "ZZ-1", "internalTag": "10B" }))
        .await;
    app.create_animal(&farmer.token, json!({ "externalTag": "10-A" })).await;
    app.create_animal(&farmer.token, json!({ "externalTag": "XX-99" })).await;

    let (status, body) = app.get("/api/dashboard/search?q=10", &farmer.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags(&body["animals"], "externalTag"), vec!["10-A", "ZZ-1", "QQ-9"]);

    let (_, body) = app.get("/api/dashboard/search?q=1", &farmer.token).await;
    assert_eq!(body["animals"], json!([]));
}

#[tokio::test]
async fn animal_detail_carries_every_history() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let mother = app
        .create_animal(&farmer.token, json!({ "externalTag": "MAE-1", "name": "Estrela" }))
        .await;
    let calf = app
        .create_animal(&farmer.token, json!({ "externalTag": "BEZ-1", "motherId": mother }))
        .await;

    let (status, _) = app
        .post(
            &format!("/api/animals/{calf}/health"),
            &farmer.token,
            json!({ "recordDate": "2025-02-10", "eventType": "vaccination", "treatment": "Aftosa" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            &format!("/api/animals/{mother}/reproduction"),
            &farmer.token,
            json!({ "recordDate": "2025-01-05", "recordType": "insemination", "bullId": "TOURO-7" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get(&format!("/api/animals/{calf}"), &farmer.token).await;
    assert_eq!(body["animal"]["motherName"], "Estrela");
    assert_eq!(body["animal"]["motherExternalTag"], "MAE-1");
    assert_eq!(body["healthRecords"].as_array().unwrap().len(), 1);

    let (_, body) = app.get(&format!("/api/animals/{mother}"), &farmer.token).await;
    assert_eq!(body["reproductionRecords"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .post("/api/animals", &farmer.token, json!({ "externalTag": "BEZ-2", "motherId": Uuid::new_v4() }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Mother not found");
}

#[tokio::test]
async fn detail_lists_the_primary_photo_first() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let animal = app.create_animal(&farmer.token, json!({ "externalTag": "FOTO-1" })).await;
    let uri = format!("/api/animals/{animal}/photos");

    let (status, body) = app
        .post(&uri, &farmer.token, json!({ "photoUrl": "https://cdn.test/perfil.jpg", "isPrimary": true }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["photo"]["isPrimary"], true);

    // nova principal desmarca a anterior
    app.post(&uri, &farmer.token, json!({ "photo_url": "https://cdn.test/pasto.jpg", "is_primary": true }))
        .await;
    app.post(&uri, &farmer.token, json!({ "photoUrl": "https://cdn.test/curral.jpg", "description": "curral" }))
        .await;

    let (status, body) = app.post(&uri, &farmer.token, json!({ "photoUrl": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["photo_url"][0], "photoUrl is required.");

    let (_, body) = app.get(&format!("/api/animals/{animal}"), &farmer.token).await;
    let photos = body["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 3);
    assert_eq!(photos[0]["photoUrl"], "https://cdn.test/pasto.jpg");
    assert_eq!(photos[0]["isPrimary"], true);
    assert!(photos[1..].iter().all(|p| p["isPrimary"] == false));
    assert_eq!(photos[1]["description"], "curral");

    let (_, body) = app.get("/api/dashboard/stats", &farmer.token).await;
    let activity = body["activity"].as_array().unwrap();
    assert_eq!(activity.iter().filter(|item| item["type"] == "photo_added").count(), 3);

    // animal de outro estabelecimento
    let other = app.farmer("b@fazenda.test", "Fazenda B").await;
    let (status, _) = app.post(&uri, &other.token, json!({ "photoUrl": "https://cdn.test/x.jpg" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn legacy_snake_case_create_body_is_accepted() {
    let app = TestApp::new().await;
    let farmer = app.farmer("a@fazenda.test", "Fazenda A").await;
    let rodeo = app.create_rodeo(&farmer.token, "Lote Leiteiro").await;

    let (status, body) = app
        .post(
            "/api/animals",
            &farmer.token,
            json!({
                "senasa_caravan": "AR-778",
                "internal_caravan": "41",
                "birth_date": "2023-08-14",
                "father_name": "Touro Bravo",
                "current_rodeo_id": rodeo
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // resposta sempre em camelCase
    let animal = &body["animal"];
    assert_eq!(animal["externalTag"], "AR-778");
    assert_eq!(animal["internalTag"], "41");
    assert_eq!(animal["birthDate"], "2023-08-14");
    assert_eq!(animal["fatherName"], "Touro Bravo");
    assert_eq!(animal["currentRodeoId"], rodeo.as_str());
    assert!(animal.get("external_tag").is_none());
}
