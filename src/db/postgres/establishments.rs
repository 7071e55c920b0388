// src/db/postgres/establishments.rs

use async_trait::async_trait;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use super::PgStore;
use crate::{
    common::error::AppError,
    db::EstablishmentStore,
    models::establishment::{Establishment, EstablishmentScope, EstablishmentSummary, Membership, NewEstablishment},
};

// Um usuário tem no máximo um vínculo ativo
async fn activate_membership(
    conn: &mut sqlx::PgConnection,
    establishment_id: Uuid,
    user_id: Uuid,
) -> Result<Membership, AppError> {
    sqlx::query("UPDATE user_establishments SET is_active = FALSE WHERE user_id = $1 AND establishment_id <> $2")
        .bind(user_id)
        .bind(establishment_id)
        .execute(&mut *conn)
        .await?;

    upsert_membership(&mut *conn, establishment_id, user_id).await
}

async fn upsert_membership<'e, E>(executor: E, establishment_id: Uuid, user_id: Uuid) -> Result<Membership, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let membership = sqlx::query_as::<_, Membership>(
        r#"
        INSERT INTO user_establishments (user_id, establishment_id, is_active)
        VALUES ($1, $2, TRUE)
        ON CONFLICT (user_id, establishment_id) DO UPDATE SET is_active = TRUE
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(establishment_id)
    .fetch_one(executor)
    .await?;

    Ok(membership)
}

#[async_trait]
impl EstablishmentStore for PgStore {
    async fn resolve_scope(&self, user_id: Uuid) -> Result<Option<EstablishmentScope>, AppError> {
        let scope = sqlx::query_as::<_, EstablishmentScope>(
            r#"
            SELECT ue.establishment_id, e.name AS establishment_name
            FROM user_establishments ue
            JOIN establishments e ON ue.establishment_id = e.id
            WHERE ue.user_id = $1 AND ue.is_active
            ORDER BY ue.created_at ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(scope)
    }

    async fn list_establishments(&self) -> Result<Vec<EstablishmentSummary>, AppError> {
        let establishments = sqlx::query_as::<_, EstablishmentSummary>(
            r#"
            SELECT e.id, e.name, e.address, e.phone, e.email, e.owner_id,
                   u.email AS owner_email, e.is_active, e.created_at
            FROM establishments e
            LEFT JOIN users u ON e.owner_id = u.id
            ORDER BY e.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(establishments)
    }

    async fn find_establishment(&self, id: Uuid) -> Result<Option<Establishment>, AppError> {
        let establishment = sqlx::query_as::<_, Establishment>("SELECT * FROM establishments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(establishment)
    }

    async fn create_establishment(&self, new: NewEstablishment) -> Result<Establishment, AppError> {
        let mut tx = self.pool.begin().await?;

        let establishment = sqlx::query_as::<_, Establishment>(
            r#"
            INSERT INTO establishments (id, name, address, phone, email, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(&new.name)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(new.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(owner_id) = new.owner_id {
            activate_membership(&mut tx, establishment.id, owner_id).await?;
        }

        tx.commit().await?;
        Ok(establishment)
    }

    async fn assign_member(&self, establishment_id: Uuid, user_id: Uuid) -> Result<Membership, AppError> {
        let mut tx = self.pool.begin().await?;
        let membership = activate_membership(&mut tx, establishment_id, user_id).await?;
        tx.commit().await?;
        Ok(membership)
    }
}
