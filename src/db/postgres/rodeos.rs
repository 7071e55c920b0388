// src/db/postgres/rodeos.rs

use async_trait::async_trait;
use uuid::Uuid;

use super::{insert_activity, PgStore};
use crate::{
    common::error::{unique_violation, AppError},
    db::RodeoStore,
    models::{
        activity::NewActivity,
        rodeo::{Rodeo, RodeoAnimal, RodeoWithCounts},
    },
};

const NAME_CONFLICT: &str = "Rodeo name already exists in this establishment";

#[async_trait]
impl RodeoStore for PgStore {
    async fn list_rodeos(&self, establishment_id: Uuid) -> Result<Vec<RodeoWithCounts>, AppError> {
        let rodeos = sqlx::query_as::<_, RodeoWithCounts>(
            r#"
            SELECT r.*,
                   COUNT(a.id) AS animal_count,
                   (SELECT COUNT(*) FROM animal_alerts aa
                    JOIN animals a2 ON aa.animal_id = a2.id
                    WHERE a2.current_rodeo_id = r.id AND a2.is_active AND aa.is_active) AS active_alerts
            FROM rodeos r
            LEFT JOIN animals a ON r.id = a.current_rodeo_id AND a.is_active
            WHERE r.establishment_id = $1 AND r.is_active
            GROUP BY r.id
            ORDER BY r.name
            "#,
        )
        .bind(establishment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rodeos)
    }

    async fn find_rodeo(&self, establishment_id: Uuid, id: Uuid) -> Result<Option<Rodeo>, AppError> {
        let rodeo = sqlx::query_as::<_, Rodeo>(
            "SELECT * FROM rodeos WHERE id = $1 AND establishment_id = $2 AND is_active",
        )
        .bind(id)
        .bind(establishment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rodeo)
    }

    async fn rodeo_animals(&self, establishment_id: Uuid, rodeo_id: Uuid) -> Result<Vec<RodeoAnimal>, AppError> {
        let animals = sqlx::query_as::<_, RodeoAnimal>(
            r#"
            SELECT a.id, a.external_tag, a.internal_tag, a.name, a.birth_date, a.breed,
                   (SELECT COUNT(*) FROM animal_alerts aa
                    WHERE aa.animal_id = a.id AND aa.is_active) AS active_alerts
            FROM animals a
            WHERE a.current_rodeo_id = $1 AND a.establishment_id = $2 AND a.is_active
            ORDER BY a.external_tag, a.internal_tag, a.name
            "#,
        )
        .bind(rodeo_id)
        .bind(establishment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(animals)
    }

    async fn rodeo_name_taken(
        &self,
        establishment_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM rodeos
                WHERE establishment_id = $1 AND name = $2 AND is_active
                  AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(establishment_id)
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn count_rodeo_animals(&self, rodeo_id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM animals WHERE current_rodeo_id = $1 AND is_active")
            .bind(rodeo_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_rodeo(&self, rodeo: Rodeo, activity: NewActivity) -> Result<Rodeo, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Rodeo>(
            r#"
            INSERT INTO rodeos (id, establishment_id, name, description, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(rodeo.id)
        .bind(rodeo.establishment_id)
        .bind(&rodeo.name)
        .bind(&rodeo.description)
        .bind(rodeo.is_active)
        .bind(rodeo.created_at)
        .bind(rodeo.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(unique_violation(NAME_CONFLICT))?;

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update_rodeo(&self, rodeo: Rodeo, activity: NewActivity) -> Result<Rodeo, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Rodeo>(
            r#"
            UPDATE rodeos SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(rodeo.id)
        .bind(&rodeo.name)
        .bind(&rodeo.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(unique_violation(NAME_CONFLICT))?;

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn deactivate_rodeo(&self, rodeo_id: Uuid, activity: NewActivity) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE rodeos SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(rodeo_id)
            .execute(&mut *tx)
            .await?;

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(())
    }
}
