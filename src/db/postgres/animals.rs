// src/db/postgres/animals.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{insert_activity, PgStore};
use crate::{
    common::{
        error::{unique_violation, AppError},
        pagination::{contains_pattern, PageRequest},
    },
    db::AnimalStore,
    models::{
        activity::NewActivity,
        animal::{Animal, AnimalFilter, AnimalHistory, AnimalListItem, AnimalMove, AnimalView, MovementView},
        record::{Alert, AnimalPhoto, HealthRecord, ProductionRecord, ReproductionRecord},
    },
};

const TAG_CONFLICT: &str = "Animal tag already exists";

fn push_animal_filter(qb: &mut QueryBuilder<'_, Postgres>, establishment_id: Uuid, filter: &AnimalFilter) {
    qb.push(" WHERE a.establishment_id = ")
        .push_bind(establishment_id)
        .push(" AND a.is_active");

    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        qb.push(" AND (a.external_tag ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR a.internal_tag ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR a.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(rodeo_id) = filter.rodeo_id {
        qb.push(" AND a.current_rodeo_id = ").push_bind(rodeo_id);
    }
}

#[async_trait]
impl AnimalStore for PgStore {
    async fn list_animals(
        &self,
        establishment_id: Uuid,
        filter: &AnimalFilter,
        page: PageRequest,
    ) -> Result<(Vec<AnimalListItem>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM animals a");
        push_animal_filter(&mut count, establishment_id, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT a.id, a.external_tag, a.internal_tag, a.name, a.birth_date, a.breed,
                   a.entry_date, a.observations, a.current_rodeo_id, r.name AS rodeo_name, a.created_at,
                   (SELECT COUNT(*) FROM animal_alerts aa
                    WHERE aa.animal_id = a.id AND aa.is_active) AS active_alerts
            FROM animals a
            LEFT JOIN rodeos r ON a.current_rodeo_id = r.id
            "#,
        );
        push_animal_filter(&mut qb, establishment_id, filter);
        qb.push(" ORDER BY a.created_at DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let animals = qb
            .build_query_as::<AnimalListItem>()
            .fetch_all(&self.pool)
            .await?;

        Ok((animals, total))
    }

    async fn find_animal(&self, establishment_id: Uuid, id: Uuid) -> Result<Option<Animal>, AppError> {
        let animal = sqlx::query_as::<_, Animal>(
            "SELECT * FROM animals WHERE id = $1 AND establishment_id = $2 AND is_active",
        )
        .bind(id)
        .bind(establishment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(animal)
    }

    async fn find_animals(&self, establishment_id: Uuid, ids: &[Uuid]) -> Result<Vec<Animal>, AppError> {
        let animals = sqlx::query_as::<_, Animal>(
            "SELECT * FROM animals WHERE id = ANY($1) AND establishment_id = $2 AND is_active",
        )
        .bind(ids)
        .bind(establishment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(animals)
    }

    async fn find_animal_view(&self, establishment_id: Uuid, id: Uuid) -> Result<Option<AnimalView>, AppError> {
        let view = sqlx::query_as::<_, AnimalView>(
            r#"
            SELECT a.*, r.name AS rodeo_name, m.name AS mother_name, m.external_tag AS mother_external_tag
            FROM animals a
            LEFT JOIN rodeos r ON a.current_rodeo_id = r.id
            LEFT JOIN animals m ON a.mother_id = m.id
            WHERE a.id = $1 AND a.establishment_id = $2 AND a.is_active
            "#,
        )
        .bind(id)
        .bind(establishment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(view)
    }

    async fn animal_history(&self, animal_id: Uuid) -> Result<AnimalHistory, AppError> {
        let production_records = sqlx::query_as::<_, ProductionRecord>(
            "SELECT * FROM animal_production_records WHERE animal_id = $1 ORDER BY record_date DESC, created_at DESC",
        )
        .bind(animal_id)
        .fetch_all(&self.pool)
        .await?;

        let health_records = sqlx::query_as::<_, HealthRecord>(
            "SELECT * FROM animal_health_records WHERE animal_id = $1 ORDER BY record_date DESC, created_at DESC",
        )
        .bind(animal_id)
        .fetch_all(&self.pool)
        .await?;

        let reproduction_records = sqlx::query_as::<_, ReproductionRecord>(
            "SELECT * FROM animal_reproduction_records WHERE animal_id = $1 ORDER BY record_date DESC, created_at DESC",
        )
        .bind(animal_id)
        .fetch_all(&self.pool)
        .await?;

        let movements = sqlx::query_as::<_, MovementView>(
            r#"
            SELECT am.*, r1.name AS from_rodeo_name, r2.name AS to_rodeo_name
            FROM animal_movements am
            LEFT JOIN rodeos r1 ON am.from_rodeo_id = r1.id
            LEFT JOIN rodeos r2 ON am.to_rodeo_id = r2.id
            WHERE am.animal_id = $1
            ORDER BY am.movement_date DESC
            "#,
        )
        .bind(animal_id)
        .fetch_all(&self.pool)
        .await?;

        let alerts = sqlx::query_as::<_, Alert>(
            "SELECT * FROM animal_alerts WHERE animal_id = $1 AND is_active ORDER BY alert_date DESC, created_at DESC",
        )
        .bind(animal_id)
        .fetch_all(&self.pool)
        .await?;

        let photos = sqlx::query_as::<_, AnimalPhoto>(
            "SELECT * FROM animal_photos WHERE animal_id = $1 ORDER BY is_primary DESC, created_at DESC",
        )
        .bind(animal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(AnimalHistory {
            production_records,
            health_records,
            reproduction_records,
            movements,
            alerts,
            photos,
        })
    }

    async fn external_tag_taken(&self, tag: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM animals
                WHERE external_tag = $1 AND is_active AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(tag)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn internal_tag_taken(
        &self,
        establishment_id: Uuid,
        tag: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM animals
                WHERE establishment_id = $1 AND internal_tag = $2 AND is_active
                  AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(establishment_id)
        .bind(tag)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert_animal(&self, animal: Animal, activity: NewActivity) -> Result<Animal, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Animal>(
            r#"
            INSERT INTO animals (
                id, establishment_id, current_rodeo_id, mother_id, external_tag, internal_tag,
                name, birth_date, breed, father_name, entry_date, observations, is_active,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(animal.id)
        .bind(animal.establishment_id)
        .bind(animal.current_rodeo_id)
        .bind(animal.mother_id)
        .bind(&animal.external_tag)
        .bind(&animal.internal_tag)
        .bind(&animal.name)
        .bind(animal.birth_date)
        .bind(&animal.breed)
        .bind(&animal.father_name)
        .bind(animal.entry_date)
        .bind(&animal.observations)
        .bind(animal.is_active)
        .bind(animal.created_at)
        .bind(animal.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(unique_violation(TAG_CONFLICT))?;

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update_animal(&self, animal: Animal, activity: NewActivity) -> Result<Animal, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Animal>(
            r#"
            UPDATE animals SET
                external_tag = $2, internal_tag = $3, name = $4, birth_date = $5, breed = $6,
                mother_id = $7, father_name = $8, entry_date = $9, observations = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(animal.id)
        .bind(&animal.external_tag)
        .bind(&animal.internal_tag)
        .bind(&animal.name)
        .bind(animal.birth_date)
        .bind(&animal.breed)
        .bind(animal.mother_id)
        .bind(&animal.father_name)
        .bind(animal.entry_date)
        .bind(&animal.observations)
        .fetch_one(&mut *tx)
        .await
        .map_err(unique_violation(TAG_CONFLICT))?;

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn record_moves(
        &self,
        moves: &[AnimalMove],
        reason: Option<&str>,
        created_by: Uuid,
        activity: NewActivity,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for step in moves {
            sqlx::query("UPDATE animals SET current_rodeo_id = $2, updated_at = NOW() WHERE id = $1")
                .bind(step.animal_id)
                .bind(step.to_rodeo_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO animal_movements (id, animal_id, from_rodeo_id, to_rodeo_id, reason, created_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(step.movement_id)
            .bind(step.animal_id)
            .bind(step.from_rodeo_id)
            .bind(step.to_rodeo_id)
            .bind(reason)
            .bind(created_by)
            .execute(&mut *tx)
            .await?;
        }

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn add_production_record(
        &self,
        record: ProductionRecord,
        activity: NewActivity,
    ) -> Result<ProductionRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, ProductionRecord>(
            r#"
            INSERT INTO animal_production_records
                (id, animal_id, record_date, liters_per_day, quality_rating, notes, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.animal_id)
        .bind(record.record_date)
        .bind(record.liters_per_day)
        .bind(record.quality_rating)
        .bind(&record.notes)
        .bind(record.created_by)
        .bind(record.created_at)
        .fetch_one(&mut *tx)
        .await?;

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn add_health_record(&self, record: HealthRecord, activity: NewActivity) -> Result<HealthRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, HealthRecord>(
            r#"
            INSERT INTO animal_health_records (
                id, animal_id, record_date, event_type, description, treatment, cost,
                veterinarian, notes, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.animal_id)
        .bind(record.record_date)
        .bind(&record.event_type)
        .bind(&record.description)
        .bind(&record.treatment)
        .bind(record.cost)
        .bind(&record.veterinarian)
        .bind(&record.notes)
        .bind(record.created_by)
        .bind(record.created_at)
        .fetch_one(&mut *tx)
        .await?;

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn add_reproduction_record(
        &self,
        record: ReproductionRecord,
        activity: NewActivity,
    ) -> Result<ReproductionRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, ReproductionRecord>(
            r#"
            INSERT INTO animal_reproduction_records (
                id, animal_id, record_date, record_type, bull_id, expected_birth_date,
                actual_birth_date, calf_sex, calf_weight, notes, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.animal_id)
        .bind(record.record_date)
        .bind(&record.record_type)
        .bind(&record.bull_id)
        .bind(record.expected_birth_date)
        .bind(record.actual_birth_date)
        .bind(&record.calf_sex)
        .bind(record.calf_weight)
        .bind(&record.notes)
        .bind(record.created_by)
        .bind(record.created_at)
        .fetch_one(&mut *tx)
        .await?;

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn add_alert(&self, alert: Alert, activity: NewActivity) -> Result<Alert, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Alert>(
            r#"
            INSERT INTO animal_alerts
                (id, animal_id, alert_type, title, description, alert_date, is_active, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(alert.id)
        .bind(alert.animal_id)
        .bind(&alert.alert_type)
        .bind(&alert.title)
        .bind(&alert.description)
        .bind(alert.alert_date)
        .bind(alert.is_active)
        .bind(alert.created_by)
        .bind(alert.created_at)
        .fetch_one(&mut *tx)
        .await?;

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn find_active_alert(&self, establishment_id: Uuid, alert_id: Uuid) -> Result<Option<Alert>, AppError> {
        let alert = sqlx::query_as::<_, Alert>(
            r#"
            SELECT aa.*
            FROM animal_alerts aa
            JOIN animals a ON aa.animal_id = a.id
            WHERE aa.id = $1 AND a.establishment_id = $2 AND aa.is_active
            "#,
        )
        .bind(alert_id)
        .bind(establishment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(alert)
    }

    async fn resolve_alert(
        &self,
        alert_id: Uuid,
        resolved_by: Uuid,
        resolved_date: NaiveDate,
        activity: NewActivity,
    ) -> Result<Option<Alert>, AppError> {
        let mut tx = self.pool.begin().await?;

        // `AND is_active` impede que dois pedidos concorrentes resolvam o mesmo alerta
        let resolved = sqlx::query_as::<_, Alert>(
            r#"
            UPDATE animal_alerts
            SET is_active = FALSE, resolved_by = $2, resolved_date = $3
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(alert_id)
        .bind(resolved_by)
        .bind(resolved_date)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(alert) = resolved else {
            return Ok(None);
        };

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(Some(alert))
    }

    async fn add_photo(&self, photo: AnimalPhoto, activity: NewActivity) -> Result<AnimalPhoto, AppError> {
        let mut tx = self.pool.begin().await?;

        if photo.is_primary {
            sqlx::query("UPDATE animal_photos SET is_primary = FALSE WHERE animal_id = $1 AND is_primary")
                .bind(photo.animal_id)
                .execute(&mut *tx)
                .await?;
        }

        // Índice parcial garante uma única principal mesmo com pedidos concorrentes
        let created = sqlx::query_as::<_, AnimalPhoto>(
            r#"
            INSERT INTO animal_photos (id, animal_id, photo_url, description, is_primary, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(photo.id)
        .bind(photo.animal_id)
        .bind(&photo.photo_url)
        .bind(&photo.description)
        .bind(photo.is_primary)
        .bind(photo.created_by)
        .bind(photo.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(unique_violation("Primary photo changed concurrently, try again"))?;

        insert_activity(&mut *tx, &activity).await?;
        tx.commit().await?;
        Ok(created)
    }
}
