// src/db/postgres/dashboard.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::PgStore;
use crate::{
    common::{
        error::AppError,
        pagination::{contains_pattern, prefix_pattern},
    },
    db::DashboardStore,
    models::{
        activity::ActivityFeedItem,
        dashboard::{AlertFeedRow, DailyProduction, EstablishmentCounts, RodeoSummary, SearchHit, SYSTEM_ACTOR},
    },
};

#[async_trait]
impl DashboardStore for PgStore {
    async fn establishment_counts(&self, establishment_id: Uuid) -> Result<EstablishmentCounts, AppError> {
        let counts = sqlx::query_as::<_, EstablishmentCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM animals WHERE establishment_id = $1 AND is_active) AS total_animals,
                (SELECT COUNT(*) FROM rodeos WHERE establishment_id = $1 AND is_active) AS total_rodeos,
                (SELECT COUNT(*) FROM animal_alerts aa JOIN animals a ON aa.animal_id = a.id
                 WHERE a.establishment_id = $1 AND aa.is_active) AS total_alerts,
                (SELECT COUNT(*) FROM animal_alerts aa JOIN animals a ON aa.animal_id = a.id
                 WHERE a.establishment_id = $1 AND aa.is_active AND aa.alert_type = 'pregnancy') AS pregnancy_alerts,
                (SELECT COUNT(*) FROM animal_alerts aa JOIN animals a ON aa.animal_id = a.id
                 WHERE a.establishment_id = $1 AND aa.is_active AND aa.alert_type = 'antibiotics') AS antibiotics_alerts
            "#,
        )
        .bind(establishment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn daily_production(
        &self,
        establishment_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DailyProduction>, AppError> {
        let daily = sqlx::query_as::<_, DailyProduction>(
            r#"
            SELECT
                apr.record_date AS date,
                COUNT(DISTINCT apr.animal_id) AS animals_milked,
                ROUND(COALESCE(AVG(apr.liters_per_day), 0), 2) AS avg_liters_per_animal,
                COALESCE(SUM(apr.liters_per_day), 0) AS total_liters,
                ROUND(COALESCE(AVG(apr.quality_rating), 0), 2) AS avg_quality,
                COUNT(*) AS total_records
            FROM animal_production_records apr
            JOIN animals a ON apr.animal_id = a.id
            WHERE a.establishment_id = $1 AND apr.record_date >= $2
            GROUP BY apr.record_date
            ORDER BY apr.record_date ASC
            "#,
        )
        .bind(establishment_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(daily)
    }

    async fn recent_activity(&self, establishment_id: Uuid, limit: i64) -> Result<Vec<ActivityFeedItem>, AppError> {
        let activity = sqlx::query_as::<_, ActivityFeedItem>(
            r#"
            SELECT al.activity_type, al.description, al.created_at,
                   COALESCE(u.first_name || ' ' || u.last_name, $3) AS user_name
            FROM activity_log al
            LEFT JOIN users u ON al.user_id = u.id
            WHERE al.establishment_id = $1
            ORDER BY al.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(establishment_id)
        .bind(limit)
        .bind(SYSTEM_ACTOR)
        .fetch_all(&self.pool)
        .await?;

        Ok(activity)
    }

    async fn rodeo_summaries(&self, establishment_id: Uuid) -> Result<Vec<RodeoSummary>, AppError> {
        let rodeos = sqlx::query_as::<_, RodeoSummary>(
            r#"
            SELECT r.id, r.name,
                   COUNT(a.id) AS animal_count,
                   (SELECT COUNT(*) FROM animal_alerts aa
                    JOIN animals a2 ON aa.animal_id = a2.id
                    WHERE a2.current_rodeo_id = r.id AND a2.is_active AND aa.is_active) AS alerts_count
            FROM rodeos r
            LEFT JOIN animals a ON r.id = a.current_rodeo_id AND a.is_active
            WHERE r.establishment_id = $1 AND r.is_active
            GROUP BY r.id, r.name
            ORDER BY r.name
            "#,
        )
        .bind(establishment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rodeos)
    }

    async fn active_alert_feed(&self, establishment_id: Uuid, limit: i64) -> Result<Vec<AlertFeedRow>, AppError> {
        let alerts = sqlx::query_as::<_, AlertFeedRow>(
            r#"
            SELECT aa.id, aa.alert_type, aa.title, aa.description, aa.alert_date, aa.created_at,
                   a.external_tag, a.internal_tag, a.name AS animal_name, r.name AS rodeo_name,
                   COALESCE(u.first_name || ' ' || u.last_name, $3) AS created_by_name
            FROM animal_alerts aa
            JOIN animals a ON aa.animal_id = a.id
            LEFT JOIN rodeos r ON a.current_rodeo_id = r.id
            LEFT JOIN users u ON aa.created_by = u.id
            WHERE a.establishment_id = $1 AND aa.is_active
            ORDER BY aa.alert_date DESC, aa.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(establishment_id)
        .bind(limit)
        .bind(SYSTEM_ACTOR)
        .fetch_all(&self.pool)
        .await?;

        Ok(alerts)
    }

    async fn search_animals(&self, establishment_id: Uuid, query: &str, limit: i64) -> Result<Vec<SearchHit>, AppError> {
        // Prefixo do brinco oficial primeiro, depois do interno, depois o resto
        let hits = sqlx::query_as::<_, SearchHit>(
            r#"
            SELECT a.id, a.external_tag, a.internal_tag, a.name, r.name AS rodeo_name,
                   (SELECT COUNT(*) FROM animal_alerts aa
                    WHERE aa.animal_id = a.id AND aa.is_active) AS active_alerts
            FROM animals a
            LEFT JOIN rodeos r ON a.current_rodeo_id = r.id
            WHERE a.establishment_id = $1
              AND a.is_active
              AND (a.external_tag ILIKE $2 OR a.internal_tag ILIKE $2 OR a.name ILIKE $2)
            ORDER BY
                CASE
                    WHEN a.external_tag ILIKE $3 THEN 1
                    WHEN a.internal_tag ILIKE $3 THEN 2
                    ELSE 3
                END,
                a.external_tag, a.internal_tag, a.name
            LIMIT $4
            "#,
        )
        .bind(establishment_id)
        .bind(contains_pattern(query))
        .bind(prefix_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(hits)
    }
}
