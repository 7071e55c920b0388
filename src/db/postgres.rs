// src/db/postgres.rs

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::activity::NewActivity};

mod animals;
mod dashboard;
mod establishments;
mod rodeos;
mod users;

/// Backend PostgreSQL. Cada escrita composta roda numa única transação.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(Self::new(pool))
    }

    /// Aplica as migrações pendentes de `./migrations`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// Linha de auditoria, sempre dentro da transação da mutação que a originou
async fn insert_activity<'e, E>(executor: E, activity: &NewActivity) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO activity_log
            (id, establishment_id, user_id, activity_type, description, entity_type, entity_id, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(activity.id)
    .bind(activity.establishment_id)
    .bind(activity.user_id)
    .bind(activity.activity_type.as_str())
    .bind(&activity.description)
    .bind(activity.entity_type)
    .bind(activity.entity_id)
    .bind(&activity.metadata)
    .execute(executor)
    .await?;

    Ok(())
}
