// src/config.rs

use std::{env, sync::Arc};

use anyhow::Context;

use crate::{
    db::{MemoryStore, PgStore, Store},
    services::{
        admin_service::AdminService, animal_service::AnimalService, auth::AuthService,
        dashboard_service::DashboardService, establishment_service::EstablishmentService,
        rodeo_service::RodeoService,
    },
};

const MEMORY_URL: &str = "memory://";

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub bcrypt_cost: u32,
    /// Vazio significa qualquer origem (`*`).
    pub cors_origins: Vec<String>,
    pub bootstrap_admin: Option<(String, String)>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("PORT inválida: {raw}"))?,
            None => 3000,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => raw.parse().with_context(|| format!("BCRYPT_COST inválido: {raw}"))?,
            None => bcrypt::DEFAULT_COST,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty() && *origin != "*")
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let bootstrap_admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            port,
            bcrypt_cost,
            cors_origins,
            bootstrap_admin,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth_service: AuthService,
    pub admin_service: AdminService,
    pub establishment_service: EstablishmentService,
    pub animal_service: AnimalService,
    pub rodeo_service: RodeoService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn Store> = if config.database_url.starts_with(MEMORY_URL) {
            tracing::warn!("Usando armazenamento em memória; os dados somem ao encerrar o processo.");
            Arc::new(MemoryStore::new())
        } else {
            let store = PgStore::connect(&config.database_url).await?;
            store.migrate().await?;
            Arc::new(store)
        };

        let state = Self::with_store(store, config.jwt_secret.clone(), config.bcrypt_cost);

        if let Some((email, password)) = &config.bootstrap_admin {
            state
                .auth_service
                .ensure_super_admin(email, password)
                .await
                .context("Falha ao criar o super admin inicial")?;
        }

        Ok(state)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_store(store: Arc<dyn Store>, jwt_secret: String, bcrypt_cost: u32) -> Self {
        let auth_service = AuthService::new(store.clone(), jwt_secret, bcrypt_cost);

        Self {
            admin_service: AdminService::new(store.clone(), auth_service.clone()),
            establishment_service: EstablishmentService::new(store.clone()),
            animal_service: AnimalService::new(store.clone()),
            rodeo_service: RodeoService::new(store.clone()),
            dashboard_service: DashboardService::new(store.clone()),
            auth_service,
            store,
        }
    }
}
