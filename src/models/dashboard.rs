// src/models/dashboard.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{activity::ActivityFeedItem, establishment::EstablishmentScope};

/// Nome exibido quando a ação não tem autor conhecido.
pub const SYSTEM_ACTOR: &str = "Sistema";

// 1. Os cards do topo
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentCounts {
    pub total_animals: i64,
    pub total_rodeos: i64,
    pub total_alerts: i64,
    pub pregnancy_alerts: i64,
    pub antibiotics_alerts: i64,
}

// 2. Produção agregada por dia
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyProduction {
    pub date: NaiveDate,
    pub animals_milked: i64,
    pub avg_liters_per_animal: Decimal,
    pub total_liters: Decimal,
    pub avg_quality: Decimal,
    pub total_records: i64,
}

// 3. Animais por rodeo
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RodeoSummary {
    pub id: Uuid,
    pub name: String,
    pub animal_count: i64,
    pub alerts_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductionSeries {
    pub daily: Vec<DailyProduction>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub establishment: EstablishmentScope,
    pub stats: EstablishmentCounts,
    pub production: ProductionSeries,
    pub activity: Vec<ActivityFeedItem>,
    pub rodeos: Vec<RodeoSummary>,
}

// --- Alertas ativos ---

// Linha plana vinda do banco; a resposta agrupa os dados do animal.
#[derive(Debug, Clone, FromRow)]
pub struct AlertFeedRow {
    pub id: Uuid,
    pub alert_type: String,
    pub title: String,
    pub description: Option<String>,
    pub alert_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub external_tag: Option<String>,
    pub internal_tag: Option<String>,
    pub animal_name: Option<String>,
    pub rodeo_name: Option<String>,
    pub created_by_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertAnimal {
    pub external_tag: Option<String>,
    pub internal_tag: Option<String>,
    pub name: Option<String>,
    pub rodeo: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertFeedItem {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub title: String,
    pub description: Option<String>,
    pub alert_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub animal: AlertAnimal,
    pub created_by: String,
}

impl From<AlertFeedRow> for AlertFeedItem {
    fn from(row: AlertFeedRow) -> Self {
        Self {
            id: row.id,
            alert_type: row.alert_type,
            title: row.title,
            description: row.description,
            alert_date: row.alert_date,
            created_at: row.created_at,
            animal: AlertAnimal {
                external_tag: row.external_tag,
                internal_tag: row.internal_tag,
                name: row.animal_name,
                rodeo: row.rodeo_name,
            },
            created_by: row.created_by_name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertFeedResponse {
    pub alerts: Vec<AlertFeedItem>,
}

// --- Busca rápida ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: Uuid,
    pub external_tag: Option<String>,
    pub internal_tag: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "rodeo")]
    pub rodeo_name: Option<String>,
    pub active_alerts: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub animals: Vec<SearchHit>,
}

// --- Resumo de produção ---
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionTotals {
    pub total_liters: Decimal,
    pub total_records: i64,
    pub avg_daily_liters: Decimal,
    pub days_with_data: i64,
    /// Janela pedida, em dias.
    pub period: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductionSummary {
    pub summary: ProductionTotals,
    pub daily: Vec<DailyProduction>,
}

// ---
// Query strings
// ---

#[derive(Debug, Deserialize, IntoParams)]
pub struct AlertFeedQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductionSummaryQuery {
    pub days: Option<i64>,
}
