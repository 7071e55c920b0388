// src/models/animal.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::pagination::Pagination;
use crate::models::record::{Alert, AnimalPhoto, HealthRecord, ProductionRecord, ReproductionRecord};

// --- 1. Animal (a linha da tabela) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub id: Uuid,
    pub establishment_id: Uuid,
    pub current_rodeo_id: Option<Uuid>,
    pub mother_id: Option<Uuid>,

    // Brinco oficial (único no sistema) e brinco interno (único no estabelecimento)
    pub external_tag: Option<String>,
    pub internal_tag: Option<String>,

    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub breed: Option<String>,
    pub father_name: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub observations: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Animal {
    /// Como o animal aparece nas descrições do log de atividades.
    pub fn label(&self) -> &str {
        self.external_tag
            .as_deref()
            .or(self.internal_tag.as_deref())
            .unwrap_or("untagged")
    }
}

// --- 2. Linha da listagem paginada ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimalListItem {
    pub id: Uuid,
    pub external_tag: Option<String>,
    pub internal_tag: Option<String>,
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub breed: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub observations: Option<String>,
    pub current_rodeo_id: Option<Uuid>,
    pub rodeo_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub active_alerts: i64,
}

// --- 3. Ficha do animal (com nomes do rodeo e da mãe) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimalView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub animal: Animal,
    pub rodeo_name: Option<String>,
    pub mother_name: Option<String>,
    pub mother_external_tag: Option<String>,
}

// --- 4. Movimentação entre rodeos (log imutável) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub from_rodeo_id: Option<Uuid>,
    pub to_rodeo_id: Option<Uuid>,
    pub reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub movement_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementView {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movement: Movement,
    pub from_rodeo_name: Option<String>,
    pub to_rodeo_name: Option<String>,
}

/// Histórico completo de um animal, sempre do mais recente para o mais antigo.
#[derive(Debug, Clone, Default)]
pub struct AnimalHistory {
    pub production_records: Vec<ProductionRecord>,
    pub health_records: Vec<HealthRecord>,
    pub reproduction_records: Vec<ReproductionRecord>,
    pub movements: Vec<MovementView>,
    pub alerts: Vec<Alert>,
    /// Principal primeiro, depois as mais recentes.
    pub photos: Vec<AnimalPhoto>,
}

#[derive(Debug, Clone, Default)]
pub struct AnimalFilter {
    pub search: Option<String>,
    pub rodeo_id: Option<Uuid>,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AnimalListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub rodeo_id: Option<Uuid>,
}

// Usado tanto no POST quanto no PUT; no PUT, campo ausente mantém o valor atual.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimalPayload {
    #[validate(length(min = 1, max = 64, message = "External tag must have 1 to 64 characters."))]
    #[serde(alias = "external_tag", alias = "senasa_caravan")]
    pub external_tag: Option<String>,
    #[validate(length(min = 1, max = 64, message = "Internal tag must have 1 to 64 characters."))]
    #[serde(alias = "internal_tag", alias = "internal_caravan")]
    pub internal_tag: Option<String>,
    pub name: Option<String>,
    #[serde(alias = "birth_date")]
    pub birth_date: Option<NaiveDate>,
    pub breed: Option<String>,
    #[serde(alias = "mother_id")]
    pub mother_id: Option<Uuid>,
    #[serde(alias = "father_name")]
    pub father_name: Option<String>,
    #[serde(alias = "entry_date")]
    pub entry_date: Option<NaiveDate>,
    pub observations: Option<String>,
    /// Só considerado na criação; depois o rodeo muda apenas via movimentação.
    #[serde(alias = "current_rodeo_id")]
    pub current_rodeo_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveAnimalPayload {
    /// `null` (ou ausente) deixa o animal sem rodeo.
    #[serde(alias = "to_rodeo_id")]
    pub to_rodeo_id: Option<Uuid>,
    pub reason: Option<String>,
}

/// Uma transição de rodeo a ser gravada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimalMove {
    pub movement_id: Uuid,
    pub animal_id: Uuid,
    pub from_rodeo_id: Option<Uuid>,
    pub to_rodeo_id: Option<Uuid>,
}

// ---
// Respostas
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct AnimalListResponse {
    pub animals: Vec<AnimalListItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnimalDetail {
    pub animal: AnimalView,
    pub production_records: Vec<ProductionRecord>,
    pub health_records: Vec<HealthRecord>,
    pub reproduction_records: Vec<ReproductionRecord>,
    pub movements: Vec<MovementView>,
    pub alerts: Vec<Alert>,
    /// Principal primeiro, depois as mais recentes.
    pub photos: Vec<AnimalPhoto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnimalResponse {
    pub message: String,
    pub animal: Animal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveAnimalResponse {
    pub message: String,
    pub from_rodeo_id: Option<Uuid>,
    pub to_rodeo_id: Option<Uuid>,
}
