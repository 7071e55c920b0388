// src/models/rodeo.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- 1. Rodeo (grupo de manejo dentro do estabelecimento) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rodeo {
    pub id: Uuid,
    pub establishment_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Listagem: rodeo + contagens de animais e alertas ativos
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RodeoWithCounts {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub rodeo: Rodeo,
    pub animal_count: i64,
    pub active_alerts: i64,
}

// Animal como aparece dentro da ficha do rodeo
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RodeoAnimal {
    pub id: Uuid,
    pub external_tag: Option<String>,
    pub internal_tag: Option<String>,
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub breed: Option<String>,
    pub active_alerts: i64,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RodeoPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Rodeo name is required."))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRodeoPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveAnimalsPayload {
    #[serde(default, alias = "animal_ids")]
    pub animal_ids: Vec<Uuid>,
    #[serde(alias = "to_rodeo_id")]
    pub to_rodeo_id: Option<Uuid>,
    pub reason: Option<String>,
}

// ---
// Respostas
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct RodeoListResponse {
    pub rodeos: Vec<RodeoWithCounts>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RodeoDetail {
    pub rodeo: Rodeo,
    pub animals: Vec<RodeoAnimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RodeoResponse {
    pub message: String,
    pub rodeo: Rodeo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveAnimalsResponse {
    pub message: String,
    pub moved_animals: usize,
    pub target_rodeo: String,
}
