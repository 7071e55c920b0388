// src/models/establishment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// 1. Establishment (a operação física: campo, tambo, estância)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Establishment {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub owner_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Listagem administrativa, com o e-mail do dono
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentSummary {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub owner_id: Option<Uuid>,
    pub owner_email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// Mesma listagem com as chaves em espanhol que o painel antigo (`/establecimientos`) espera
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EstablecimientoView {
    pub id: Uuid,
    pub nombre: String,
    /// Não existe no cadastro; sempre `null`.
    pub numero_oficial: Option<String>,
    pub propietario_email: Option<String>,
    pub direccion: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<EstablishmentSummary> for EstablecimientoView {
    fn from(e: EstablishmentSummary) -> Self {
        Self {
            id: e.id,
            nombre: e.name,
            numero_oficial: None,
            propietario_email: e.owner_email,
            direccion: e.address,
            telefono: e.phone,
            email: e.email,
            is_active: e.is_active,
            created_at: e.created_at,
        }
    }
}

// ---
// 2. Membership (a "ponte" usuário <-> estabelecimento)
// ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user_id: Uuid,
    pub establishment_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// O estabelecimento ativo do usuário, resolvido uma vez por requisição.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentScope {
    #[sqlx(rename = "establishment_id")]
    pub id: Uuid,
    #[sqlx(rename = "establishment_name")]
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewEstablishment {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub owner_id: Option<Uuid>,
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEstablishmentPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Establishment name is required."))]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email."))]
    pub email: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignMemberPayload {
    #[validate(required(message = "userId is required."))]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EstablishmentListResponse {
    pub establishments: Vec<EstablishmentSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EstablishmentResponse {
    pub message: String,
    pub establishment: Establishment,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipResponse {
    pub message: String,
    pub membership: Membership,
}
