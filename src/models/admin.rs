// src/models/admin.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::pagination::Pagination;
use crate::models::auth::UserRole;

// ---
// Linhas e filtros usados pelo store
// ---

/// Usuário a ser inserido. Papéis administrativos também ganham a linha em `administrators`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

/// Alterações parciais; `None` mantém o valor atual.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<UserRole>,
}

// Usuário + (opcionalmente) sua linha de administrador, via LEFT JOIN
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserWithAdmin {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub admin_level: Option<UserRole>,
    pub can_manage_users: Option<bool>,
    pub can_manage_establishments: Option<bool>,
    pub can_view_reports: Option<bool>,
}

// ---
// Respostas
// ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminPermissions {
    pub level: UserRole,
    pub can_manage_users: bool,
    pub can_manage_establishments: bool,
    pub can_view_reports: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub admin: Option<AdminPermissions>,
}

impl From<UserWithAdmin> for AdminUserView {
    fn from(row: UserWithAdmin) -> Self {
        let admin = row.admin_level.map(|level| AdminPermissions {
            level,
            can_manage_users: row.can_manage_users.unwrap_or(false),
            can_manage_establishments: row.can_manage_establishments.unwrap_or(false),
            can_view_reports: row.can_view_reports.unwrap_or(false),
        });

        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            role: row.role,
            is_active: row.is_active,
            created_at: row.created_at,
            admin,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<AdminUserView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: AdminUserView,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: i64,
    pub total_admins: i64,
    pub active_users: i64,
    pub total_establishments: i64,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    /// `user`, `admin` ou `super_admin`
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[serde(default)]
    #[validate(email(message = "A valid email is required."))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must have at least 6 characters."))]
    pub password: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "First name is required."))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Last name is required."))]
    pub last_name: String,

    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}
