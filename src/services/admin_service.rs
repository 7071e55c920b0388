// src/services/admin_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{non_empty, PageRequest},
    },
    db::Store,
    models::{
        admin::{
            AdminStats, AdminUserView, CreateUserPayload, NewUser, UpdateUserPayload, UserChanges, UserFilter,
            UserListQuery, UserListResponse,
        },
        auth::{Claims, UserRole},
    },
    services::auth::AuthService,
};

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
    auth: AuthService,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>, auth: AuthService) -> Self {
        Self { store, auth }
    }

    pub async fn list_users(&self, query: UserListQuery) -> Result<UserListResponse, AppError> {
        let role = match non_empty(query.role) {
            Some(raw) => Some(
                UserRole::parse(&raw).ok_or_else(|| AppError::field("role", "invalid", "Invalid role."))?,
            ),
            None => None,
        };

        let filter = UserFilter {
            search: non_empty(query.search),
            role,
        };
        let page = PageRequest::new(query.page, query.limit);

        let (users, total) = self.store.list_users(&filter, page).await?;

        Ok(UserListResponse {
            users: users.into_iter().map(AdminUserView::from).collect(),
            pagination: page.describe(total),
        })
    }

    pub async fn get_user(&self, id: Uuid) -> Result<AdminUserView, AppError> {
        self.store
            .find_user_with_admin(id)
            .await?
            .map(AdminUserView::from)
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn create_user(&self, payload: CreateUserPayload) -> Result<AdminUserView, AppError> {
        if self.store.find_user_by_email(&payload.email).await?.is_some() {
            return Err(AppError::Conflict("User with this email already exists".into()));
        }

        let password_hash = self.auth.hash_password(&payload.password).await?;
        let user = self
            .store
            .create_user(NewUser {
                id: Uuid::new_v4(),
                email: payload.email,
                password_hash,
                first_name: payload.first_name,
                last_name: payload.last_name,
                phone: payload.phone,
                role: payload.role.unwrap_or_default(),
            })
            .await?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "Usuário criado pelo painel admin");
        self.get_user(user.id).await
    }

    pub async fn update_user(&self, id: Uuid, payload: UpdateUserPayload) -> Result<AdminUserView, AppError> {
        let changes = UserChanges {
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            role: payload.role,
            is_active: payload.is_active,
        };

        self.store
            .update_user(id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        self.get_user(id).await
    }

    pub async fn delete_user(&self, actor: &Claims, id: Uuid) -> Result<(), AppError> {
        if actor.user_id == id {
            return Err(AppError::BadRequest("Cannot delete your own account".into()));
        }

        let target = self
            .store
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if target.role == UserRole::SuperAdmin {
            return Err(AppError::Forbidden("Cannot delete super admin users".into()));
        }

        self.store.delete_user(id).await?;
        tracing::info!(user_id = %id, deleted_by = %actor.user_id, "Usuário removido");
        Ok(())
    }

    pub async fn stats(&self) -> Result<AdminStats, AppError> {
        self.store.admin_stats().await
    }
}
