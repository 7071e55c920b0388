// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{Claims, UserRole},
};

// Valida o `Authorization: Bearer <token>` e guarda as claims nos extensions da requisição.
// Header ausente -> 401; presente mas em outro esquema (Basic etc.) -> 403, como token inválido.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_try_get::<Authorization<Bearer>>()
        .map_err(|_| AppError::InvalidToken)?
        .ok_or(AppError::MissingToken)?;

    let claims = app_state.auth_service.verify_token(bearer.token())?;

    request.extensions_mut().insert(AuthenticatedUser(claims));
    Ok(next.run(request).await)
}

// Precisa rodar depois do `auth_guard`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = authenticated(&request)?;
    if !user.0.role.is_admin() {
        return Err(AppError::Forbidden("Admin access required".into()));
    }
    Ok(next.run(request).await)
}

pub async fn require_super_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = authenticated(&request)?;
    if user.0.role != UserRole::SuperAdmin {
        return Err(AppError::Forbidden("Super admin access required".into()));
    }
    Ok(next.run(request).await)
}

fn authenticated(request: &Request) -> Result<&AuthenticatedUser, AppError> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AppError::MissingToken)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::MissingToken)
    }
}
