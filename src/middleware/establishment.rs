// src/middleware/establishment.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::establishment::EstablishmentScope,
};

// O estabelecimento do usuário autenticado. Toda leitura e escrita de
// animais, rodeos e alertas é filtrada por ele.
#[derive(Debug, Clone)]
pub struct EstablishmentContext(pub EstablishmentScope);

pub async fn establishment_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.0.user_id)
        .ok_or(AppError::MissingToken)?;

    let scope = app_state.establishment_service.resolve_scope(user_id).await?;

    request.extensions_mut().insert(EstablishmentContext(scope));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for EstablishmentContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<EstablishmentContext>()
            .cloned()
            .ok_or_else(|| AppError::Forbidden("User not associated with any establishment".into()))
    }
}
