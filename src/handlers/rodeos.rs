// src/handlers/rodeos.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, establishment::EstablishmentContext},
    models::{
        auth::MessageResponse,
        rodeo::{
            MoveAnimalsPayload, MoveAnimalsResponse, RodeoDetail, RodeoListResponse, RodeoPayload, RodeoResponse,
            UpdateRodeoPayload,
        },
    },
};

// GET /api/rodeos
#[utoipa::path(
    get,
    path = "/api/rodeos",
    tag = "Rodeos",
    responses(
        (status = 200, description = "Rodeos ativos, por nome", body = RodeoListResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_rodeos(
    State(app_state): State<AppState>,
    EstablishmentContext(scope): EstablishmentContext,
) -> Result<Json<RodeoListResponse>, AppError> {
    let rodeos = app_state.rodeo_service.list(&scope).await?;
    Ok(Json(RodeoListResponse { rodeos }))
}

// GET /api/rodeos/{id}
#[utoipa::path(
    get,
    path = "/api/rodeos/{id}",
    tag = "Rodeos",
    params(("id" = Uuid, Path, description = "ID do rodeo")),
    responses(
        (status = 200, description = "Rodeo com seus animais", body = RodeoDetail),
        (status = 404, description = "Rodeo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_rodeo(
    State(app_state): State<AppState>,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<RodeoDetail>, AppError> {
    let detail = app_state.rodeo_service.detail(&scope, id).await?;
    Ok(Json(detail))
}

// POST /api/rodeos
#[utoipa::path(
    post,
    path = "/api/rodeos",
    tag = "Rodeos",
    request_body = RodeoPayload,
    responses(
        (status = 201, description = "Rodeo criado", body = RodeoResponse),
        (status = 409, description = "Nome já usado no estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_rodeo(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Json(payload), _): WithRejection<Json<RodeoPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let rodeo = app_state.rodeo_service.create(&scope, claims.user_id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(RodeoResponse {
            message: "Rodeo created successfully".into(),
            rodeo,
        }),
    ))
}

// PUT /api/rodeos/{id}
#[utoipa::path(
    put,
    path = "/api/rodeos/{id}",
    tag = "Rodeos",
    request_body = UpdateRodeoPayload,
    params(("id" = Uuid, Path, description = "ID do rodeo")),
    responses(
        (status = 200, description = "Rodeo atualizado", body = RodeoResponse),
        (status = 404, description = "Rodeo não encontrado"),
        (status = 409, description = "Nome já usado no estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_rodeo(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateRodeoPayload>, AppError>,
) -> Result<Json<RodeoResponse>, AppError> {
    let rodeo = app_state.rodeo_service.update(&scope, claims.user_id, id, payload).await?;

    Ok(Json(RodeoResponse {
        message: "Rodeo updated successfully".into(),
        rodeo,
    }))
}

// DELETE /api/rodeos/{id}
#[utoipa::path(
    delete,
    path = "/api/rodeos/{id}",
    tag = "Rodeos",
    params(("id" = Uuid, Path, description = "ID do rodeo")),
    responses(
        (status = 200, description = "Rodeo removido", body = MessageResponse),
        (status = 400, description = "Rodeo ainda tem animais"),
        (status = 404, description = "Rodeo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_rodeo(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.rodeo_service.delete(&scope, claims.user_id, id).await?;
    Ok(Json(MessageResponse::new("Rodeo deleted successfully")))
}

// POST /api/rodeos/move-animals
#[utoipa::path(
    post,
    path = "/api/rodeos/move-animals",
    tag = "Rodeos",
    request_body = MoveAnimalsPayload,
    responses(
        (status = 200, description = "Animais movidos em lote", body = MoveAnimalsResponse),
        (status = 400, description = "Lista de animais vazia ou destino ausente"),
        (status = 404, description = "Rodeo de destino não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_animals(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Json(payload), _): WithRejection<Json<MoveAnimalsPayload>, AppError>,
) -> Result<Json<MoveAnimalsResponse>, AppError> {
    let moved = app_state
        .rodeo_service
        .move_animals(&scope, claims.user_id, payload)
        .await?;

    Ok(Json(moved))
}
