// src/handlers/admin.rs

use axum::{
    extract::{Path, Query, State},
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
    middleware::auth::AuthenticatedUser,
    models::{
        admin::{AdminStats, AdminUserResponse, CreateUserPayload, UpdateUserPayload, UserListQuery, UserListResponse},
        auth::MessageResponse,
        establishment::{
            AssignMemberPayload, CreateEstablishmentPayload, EstablecimientoView, EstablishmentListResponse,
            EstablishmentResponse, MembershipResponse,
        },
    },
};

// =============================================================================
//  1. USUÁRIOS
// =============================================================================

// GET /api/admin/users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    params(UserListQuery),
    responses(
        (status = 200, description = "Usuários paginados, mais recentes primeiro", body = UserListResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<UserListQuery>, AppError>,
) -> Result<Json<UserListResponse>, AppError> {
    let users = app_state.admin_service.list_users(query).await?;
    Ok(Json(users))
}

// GET /api/admin/users/{id}
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário com permissões administrativas", body = AdminUserResponse),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let user = app_state.admin_service.get_user(id).await?;
    Ok(Json(AdminUserResponse { message: None, user }))
}

// POST /api/admin/users
#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Admin",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = AdminUserResponse),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateUserPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state.admin_service.create_user(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(AdminUserResponse {
            message: Some("User created successfully".into()),
            user,
        }),
    ))
}

// PUT /api/admin/users/{id}
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    request_body = UpdateUserPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário atualizado", body = AdminUserResponse),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateUserPayload>, AppError>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let user = app_state.admin_service.update_user(id, payload).await?;

    Ok(Json(AdminUserResponse {
        message: Some("User updated successfully".into()),
        user,
    }))
}

// DELETE /api/admin/users/{id} (só super admin)
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário removido", body = MessageResponse),
        (status = 400, description = "Tentativa de remover a própria conta"),
        (status = 403, description = "Alvo é super admin"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.admin_service.delete_user(&claims, id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

// GET /api/admin/stats
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Contadores do sistema", body = AdminStats)
    ),
    security(("api_jwt" = []))
)]
pub async fn stats(State(app_state): State<AppState>) -> Result<Json<AdminStats>, AppError> {
    let stats = app_state.admin_service.stats().await?;
    Ok(Json(stats))
}

// =============================================================================
//  2. ESTABELECIMENTOS
// =============================================================================

// GET /api/admin/establishments
#[utoipa::path(
    get,
    path = "/api/admin/establishments",
    tag = "Admin",
    responses(
        (status = 200, description = "Estabelecimentos com o e-mail do dono", body = EstablishmentListResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_establishments(
    State(app_state): State<AppState>,
) -> Result<Json<EstablishmentListResponse>, AppError> {
    let establishments = app_state.establishment_service.list().await?;
    Ok(Json(EstablishmentListResponse { establishments }))
}

// GET /api/admin/establecimientos
#[utoipa::path(
    get,
    path = "/api/admin/establecimientos",
    tag = "Admin",
    responses(
        (status = 200, description = "Estabelecimentos com chaves em espanhol, mais recentes primeiro", body = Vec<EstablecimientoView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_establecimientos(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<EstablecimientoView>>, AppError> {
    let mut establishments = app_state.establishment_service.list().await?;
    establishments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(establishments.into_iter().map(EstablecimientoView::from).collect()))
}

// POST /api/admin/establishments
#[utoipa::path(
    post,
    path = "/api/admin/establishments",
    tag = "Admin",
    request_body = CreateEstablishmentPayload,
    responses(
        (status = 201, description = "Estabelecimento criado", body = EstablishmentResponse),
        (status = 404, description = "Dono informado não existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_establishment(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateEstablishmentPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let establishment = app_state.establishment_service.create(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(EstablishmentResponse {
            message: "Establishment created successfully".into(),
            establishment,
        }),
    ))
}

// POST /api/admin/establishments/{id}/members
#[utoipa::path(
    post,
    path = "/api/admin/establishments/{id}/members",
    tag = "Admin",
    request_body = AssignMemberPayload,
    params(("id" = Uuid, Path, description = "ID do estabelecimento")),
    responses(
        (status = 201, description = "Usuário vinculado; vínculos anteriores ficam inativos", body = MembershipResponse),
        (status = 404, description = "Estabelecimento ou usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_member(
    State(app_state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<AssignMemberPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::field("user_id", "required", "userId is required."))?;

    let membership = app_state.establishment_service.assign_member(id, user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(MembershipResponse {
            message: "User assigned to establishment".into(),
            membership,
        }),
    ))
}
