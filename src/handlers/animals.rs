// src/handlers/animals.rs

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
    middleware::{auth::AuthenticatedUser, establishment::EstablishmentContext},
    models::{
        animal::{
            AnimalDetail, AnimalListQuery, AnimalListResponse, AnimalPayload, AnimalResponse, MoveAnimalPayload,
            MoveAnimalResponse,
        },
        record::{
            AlertPayload, AlertResponse, HealthPayload, HealthRecord, PhotoPayload, PhotoResponse, ProductionPayload,
            ProductionRecord, RecordResponse, ReproductionPayload, ReproductionRecord,
        },
    },
};

// =============================================================================
//  1. CADASTRO
// =============================================================================

// GET /api/animals
#[utoipa::path(
    get,
    path = "/api/animals",
    tag = "Animals",
    params(AnimalListQuery),
    responses(
        (status = 200, description = "Animais ativos do estabelecimento", body = AnimalListResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_animals(
    State(app_state): State<AppState>,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Query(query), _): WithRejection<Query<AnimalListQuery>, AppError>,
) -> Result<Json<AnimalListResponse>, AppError> {
    let animals = app_state.animal_service.list(&scope, query).await?;
    Ok(Json(animals))
}

// GET /api/animals/{id}
#[utoipa::path(
    get,
    path = "/api/animals/{id}",
    tag = "Animals",
    params(("id" = Uuid, Path, description = "ID do animal")),
    responses(
        (status = 200, description = "Animal com histórico completo", body = AnimalDetail),
        (status = 404, description = "Animal não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_animal(
    State(app_state): State<AppState>,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<AnimalDetail>, AppError> {
    let detail = app_state.animal_service.detail(&scope, id).await?;
    Ok(Json(detail))
}

// POST /api/animals
#[utoipa::path(
    post,
    path = "/api/animals",
    tag = "Animals",
    request_body = AnimalPayload,
    responses(
        (status = 201, description = "Animal criado", body = AnimalResponse),
        (status = 400, description = "Nenhum brinco informado"),
        (status = 409, description = "Brinco já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_animal(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Json(payload), _): WithRejection<Json<AnimalPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let animal = app_state.animal_service.create(&scope, claims.user_id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(AnimalResponse {
            message: "Animal created successfully".into(),
            animal,
        }),
    ))
}

// PUT /api/animals/{id}
#[utoipa::path(
    put,
    path = "/api/animals/{id}",
    tag = "Animals",
    request_body = AnimalPayload,
    params(("id" = Uuid, Path, description = "ID do animal")),
    responses(
        (status = 200, description = "Animal atualizado", body = AnimalResponse),
        (status = 404, description = "Animal não encontrado"),
        (status = 409, description = "Brinco já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_animal(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<AnimalPayload>, AppError>,
) -> Result<Json<AnimalResponse>, AppError> {
    payload.validate()?;

    let animal = app_state.animal_service.update(&scope, claims.user_id, id, payload).await?;

    Ok(Json(AnimalResponse {
        message: "Animal updated successfully".into(),
        animal,
    }))
}

// POST /api/animals/{id}/move
#[utoipa::path(
    post,
    path = "/api/animals/{id}/move",
    tag = "Animals",
    request_body = MoveAnimalPayload,
    params(("id" = Uuid, Path, description = "ID do animal")),
    responses(
        (status = 200, description = "Animal movido; `toRodeoId` nulo deixa o animal sem rodeo", body = MoveAnimalResponse),
        (status = 404, description = "Animal ou rodeo de destino não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_animal(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<MoveAnimalPayload>, AppError>,
) -> Result<Json<MoveAnimalResponse>, AppError> {
    let movement = app_state.animal_service.move_to(&scope, claims.user_id, id, payload).await?;

    Ok(Json(MoveAnimalResponse {
        message: "Animal moved successfully".into(),
        from_rodeo_id: movement.from_rodeo_id,
        to_rodeo_id: movement.to_rodeo_id,
    }))
}

// =============================================================================
//  2. REGISTROS
// =============================================================================

// POST /api/animals/{id}/production
#[utoipa::path(
    post,
    path = "/api/animals/{id}/production",
    tag = "Animals",
    request_body = ProductionPayload,
    params(("id" = Uuid, Path, description = "ID do animal")),
    responses(
        (status = 201, description = "Registro de produção criado", body = RecordResponse<ProductionRecord>),
        (status = 404, description = "Animal não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_production_record(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<ProductionPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let record = app_state
        .animal_service
        .add_production(&scope, claims.user_id, id, payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordResponse {
            message: "Production record added successfully".into(),
            record,
        }),
    ))
}

// POST /api/animals/{id}/health
#[utoipa::path(
    post,
    path = "/api/animals/{id}/health",
    tag = "Animals",
    request_body = HealthPayload,
    params(("id" = Uuid, Path, description = "ID do animal")),
    responses(
        (status = 201, description = "Registro sanitário criado", body = RecordResponse<HealthRecord>),
        (status = 404, description = "Animal não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_health_record(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<HealthPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let record = app_state
        .animal_service
        .add_health(&scope, claims.user_id, id, payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordResponse {
            message: "Health record added successfully".into(),
            record,
        }),
    ))
}

// POST /api/animals/{id}/reproduction
#[utoipa::path(
    post,
    path = "/api/animals/{id}/reproduction",
    tag = "Animals",
    request_body = ReproductionPayload,
    params(("id" = Uuid, Path, description = "ID do animal")),
    responses(
        (status = 201, description = "Registro reprodutivo criado", body = RecordResponse<ReproductionRecord>),
        (status = 404, description = "Animal não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_reproduction_record(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<ReproductionPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let record = app_state
        .animal_service
        .add_reproduction(&scope, claims.user_id, id, payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordResponse {
            message: "Reproduction record added successfully".into(),
            record,
        }),
    ))
}

// =============================================================================
//  3. ALERTAS
// =============================================================================

// POST /api/animals/{id}/alerts
#[utoipa::path(
    post,
    path = "/api/animals/{id}/alerts",
    tag = "Animals",
    request_body = AlertPayload,
    params(("id" = Uuid, Path, description = "ID do animal")),
    responses(
        (status = 201, description = "Alerta criado", body = AlertResponse),
        (status = 404, description = "Animal não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_alert(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<AlertPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let alert = app_state.animal_service.add_alert(&scope, claims.user_id, id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(AlertResponse {
            message: "Alert added successfully".into(),
            alert,
        }),
    ))
}

// PUT /api/animals/alerts/{alert_id}/resolve
#[utoipa::path(
    put,
    path = "/api/animals/alerts/{alert_id}/resolve",
    tag = "Animals",
    params(("alert_id" = Uuid, Path, description = "ID do alerta")),
    responses(
        (status = 200, description = "Alerta resolvido", body = AlertResponse),
        (status = 404, description = "Alerta não encontrado ou já resolvido")
    ),
    security(("api_jwt" = []))
)]
pub async fn resolve_alert(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(alert_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<AlertResponse>, AppError> {
    let alert = app_state
        .animal_service
        .resolve_alert(&scope, claims.user_id, alert_id)
        .await?;

    Ok(Json(AlertResponse {
        message: "Alert resolved successfully".into(),
        alert,
    }))
}

// =============================================================================
//  4. FOTOS
// =============================================================================

// POST /api/animals/{id}/photos
#[utoipa::path(
    post,
    path = "/api/animals/{id}/photos",
    tag = "Animals",
    request_body = PhotoPayload,
    params(("id" = Uuid, Path, description = "ID do animal")),
    responses(
        (status = 201, description = "Foto registrada", body = PhotoResponse),
        (status = 400, description = "photoUrl ausente"),
        (status = 404, description = "Animal não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_photo(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<PhotoPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let photo = app_state.animal_service.add_photo(&scope, claims.user_id, id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(PhotoResponse {
            message: "Photo added successfully".into(),
            photo,
        }),
    ))
}
