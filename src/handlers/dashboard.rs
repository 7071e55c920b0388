// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::WithRejection;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::establishment::EstablishmentContext,
    models::dashboard::{
        AlertFeedQuery, AlertFeedResponse, DashboardStats, ProductionSummary, ProductionSummaryQuery, SearchQuery,
        SearchResponse,
    },
};

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Contadores, produção dos últimos 30 dias, atividade recente e rodeos", body = DashboardStats),
        (status = 403, description = "Usuário sem estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    EstablishmentContext(scope): EstablishmentContext,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = app_state.dashboard_service.stats(&scope).await?;
    Ok(Json(stats))
}

// GET /api/dashboard/alerts
#[utoipa::path(
    get,
    path = "/api/dashboard/alerts",
    tag = "Dashboard",
    params(AlertFeedQuery),
    responses(
        (status = 200, description = "Alertas ativos, mais recentes primeiro", body = AlertFeedResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_alerts(
    State(app_state): State<AppState>,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Query(query), _): WithRejection<Query<AlertFeedQuery>, AppError>,
) -> Result<Json<AlertFeedResponse>, AppError> {
    let alerts = app_state.dashboard_service.alerts(&scope, query.limit).await?;
    Ok(Json(AlertFeedResponse { alerts }))
}

// GET /api/dashboard/search
#[utoipa::path(
    get,
    path = "/api/dashboard/search",
    tag = "Dashboard",
    params(SearchQuery),
    responses(
        (status = 200, description = "Até 10 animais; prefixo do brinco externo primeiro", body = SearchResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn search(
    State(app_state): State<AppState>,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, AppError>,
) -> Result<Json<SearchResponse>, AppError> {
    let animals = app_state.dashboard_service.search(&scope, query.q).await?;
    Ok(Json(SearchResponse { animals }))
}

// GET /api/dashboard/production-summary
#[utoipa::path(
    get,
    path = "/api/dashboard/production-summary",
    tag = "Dashboard",
    params(ProductionSummaryQuery),
    responses(
        (status = 200, description = "Totais do período e série diária em ordem cronológica", body = ProductionSummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_production_summary(
    State(app_state): State<AppState>,
    EstablishmentContext(scope): EstablishmentContext,
    WithRejection(Query(query), _): WithRejection<Query<ProductionSummaryQuery>, AppError>,
) -> Result<Json<ProductionSummary>, AppError> {
    let summary = app_state.dashboard_service.production_summary(&scope, query.days).await?;
    Ok(Json(summary))
}
