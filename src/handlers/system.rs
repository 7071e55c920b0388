// src/handlers/system.rs

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::error::AppError;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub time: DateTime<Utc>,
}

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "System",
    responses(
        (status = 200, description = "Servidor no ar", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        time: Utc::now(),
    })
}

// Fallback de /api/*
pub async fn api_not_found() -> AppError {
    AppError::NotFound("API route not found".into())
}
