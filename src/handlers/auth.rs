// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{
        AuthResponse, ChangePasswordPayload, LoginUserPayload, MessageResponse, RegisterUserPayload,
        UpdateProfilePayload, UserProfile, UserResponse, VerifyResponse,
    },
};

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = UserResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterUserPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state.auth_service.register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: Some("User created successfully".into()),
            user: UserProfile::from(&user),
        }),
    ))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas ou conta desativada")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginUserPayload>, AppError>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let (token, user) = app_state.auth_service.login(&payload.email, &payload.password).await?;

    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: UserProfile::from(&user),
    }))
}

// GET /api/auth/profile
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    responses(
        (status = 200, description = "Perfil do usuário logado", body = UserResponse),
        (status = 404, description = "Usuário não existe mais")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = app_state.auth_service.profile(claims.user_id).await?;

    Ok(Json(UserResponse {
        message: None,
        user: UserProfile::from(&user),
    }))
}

// PUT /api/auth/profile
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "Auth",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Perfil atualizado", body = UserResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateProfilePayload>, AppError>,
) -> Result<Json<UserResponse>, AppError> {
    let user = app_state.auth_service.update_profile(claims.user_id, payload).await?;

    Ok(Json(UserResponse {
        message: Some("Profile updated successfully".into()),
        user: UserProfile::from(&user),
    }))
}

// PUT /api/auth/change-password
#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Senha alterada", body = MessageResponse),
        (status = 401, description = "Senha atual incorreta")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    WithRejection(Json(payload), _): WithRejection<Json<ChangePasswordPayload>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;

    app_state
        .auth_service
        .change_password(claims.user_id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

// GET /api/auth/verify
#[utoipa::path(
    get,
    path = "/api/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token válido", body = VerifyResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn verify(AuthenticatedUser(claims): AuthenticatedUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        user: claims,
    })
}
