// src/router.rs

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{
        auth::{auth_guard, require_admin, require_super_admin},
        establishment::establishment_guard,
    },
};

/// Monta todas as rotas da API. `cors_origins` vazio libera qualquer origem.
pub fn build_router(app_state: AppState, cors_origins: &[String]) -> Router {
    // Rotas de autenticação (públicas)
    let auth_public = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let auth_private = Router::new()
        .route(
            "/profile",
            get(handlers::auth::get_profile).put(handlers::auth::update_profile),
        )
        .route("/change-password", put(handlers::auth::change_password))
        .route("/verify", get(handlers::auth::verify))
        .route_layer(from_fn_with_state(app_state.clone(), auth_guard));

    // Painel administrativo: auth + admin; exclusão exige super admin
    let admin_routes = Router::new()
        .route(
            "/users",
            get(handlers::admin::list_users).post(handlers::admin::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::admin::get_user)
                .put(handlers::admin::update_user)
                .delete(handlers::admin::delete_user)
                .route_layer(from_fn(require_super_admin_on_delete)),
        )
        .route("/stats", get(handlers::admin::stats))
        .route(
            "/establishments",
            get(handlers::admin::list_establishments).post(handlers::admin::create_establishment),
        )
        .route("/establecimientos", get(handlers::admin::list_establecimientos))
        .route("/establishments/{id}/members", post(handlers::admin::assign_member))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(app_state.clone(), auth_guard));

    // Rotas com escopo de estabelecimento: auth + estabelecimento
    let animal_routes = Router::new()
        .route(
            "/",
            get(handlers::animals::list_animals).post(handlers::animals::create_animal),
        )
        .route(
            "/{id}",
            get(handlers::animals::get_animal).put(handlers::animals::update_animal),
        )
        .route("/{id}/move", post(handlers::animals::move_animal))
        .route("/{id}/production", post(handlers::animals::add_production_record))
        .route("/{id}/health", post(handlers::animals::add_health_record))
        .route("/{id}/reproduction", post(handlers::animals::add_reproduction_record))
        .route("/{id}/alerts", post(handlers::animals::add_alert))
        .route("/{id}/photos", post(handlers::animals::add_photo))
        .route("/alerts/{alert_id}/resolve", put(handlers::animals::resolve_alert));

    let rodeo_routes = Router::new()
        .route(
            "/",
            get(handlers::rodeos::list_rodeos).post(handlers::rodeos::create_rodeo),
        )
        .route("/move-animals", post(handlers::rodeos::move_animals))
        .route(
            "/{id}",
            get(handlers::rodeos::get_rodeo)
                .put(handlers::rodeos::update_rodeo)
                .delete(handlers::rodeos::delete_rodeo),
        );

    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::get_stats))
        .route("/alerts", get(handlers::dashboard::get_alerts))
        .route("/search", get(handlers::dashboard::search))
        .route("/production-summary", get(handlers::dashboard::get_production_summary));

    let scoped_routes = Router::new()
        .nest("/animals", animal_routes)
        .nest("/rodeos", rodeo_routes)
        .nest("/dashboard", dashboard_routes)
        .route_layer(from_fn_with_state(app_state.clone(), establishment_guard))
        .route_layer(from_fn_with_state(app_state.clone(), auth_guard));

    let api_routes = Router::new()
        .route("/health", get(handlers::system::health))
        .nest("/auth", auth_public.merge(auth_private))
        .nest("/admin", admin_routes)
        .merge(scoped_routes)
        .fallback(handlers::system::api_not_found);

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

// Só o DELETE de usuário exige super admin; os demais métodos da rota passam direto
async fn require_super_admin_on_delete(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<axum::response::Response, crate::common::error::AppError> {
    if request.method() == Method::DELETE {
        return require_super_admin(request, next).await;
    }
    Ok(next.run(request).await)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%origin, "Origem CORS inválida ignorada: {e}");
                None
            }
        })
        .collect();

    layer.allow_origin(parsed)
}
