// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- System ---
        handlers::system::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_profile,
        handlers::auth::update_profile,
        handlers::auth::change_password,
        handlers::auth::verify,

        // --- Admin ---
        handlers::admin::list_users,
        handlers::admin::get_user,
        handlers::admin::create_user,
        handlers::admin::update_user,
        handlers::admin::delete_user,
        handlers::admin::stats,
        handlers::admin::list_establishments,
        handlers::admin::list_establecimientos,
        handlers::admin::create_establishment,
        handlers::admin::assign_member,

        // --- Animals ---
        handlers::animals::list_animals,
        handlers::animals::get_animal,
        handlers::animals::create_animal,
        handlers::animals::update_animal,
        handlers::animals::move_animal,
        handlers::animals::add_production_record,
        handlers::animals::add_health_record,
        handlers::animals::add_reproduction_record,
        handlers::animals::add_alert,
        handlers::animals::resolve_alert,
        handlers::animals::add_photo,

        // --- Rodeos ---
        handlers::rodeos::list_rodeos,
        handlers::rodeos::get_rodeo,
        handlers::rodeos::create_rodeo,
        handlers::rodeos::update_rodeo,
        handlers::rodeos::delete_rodeo,
        handlers::rodeos::move_animals,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
        handlers::dashboard::get_alerts,
        handlers::dashboard::search,
        handlers::dashboard::get_production_summary,
    ),
    components(
        schemas(
            handlers::system::HealthResponse,

            // --- Auth ---
            models::auth::UserRole,
            models::auth::UserProfile,
            models::auth::Claims,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateProfilePayload,
            models::auth::ChangePasswordPayload,
            models::auth::AuthResponse,
            models::auth::UserResponse,
            models::auth::MessageResponse,
            models::auth::VerifyResponse,

            // --- Admin ---
            models::admin::AdminPermissions,
            models::admin::AdminUserView,
            models::admin::AdminUserResponse,
            models::admin::UserListResponse,
            models::admin::AdminStats,
            models::admin::CreateUserPayload,
            models::admin::UpdateUserPayload,
            models::establishment::Establishment,
            models::establishment::EstablishmentSummary,
            models::establishment::EstablecimientoView,
            models::establishment::EstablishmentScope,
            models::establishment::Membership,
            models::establishment::CreateEstablishmentPayload,
            models::establishment::AssignMemberPayload,
            models::establishment::EstablishmentListResponse,
            models::establishment::EstablishmentResponse,
            models::establishment::MembershipResponse,
            crate::common::pagination::Pagination,

            // --- Animals ---
            models::animal::Animal,
            models::animal::AnimalListItem,
            models::animal::AnimalView,
            models::animal::MovementView,
            models::animal::AnimalPayload,
            models::animal::MoveAnimalPayload,
            models::animal::AnimalListResponse,
            models::animal::AnimalDetail,
            models::animal::AnimalResponse,
            models::animal::MoveAnimalResponse,
            models::record::ProductionRecord,
            models::record::HealthRecord,
            models::record::ReproductionRecord,
            models::record::Alert,
            models::record::ProductionPayload,
            models::record::HealthPayload,
            models::record::ReproductionPayload,
            models::record::AlertPayload,
            models::record::AlertResponse,
            models::record::AnimalPhoto,
            models::record::PhotoPayload,
            models::record::PhotoResponse,

            // --- Rodeos ---
            models::rodeo::Rodeo,
            models::rodeo::RodeoWithCounts,
            models::rodeo::RodeoAnimal,
            models::rodeo::RodeoPayload,
            models::rodeo::UpdateRodeoPayload,
            models::rodeo::MoveAnimalsPayload,
            models::rodeo::RodeoListResponse,
            models::rodeo::RodeoDetail,
            models::rodeo::RodeoResponse,
            models::rodeo::MoveAnimalsResponse,

            // --- Dashboard ---
            models::activity::ActivityFeedItem,
            models::dashboard::EstablishmentCounts,
            models::dashboard::DailyProduction,
            models::dashboard::RodeoSummary,
            models::dashboard::ProductionSeries,
            models::dashboard::DashboardStats,
            models::dashboard::AlertAnimal,
            models::dashboard::AlertFeedItem,
            models::dashboard::AlertFeedResponse,
            models::dashboard::SearchHit,
            models::dashboard::SearchResponse,
            models::dashboard::ProductionTotals,
            models::dashboard::ProductionSummary,
        )
    ),
    tags(
        (name = "System", description = "Saúde do servidor"),
        (name = "Auth", description = "Autenticação, Registro e Perfil"),
        (name = "Admin", description = "Gestão de Usuários e Estabelecimentos"),
        (name = "Animals", description = "Cadastro, Registros e Alertas dos Animais"),
        (name = "Rodeos", description = "Rodeos e Movimentação de Animais"),
        (name = "Dashboard", description = "Indicadores, Alertas e Busca Rápida")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented_under_api() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/animals/{id}/move"));
        assert!(doc.paths.paths.contains_key("/api/dashboard/production-summary"));
        assert!(doc.paths.paths.contains_key("/api/animals/{id}/photos"));
        assert!(doc.paths.paths.contains_key("/api/admin/establecimientos"));
        assert!(doc.paths.paths.keys().all(|path| path.starts_with("/api/")));
    }
}
