pub mod admin_service;
pub mod animal_service;
pub mod auth;
pub mod dashboard_service;
pub mod establishment_service;
pub mod rodeo_service;
