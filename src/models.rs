pub mod activity;
pub mod admin;
pub mod animal;
pub mod auth;
pub mod dashboard;
pub mod establishment;
pub mod record;
pub mod rodeo;
