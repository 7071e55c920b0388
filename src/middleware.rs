pub mod auth;
pub mod establishment;
