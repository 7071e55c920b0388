pub mod admin;
pub mod animals;
pub mod auth;
pub mod dashboard;
pub mod rodeos;
pub mod system;
