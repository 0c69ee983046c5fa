pub mod auth_service;
pub mod schedule_service;

pub use auth_service::AuthService;
