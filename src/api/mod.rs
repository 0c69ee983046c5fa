pub mod admin;
pub mod auth;
pub mod contracts;
pub mod houses;
pub mod maintenance;
pub mod rent_payments;
pub mod reviews;
pub mod stats;
pub mod users;

use crate::middleware::AppState;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/users", users::routes())
        .nest("/houses", houses::routes())
        .nest("/contracts", contracts::routes())
        .nest("/rent-payments", rent_payments::routes())
        .nest("/maintenance-requests", maintenance::routes())
        .nest("/reviews", reviews::routes())
        .nest("/stats", stats::routes())
        .nest("/admin", admin::routes())
}
