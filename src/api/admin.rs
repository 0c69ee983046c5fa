use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthToken};
use crate::models::{User, UserRole};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/users/:id/role", post(set_role))
}

#[derive(Debug, Deserialize)]
struct SetRoleRequest {
    role: Option<UserRole>,
}

async fn list_roles(_auth: AuthToken) -> Json<Vec<UserRole>> {
    Json(vec![UserRole::Admin, UserRole::Manager, UserRole::User])
}

async fn set_role(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetRoleRequest>,
) -> AppResult<Json<User>> {
    let role = payload
        .role
        .ok_or_else(|| AppError::BadRequest("Роль не указана".to_string()))?;

    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET role = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(role)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    Ok(Json(user))
}
