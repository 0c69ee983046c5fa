use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthToken};
use crate::models::{page_window, CreateUserRequest, PageResponse, UpdateUserRequest, User};
use crate::utils::validators::{sanitize_string, validate_iin, validate_phone};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/", post(create_user))
        .route("/search", get(search_users))
        .route("/by-idcard/:id_card", get(get_user_by_idcard))
        .route("/:id", get(get_user))
        .route("/:id", put(update_user))
        .route("/:id", delete(delete_user))
}

#[derive(Debug, Deserialize)]
struct UsersQuery {
    real_name: Option<String>,
    page: Option<i64>,
    size: Option<i64>,
}

fn validate_payload(real_name: &str, id_card: &str, phone: Option<&str>) -> AppResult<()> {
    if real_name.trim().is_empty() {
        return Err(AppError::Validation("Имя не может быть пустым".to_string()));
    }
    if !validate_iin(id_card) {
        return Err(AppError::Validation(
            "Неверный формат удостоверения (ожидается 12 цифр)".to_string(),
        ));
    }
    if let Some(phone) = phone {
        if !validate_phone(phone) {
            return Err(AppError::Validation(
                "Неверный формат номера телефона".to_string(),
            ));
        }
    }
    Ok(())
}

async fn list_users(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<UsersQuery>,
) -> AppResult<Json<PageResponse<User>>> {
    search_users(State(state), _auth, Query(query)).await
}

async fn search_users(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<UsersQuery>,
) -> AppResult<Json<PageResponse<User>>> {
    let (limit, offset) = page_window(query.page, query.size);
    let name_pattern = query.real_name.as_ref().map(|n| format!("%{}%", n));

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE ($1::varchar IS NULL OR real_name ILIKE $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&name_pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users WHERE ($1::varchar IS NULL OR real_name ILIKE $1)",
    )
    .bind(&name_pattern)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(PageResponse::new(users, query.page, limit, total.0)))
}

async fn get_user(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    Ok(Json(user))
}

async fn get_user_by_idcard(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id_card): Path<String>,
) -> AppResult<Json<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id_card = $1")
        .bind(&id_card)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    Ok(Json(user))
}

async fn create_user(
    State(state): State<AppState>,
    _auth: AuthToken,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<Json<User>> {
    validate_payload(&payload.real_name, &payload.id_card, payload.phone.as_deref())?;

    let duplicate: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id_card = $1")
        .bind(&payload.id_card)
        .fetch_optional(&state.pool)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(
            "Пользователь с таким удостоверением уже существует".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (real_name, id_card, phone, role)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(sanitize_string(&payload.real_name))
    .bind(&payload.id_card)
    .bind(&payload.phone)
    .bind(payload.role)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(user))
}

async fn update_user(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    validate_payload(&payload.real_name, &payload.id_card, payload.phone.as_deref())?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Пользователь не найден".to_string()));
    }

    let duplicate: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE id_card = $1 AND id <> $2")
            .bind(&payload.id_card)
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(
            "Пользователь с таким удостоверением уже существует".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET real_name = $2, id_card = $3, phone = $4, role = $5
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(sanitize_string(&payload.real_name))
    .bind(&payload.id_card)
    .bind(&payload.phone)
    .bind(payload.role)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(user))
}

async fn delete_user(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Пользователь не найден".to_string()));
    }

    // пользователь с договорами или домами удалению не подлежит
    let referenced: Option<(i32,)> = sqlx::query_as(
        r#"
        SELECT 1 WHERE EXISTS (
            SELECT 1 FROM contracts WHERE landlord_id = $1 OR tenant_id = $1
        ) OR EXISTS (
            SELECT 1 FROM houses WHERE landlord_id = $1
        )
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;
    if referenced.is_some() {
        return Err(AppError::BadRequest(
            "Нельзя удалить пользователя, на которого ссылаются договоры или дома".to_string(),
        ));
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(serde_json::json!({"success": true})))
}
