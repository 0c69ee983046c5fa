use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthToken};
use crate::models::{
    next_completed_at, page_window, CreateMaintenanceRequest, MaintenanceRequest,
    MaintenanceRequestResponse, MaintenanceStatus, PageResponse, UpdateMaintenanceCostRequest,
    UpdateMaintenanceRequest, UpdateMaintenanceStatusRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests))
        .route("/", post(create_request))
        .route("/search", get(search_requests))
        .route("/statistics", get(statistics))
        .route("/:id", get(get_request))
        .route("/:id", put(update_request))
        .route("/:id", delete(delete_request))
        .route("/:id/status", patch(update_status))
        .route("/:id/cost", patch(update_cost))
        .route("/:id/complete", patch(complete_request))
        .route("/:id/paid", patch(mark_paid))
}

#[derive(Debug, Deserialize)]
struct RequestsQuery {
    tenant_id: Option<Uuid>,
    house_id: Option<Uuid>,
    status: Option<MaintenanceStatus>,
    description: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    page: Option<i64>,
    size: Option<i64>,
}

async fn build_request_response(
    state: &AppState,
    request: &MaintenanceRequest,
) -> AppResult<MaintenanceRequestResponse> {
    let house_address: Option<String> =
        sqlx::query_as::<_, (String,)>("SELECT address FROM houses WHERE id = $1")
            .bind(request.house_id)
            .fetch_optional(&state.pool)
            .await?
            .map(|(address,)| address);

    Ok(MaintenanceRequestResponse {
        id: request.id,
        house_id: request.house_id,
        house_address,
        description: request.description.clone(),
        cost: request.cost,
        status: request.status,
        requester_name: request.requester_name.clone(),
        contact: request.contact.clone(),
        created_at: request.created_at,
        completed_at: request.completed_at,
    })
}

async fn fetch_request(state: &AppState, id: Uuid) -> AppResult<MaintenanceRequest> {
    sqlx::query_as::<_, MaintenanceRequest>("SELECT * FROM maintenance_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Заявка не найдена".to_string()))
}

async fn create_request(
    State(state): State<AppState>,
    _auth: AuthToken,
    Json(payload): Json<CreateMaintenanceRequest>,
) -> AppResult<Json<MaintenanceRequestResponse>> {
    if payload.description.trim().is_empty() {
        return Err(AppError::Validation(
            "Описание проблемы не может быть пустым".to_string(),
        ));
    }

    let house: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM houses WHERE id = $1")
        .bind(payload.house_id)
        .fetch_optional(&state.pool)
        .await?;
    if house.is_none() {
        return Err(AppError::BadRequest(format!(
            "Дом не найден: {}",
            payload.house_id
        )));
    }

    // заявитель подтягивается из действующего договора; без договора заявка
    // всё равно принимается
    let tenant: Option<(String, Option<String>)> = sqlx::query_as(
        r#"
        SELECT u.real_name, u.phone
        FROM contracts c
        JOIN users u ON u.id = c.tenant_id
        WHERE c.house_id = $1
          AND c.status = 'active'
          AND c.start_date <= CURRENT_DATE
          AND c.end_date >= CURRENT_DATE
        LIMIT 1
        "#,
    )
    .bind(payload.house_id)
    .fetch_optional(&state.pool)
    .await?;

    let (requester_name, contact) = match &tenant {
        Some((name, phone)) => (
            payload.requester_name.clone().or_else(|| Some(name.clone())),
            payload.contact.clone().or_else(|| phone.clone()),
        ),
        None => {
            tracing::warn!(
                "house {} has no active contract, accepting maintenance request as submitted",
                payload.house_id
            );
            (payload.requester_name.clone(), payload.contact.clone())
        }
    };

    let request = sqlx::query_as::<_, MaintenanceRequest>(
        r#"
        INSERT INTO maintenance_requests (house_id, description, cost, status, requester_name, contact)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(payload.house_id)
    .bind(payload.description.trim())
    .bind(payload.cost)
    .bind(MaintenanceStatus::Pending)
    .bind(&requester_name)
    .bind(&contact)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(build_request_response(&state, &request).await?))
}

async fn get_request(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MaintenanceRequestResponse>> {
    let request = fetch_request(&state, id).await?;
    Ok(Json(build_request_response(&state, &request).await?))
}

async fn list_requests(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<RequestsQuery>,
) -> AppResult<Json<PageResponse<MaintenanceRequestResponse>>> {
    search_requests(State(state), _auth, Query(query)).await
}

async fn search_requests(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<RequestsQuery>,
) -> AppResult<Json<PageResponse<MaintenanceRequestResponse>>> {
    let (limit, offset) = page_window(query.page, query.size);
    let description_pattern = query.description.as_ref().map(|d| format!("%{}%", d));

    const FILTER: &str = r#"
        FROM maintenance_requests m
        WHERE ($1::uuid IS NULL OR EXISTS (
                SELECT 1 FROM contracts c
                WHERE c.house_id = m.house_id
                  AND c.tenant_id = $1
                  AND c.status = 'active'
              ))
          AND ($2::uuid IS NULL OR m.house_id = $2)
          AND ($3::maintenance_status IS NULL OR m.status = $3)
          AND ($4::varchar IS NULL OR m.description LIKE $4)
          AND ($5::timestamptz IS NULL OR m.created_at >= $5)
          AND ($6::timestamptz IS NULL OR m.created_at <= $6)
    "#;

    let requests = sqlx::query_as::<_, MaintenanceRequest>(&format!(
        "SELECT m.* {FILTER} ORDER BY m.created_at DESC LIMIT $7 OFFSET $8"
    ))
    .bind(query.tenant_id)
    .bind(query.house_id)
    .bind(query.status)
    .bind(&description_pattern)
    .bind(query.start_date)
    .bind(query.end_date)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {FILTER}"))
        .bind(query.tenant_id)
        .bind(query.house_id)
        .bind(query.status)
        .bind(&description_pattern)
        .bind(query.start_date)
        .bind(query.end_date)
        .fetch_one(&state.pool)
        .await?;

    let mut response = Vec::new();
    for request in &requests {
        response.push(build_request_response(&state, request).await?);
    }

    Ok(Json(PageResponse::new(response, query.page, limit, total.0)))
}

async fn update_status(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaintenanceStatusRequest>,
) -> AppResult<Json<MaintenanceRequestResponse>> {
    let existing = fetch_request(&state, id).await?;

    let completed_at = next_completed_at(payload.status, existing.completed_at, Utc::now());

    let request = sqlx::query_as::<_, MaintenanceRequest>(
        r#"
        UPDATE maintenance_requests
        SET status = $2, completed_at = $3
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.status)
    .bind(completed_at)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(build_request_response(&state, &request).await?))
}

async fn update_cost(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaintenanceCostRequest>,
) -> AppResult<Json<MaintenanceRequestResponse>> {
    if payload.cost <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Стоимость ремонта должна быть больше нуля".to_string(),
        ));
    }

    fetch_request(&state, id).await?;

    let request = sqlx::query_as::<_, MaintenanceRequest>(
        "UPDATE maintenance_requests SET cost = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(payload.cost)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(build_request_response(&state, &request).await?))
}

/// Завершение работ: время завершения фиксируется только при первом переходе
async fn complete_request(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MaintenanceRequestResponse>> {
    let request = sqlx::query_as::<_, MaintenanceRequest>(
        r#"
        UPDATE maintenance_requests
        SET status = 'completed', completed_at = COALESCE(completed_at, NOW())
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Заявка не найдена".to_string()))?;

    Ok(Json(build_request_response(&state, &request).await?))
}

async fn mark_paid(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MaintenanceRequestResponse>> {
    let request = sqlx::query_as::<_, MaintenanceRequest>(
        r#"
        UPDATE maintenance_requests
        SET status = 'paid', completed_at = COALESCE(completed_at, NOW())
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Заявка не найдена".to_string()))?;

    Ok(Json(build_request_response(&state, &request).await?))
}

async fn update_request(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaintenanceRequest>,
) -> AppResult<Json<MaintenanceRequestResponse>> {
    let existing = fetch_request(&state, id).await?;

    if let Some(cost) = payload.cost {
        if cost <= Decimal::ZERO {
            return Err(AppError::BadRequest(
                "Стоимость ремонта должна быть больше нуля".to_string(),
            ));
        }
    }

    if let Some(house_id) = payload.house_id {
        let house: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM houses WHERE id = $1")
            .bind(house_id)
            .fetch_optional(&state.pool)
            .await?;
        if house.is_none() {
            return Err(AppError::BadRequest(format!("Дом не найден: {}", house_id)));
        }
    }

    let status = payload.status.unwrap_or(existing.status);
    let completed_at = next_completed_at(status, existing.completed_at, Utc::now());

    let request = sqlx::query_as::<_, MaintenanceRequest>(
        r#"
        UPDATE maintenance_requests SET
            house_id = COALESCE($2, house_id),
            description = COALESCE($3, description),
            cost = COALESCE($4, cost),
            status = $5,
            requester_name = COALESCE($6, requester_name),
            contact = COALESCE($7, contact),
            completed_at = $8
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.house_id)
    .bind(&payload.description)
    .bind(payload.cost)
    .bind(status)
    .bind(&payload.requester_name)
    .bind(&payload.contact)
    .bind(completed_at)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(build_request_response(&state, &request).await?))
}

async fn delete_request(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM maintenance_requests WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Заявка не найдена".to_string()));
    }

    Ok(Json(json!({"success": true})))
}

/// Сводка по статусам заявок
async fn statistics(
    State(state): State<AppState>,
    _auth: AuthToken,
) -> AppResult<Json<Value>> {
    let counts: Vec<(MaintenanceStatus, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM maintenance_requests GROUP BY status",
    )
    .fetch_all(&state.pool)
    .await?;

    let count_for = |status: MaintenanceStatus| {
        counts
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    };

    let pending = count_for(MaintenanceStatus::Pending);
    let in_progress = count_for(MaintenanceStatus::InProgress);
    let completed = count_for(MaintenanceStatus::Completed);
    let paid = count_for(MaintenanceStatus::Paid);

    Ok(Json(json!({
        "pending_count": pending,
        "in_progress_count": in_progress,
        "completed_count": completed,
        "paid_count": paid,
        "total_count": pending + in_progress + completed + paid
    })))
}
