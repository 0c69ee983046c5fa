use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthToken};
use crate::models::{
    page_window, rating_in_range, CreateReviewRequest, PageResponse, Review, ReviewResponse,
    ReviewType, UpdateReviewRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search_reviews))
        .route("/", post(create_review))
        .route("/search", get(search_reviews))
        .route("/reviewee/:id/average", get(reviewee_average))
        .route("/:id", get(get_review))
        .route("/:id", put(update_review))
        .route("/:id", delete(delete_review))
}

#[derive(Debug, Deserialize)]
struct ReviewsQuery {
    reviewer_id: Option<Uuid>,
    reviewee_id: Option<Uuid>,
    contract_id: Option<Uuid>,
    review_type: Option<ReviewType>,
    min_rating: Option<i32>,
    page: Option<i64>,
    size: Option<i64>,
}

async fn build_review_response(state: &AppState, review: &Review) -> AppResult<ReviewResponse> {
    let contract_no: Option<String> =
        sqlx::query_as::<_, (String,)>("SELECT contract_no FROM contracts WHERE id = $1")
            .bind(review.contract_id)
            .fetch_optional(&state.pool)
            .await?
            .map(|(no,)| no);

    let reviewer_name: Option<String> =
        sqlx::query_as::<_, (String,)>("SELECT real_name FROM users WHERE id = $1")
            .bind(review.reviewer_id)
            .fetch_optional(&state.pool)
            .await?
            .map(|(name,)| name);

    let reviewee_name: Option<String> =
        sqlx::query_as::<_, (String,)>("SELECT real_name FROM users WHERE id = $1")
            .bind(review.reviewee_id)
            .fetch_optional(&state.pool)
            .await?
            .map(|(name,)| name);

    Ok(ReviewResponse {
        id: review.id,
        contract_id: review.contract_id,
        contract_no,
        reviewer_id: review.reviewer_id,
        reviewer_name,
        reviewee_id: review.reviewee_id,
        reviewee_name,
        review_type: review.review_type,
        rating: review.rating,
        comment: review.comment.clone(),
        created_at: review.created_at,
    })
}

async fn create_review(
    State(state): State<AppState>,
    _auth: AuthToken,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<Json<ReviewResponse>> {
    if !rating_in_range(payload.rating) {
        return Err(AppError::Validation(
            "Оценка должна быть от 1 до 5".to_string(),
        ));
    }

    let contract: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM contracts WHERE id = $1")
        .bind(payload.contract_id)
        .fetch_optional(&state.pool)
        .await?;
    if contract.is_none() {
        return Err(AppError::BadRequest(format!(
            "Договор не найден: {}",
            payload.contract_id
        )));
    }

    for (user_id, label) in [
        (payload.reviewer_id, "Автор оценки"),
        (payload.reviewee_id, "Получатель оценки"),
    ] {
        let user: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&state.pool)
            .await?;
        if user.is_none() {
            return Err(AppError::BadRequest(format!("{} не найден: {}", label, user_id)));
        }
    }

    // проверка до вставки даёт понятное сообщение, уникальный индекс закрывает
    // гонку параллельных запросов
    let already: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM reviews WHERE contract_id = $1 AND reviewer_id = $2",
    )
    .bind(payload.contract_id)
    .bind(payload.reviewer_id)
    .fetch_optional(&state.pool)
    .await?;
    if already.is_some() {
        return Err(AppError::BadRequest(
            "Этот договор уже оценён данным пользователем".to_string(),
        ));
    }

    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (contract_id, reviewer_id, reviewee_id, review_type, rating, comment)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(payload.contract_id)
    .bind(payload.reviewer_id)
    .bind(payload.reviewee_id)
    .bind(payload.review_type)
    .bind(payload.rating)
    .bind(&payload.comment)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        AppError::from(e).on_unique_violation("Этот договор уже оценён данным пользователем")
    })?;

    Ok(Json(build_review_response(&state, &review).await?))
}

async fn get_review(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReviewResponse>> {
    let review = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Оценка не найдена".to_string()))?;

    Ok(Json(build_review_response(&state, &review).await?))
}

/// Обновляются только балл и комментарий
async fn update_review(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> AppResult<Json<ReviewResponse>> {
    if !rating_in_range(payload.rating) {
        return Err(AppError::Validation(
            "Оценка должна быть от 1 до 5".to_string(),
        ));
    }

    let review = sqlx::query_as::<_, Review>(
        "UPDATE reviews SET rating = $2, comment = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(payload.rating)
    .bind(&payload.comment)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Оценка не найдена".to_string()))?;

    Ok(Json(build_review_response(&state, &review).await?))
}

async fn delete_review(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Оценка не найдена".to_string()));
    }

    Ok(Json(json!({"success": true})))
}

async fn search_reviews(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<ReviewsQuery>,
) -> AppResult<Json<PageResponse<ReviewResponse>>> {
    let (limit, offset) = page_window(query.page, query.size);

    const FILTER: &str = r#"
        FROM reviews
        WHERE ($1::uuid IS NULL OR reviewer_id = $1)
          AND ($2::uuid IS NULL OR reviewee_id = $2)
          AND ($3::uuid IS NULL OR contract_id = $3)
          AND ($4::review_type IS NULL OR review_type = $4)
          AND ($5::int IS NULL OR rating >= $5)
    "#;

    let reviews = sqlx::query_as::<_, Review>(&format!(
        "SELECT * {FILTER} ORDER BY created_at DESC LIMIT $6 OFFSET $7"
    ))
    .bind(query.reviewer_id)
    .bind(query.reviewee_id)
    .bind(query.contract_id)
    .bind(query.review_type)
    .bind(query.min_rating)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {FILTER}"))
        .bind(query.reviewer_id)
        .bind(query.reviewee_id)
        .bind(query.contract_id)
        .bind(query.review_type)
        .bind(query.min_rating)
        .fetch_one(&state.pool)
        .await?;

    let mut response = Vec::new();
    for review in &reviews {
        response.push(build_review_response(&state, review).await?);
    }

    Ok(Json(PageResponse::new(response, query.page, limit, total.0)))
}

/// Средний балл и количество оценок получателя
async fn reviewee_average(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let row: (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(rating)::float8, COUNT(*) FROM reviews WHERE reviewee_id = $1",
    )
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({
        "reviewee_id": id,
        "average_rating": row.0.unwrap_or(0.0),
        "review_count": row.1
    })))
}
