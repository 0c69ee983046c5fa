use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthToken};
use crate::models::{
    page_window, Contract, CreateRentPaymentRequest, PageResponse, PaymentStatus, RentPayment,
    RentPaymentResponse, UpdateRentPaymentRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_payment))
        .route("/search", get(search_payments))
        .route("/report", get(report))
        .route("/overdue", get(overdue))
        .route("/:id", get(get_payment))
        .route("/:id", put(update_payment))
        .route("/:id", delete(delete_payment))
        .route("/:id/pay", post(mark_paid))
        .route("/:id/remind", post(mark_reminded))
        .route("/:id/overdue-process", post(mark_overdue_processed))
}

#[derive(Debug, Deserialize)]
struct PaymentsQuery {
    contract_id: Option<Uuid>,
    status: Option<PaymentStatus>,
    due_from: Option<NaiveDate>,
    due_to: Option<NaiveDate>,
    page: Option<i64>,
    size: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    from: NaiveDate,
    to: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct OverdueQuery {
    before_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct OverdueProcessQuery {
    penalty: Option<Decimal>,
}

async fn build_payment_response(
    state: &AppState,
    payment: &RentPayment,
) -> AppResult<RentPaymentResponse> {
    let contract_no: Option<String> =
        sqlx::query_as::<_, (String,)>("SELECT contract_no FROM contracts WHERE id = $1")
            .bind(payment.contract_id)
            .fetch_optional(&state.pool)
            .await?
            .map(|(no,)| no);

    Ok(RentPaymentResponse {
        id: payment.id,
        contract_id: payment.contract_id,
        contract_no,
        due_date: payment.due_date,
        amount: payment.amount,
        paid_at: payment.paid_at,
        // просрочка отображается по дате, без записи в базу
        status: payment.effective_status(Utc::now().date_naive()),
        period_start: payment.period_start,
        period_end: payment.period_end,
        reminded_at: payment.reminded_at,
        overdue_processed: payment.overdue_processed,
        penalty: payment.penalty,
    })
}

async fn create_payment(
    State(state): State<AppState>,
    _auth: AuthToken,
    Json(payload): Json<CreateRentPaymentRequest>,
) -> AppResult<Json<RentPaymentResponse>> {
    let contract = sqlx::query_as::<_, Contract>("SELECT * FROM contracts WHERE id = $1")
        .bind(payload.contract_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(format!("Договор не найден: {}", payload.contract_id))
        })?;

    let amount = payload.amount.unwrap_or(contract.rent_amount);
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Сумма платежа должна быть больше нуля".to_string(),
        ));
    }

    // период по умолчанию — календарный месяц даты платежа
    let period_start = payload
        .period_start
        .unwrap_or_else(|| payload.due_date.with_day(1).unwrap_or(payload.due_date));
    let period_end = payload
        .period_end
        .unwrap_or_else(|| period_start + Months::new(1) - Days::new(1));

    let payment = sqlx::query_as::<_, RentPayment>(
        r#"
        INSERT INTO rent_payments (
            contract_id, due_date, amount, status, period_start, period_end, overdue_processed
        )
        VALUES ($1, $2, $3, $4, $5, $6, false)
        RETURNING *
        "#,
    )
    .bind(payload.contract_id)
    .bind(payload.due_date)
    .bind(amount)
    .bind(payload.status.unwrap_or_default())
    .bind(period_start)
    .bind(period_end)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        AppError::from(e).on_unique_violation("Платёж по договору на эту дату уже существует")
    })?;

    Ok(Json(build_payment_response(&state, &payment).await?))
}

async fn get_payment(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RentPaymentResponse>> {
    let payment = sqlx::query_as::<_, RentPayment>("SELECT * FROM rent_payments WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Платёж не найден".to_string()))?;

    Ok(Json(build_payment_response(&state, &payment).await?))
}

async fn update_payment(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRentPaymentRequest>,
) -> AppResult<Json<RentPaymentResponse>> {
    if payload.amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Сумма платежа должна быть больше нуля".to_string(),
        ));
    }

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM rent_payments WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Платёж не найден".to_string()));
    }

    let payment = sqlx::query_as::<_, RentPayment>(
        r#"
        UPDATE rent_payments SET
            due_date = $2,
            amount = $3,
            paid_at = $4,
            status = $5,
            period_start = $6,
            period_end = $7,
            penalty = $8
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.due_date)
    .bind(payload.amount)
    .bind(payload.paid_at)
    .bind(payload.status)
    .bind(payload.period_start)
    .bind(payload.period_end)
    .bind(payload.penalty)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        AppError::from(e).on_unique_violation("Платёж по договору на эту дату уже существует")
    })?;

    Ok(Json(build_payment_response(&state, &payment).await?))
}

async fn delete_payment(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM rent_payments WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Платёж не найден".to_string()));
    }

    Ok(Json(serde_json::json!({"success": true})))
}

/// Отметка об оплате: разрешена и для просроченных платежей
async fn mark_paid(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RentPaymentResponse>> {
    let payment = sqlx::query_as::<_, RentPayment>(
        r#"
        UPDATE rent_payments
        SET status = 'paid', paid_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Платёж не найден".to_string()))?;

    Ok(Json(build_payment_response(&state, &payment).await?))
}

/// Отметка о напоминании: статус не меняется
async fn mark_reminded(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RentPaymentResponse>> {
    let payment = sqlx::query_as::<_, RentPayment>(
        r#"
        UPDATE rent_payments
        SET reminded_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Платёж не найден".to_string()))?;

    Ok(Json(build_payment_response(&state, &payment).await?))
}

/// Обработка просрочки: фиксирует статус OVERDUE (кроме уже оплаченных)
/// и при необходимости пени
async fn mark_overdue_processed(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
    Query(query): Query<OverdueProcessQuery>,
) -> AppResult<Json<RentPaymentResponse>> {
    let payment = sqlx::query_as::<_, RentPayment>(
        r#"
        UPDATE rent_payments
        SET overdue_processed = true,
            penalty = $2,
            status = CASE WHEN status <> 'paid' THEN 'overdue'::payment_status ELSE status END
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(query.penalty)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Платёж не найден".to_string()))?;

    Ok(Json(build_payment_response(&state, &payment).await?))
}

async fn search_payments(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<PaymentsQuery>,
) -> AppResult<Json<PageResponse<RentPaymentResponse>>> {
    let (limit, offset) = page_window(query.page, query.size);

    const FILTER: &str = r#"
        FROM rent_payments
        WHERE ($1::uuid IS NULL OR contract_id = $1)
          AND ($2::payment_status IS NULL OR status = $2)
          AND ($3::date IS NULL OR due_date >= $3)
          AND ($4::date IS NULL OR due_date <= $4)
    "#;

    let payments = sqlx::query_as::<_, RentPayment>(&format!(
        "SELECT * {FILTER} ORDER BY due_date LIMIT $5 OFFSET $6"
    ))
    .bind(query.contract_id)
    .bind(query.status)
    .bind(query.due_from)
    .bind(query.due_to)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {FILTER}"))
        .bind(query.contract_id)
        .bind(query.status)
        .bind(query.due_from)
        .bind(query.due_to)
        .fetch_one(&state.pool)
        .await?;

    let mut response = Vec::new();
    for payment in &payments {
        response.push(build_payment_response(&state, payment).await?);
    }

    Ok(Json(PageResponse::new(response, query.page, limit, total.0)))
}

/// Платежи с датой платежа в диапазоне (для отчётности)
async fn report(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<Vec<RentPaymentResponse>>> {
    let payments = sqlx::query_as::<_, RentPayment>(
        "SELECT * FROM rent_payments WHERE due_date BETWEEN $1 AND $2 ORDER BY due_date",
    )
    .bind(query.from)
    .bind(query.to)
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::new();
    for payment in &payments {
        response.push(build_payment_response(&state, payment).await?);
    }

    Ok(Json(response))
}

/// Неоплаченные платежи с датой раньше указанной (по умолчанию — сегодня)
async fn overdue(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<OverdueQuery>,
) -> AppResult<Json<Vec<RentPaymentResponse>>> {
    let before = query.before_date.unwrap_or_else(|| Utc::now().date_naive());

    let payments = sqlx::query_as::<_, RentPayment>(
        r#"
        SELECT * FROM rent_payments
        WHERE due_date < $1 AND status IN ('pending', 'overdue')
        ORDER BY due_date
        "#,
    )
    .bind(before)
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::new();
    for payment in &payments {
        response.push(build_payment_response(&state, payment).await?);
    }

    Ok(Json(response))
}
