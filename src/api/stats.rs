use axum::{extract::State, routing::get, Json, Router};
use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/overview", get(overview))
}

async fn month_income(state: &AppState, from: NaiveDate, to: NaiveDate) -> AppResult<Decimal> {
    let sum: (Option<Decimal>,) = sqlx::query_as(
        "SELECT SUM(amount) FROM rent_payments WHERE due_date BETWEEN $1 AND $2",
    )
    .bind(from)
    .bind(to)
    .fetch_one(&state.pool)
    .await?;

    Ok(sum.0.unwrap_or(Decimal::ZERO))
}

/// Сводная панель: счётчики, доход за последние месяцы, свежие заявки и оценки
#[utoipa::path(
    get,
    path = "/api/stats/overview",
    tag = "stats",
    responses(
        (status = 200, description = "Сводная статистика")
    )
)]
pub async fn overview(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let total_houses: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM houses")
        .fetch_one(&state.pool)
        .await?;

    let rented_houses: (i64,) = sqlx::query_as(
        "SELECT COUNT(DISTINCT house_id) FROM contracts WHERE status = 'active'",
    )
    .fetch_one(&state.pool)
    .await?;

    let active_tenants: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;

    let today = Utc::now().date_naive();
    let this_month_start = today.with_day(1).unwrap_or(today);

    // доход за последние 6 месяцев, текущий — последним
    let mut series = Vec::new();
    for i in (0..6u32).rev() {
        let month_start = this_month_start - Months::new(i);
        let month_end = month_start + Months::new(1) - Days::new(1);
        let sum = month_income(&state, month_start, month_end).await?;
        series.push(json!({
            "label": format!("{:04}-{:02}", month_start.year(), month_start.month()),
            "value": sum
        }));
    }

    let monthly_income = month_income(
        &state,
        this_month_start,
        this_month_start + Months::new(1) - Days::new(1),
    )
    .await?;

    let pending: Vec<(uuid::Uuid, chrono::DateTime<Utc>, Option<String>, String)> =
        sqlx::query_as(
            r#"
            SELECT m.id, m.created_at, h.address, m.description
            FROM maintenance_requests m
            LEFT JOIN houses h ON h.id = m.house_id
            WHERE m.status = 'pending'
            ORDER BY m.created_at DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&state.pool)
        .await?;

    let recent_reviews: Vec<(uuid::Uuid, Option<String>, Option<String>, chrono::DateTime<Utc>)> =
        sqlx::query_as(
            r#"
            SELECT r.id, u.real_name, r.comment, r.created_at
            FROM reviews r
            LEFT JOIN users u ON u.id = r.reviewer_id
            ORDER BY r.created_at DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(json!({
        "total_houses": total_houses.0,
        "rented_houses": rented_houses.0,
        "active_tenants": active_tenants.0,
        "monthly_income": monthly_income,
        "monthly_income_series": series,
        "pending_maintenances": pending.iter().map(|(id, created_at, address, issue)| json!({
            "id": id,
            "date": created_at.date_naive().to_string(),
            "house_address": address,
            "issue": issue
        })).collect::<Vec<_>>(),
        "recent_reviews": recent_reviews.iter().map(|(id, author, content, created_at)| json!({
            "id": id,
            "author": author,
            "content": content,
            "date": created_at.date_naive().to_string()
        })).collect::<Vec<_>>()
    })))
}
