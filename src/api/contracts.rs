use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthToken};
use crate::models::{
    page_window, Contract, ContractResponse, ContractStatus, ContractTemplateData,
    CreateContractRequest, PageResponse, UpdateContractRequest, User,
};
use crate::services::schedule_service::generate_schedule_for_contract;
use crate::services::AuthService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_contract))
        .route("/search", get(search_contracts))
        .route("/template-data", get(template_data))
        .route("/:id", get(get_contract))
        .route("/:id", put(update_contract))
        .route("/:id", delete(delete_contract))
}

#[derive(Debug, Deserialize)]
struct ContractsQuery {
    contract_no: Option<String>,
    house_id: Option<Uuid>,
    landlord_id: Option<Uuid>,
    tenant_id: Option<Uuid>,
    status: Option<ContractStatus>,
    start_date_from: Option<NaiveDate>,
    start_date_to: Option<NaiveDate>,
    end_date_from: Option<NaiveDate>,
    end_date_to: Option<NaiveDate>,
    page: Option<i64>,
    size: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TemplateQuery {
    house_id: Uuid,
    landlord_id: Uuid,
    tenant_id: Uuid,
}

async fn build_contract_response(
    state: &AppState,
    contract: &Contract,
) -> AppResult<ContractResponse> {
    // связанные сущности подтягиваются по отдельности: отсутствующая связь
    // отдаётся как null, а не роняет сериализацию
    let house_address: Option<String> =
        sqlx::query_as::<_, (String,)>("SELECT address FROM houses WHERE id = $1")
            .bind(contract.house_id)
            .fetch_optional(&state.pool)
            .await?
            .map(|(address,)| address);

    let landlord_name: Option<String> =
        sqlx::query_as::<_, (String,)>("SELECT real_name FROM users WHERE id = $1")
            .bind(contract.landlord_id)
            .fetch_optional(&state.pool)
            .await?
            .map(|(name,)| name);

    let tenant_name: Option<String> =
        sqlx::query_as::<_, (String,)>("SELECT real_name FROM users WHERE id = $1")
            .bind(contract.tenant_id)
            .fetch_optional(&state.pool)
            .await?
            .map(|(name,)| name);

    Ok(ContractResponse {
        id: contract.id,
        contract_no: contract.contract_no.clone(),
        house_id: contract.house_id,
        house_address,
        landlord_id: contract.landlord_id,
        landlord_name,
        tenant_id: contract.tenant_id,
        tenant_name,
        start_date: contract.start_date,
        end_date: contract.end_date,
        rent_amount: contract.rent_amount,
        payment_cycle: contract.payment_cycle,
        payment_method: contract.payment_method,
        breach_clause: contract.breach_clause.clone(),
        status: contract.status,
        signed_at: contract.signed_at,
    })
}

async fn fetch_user(state: &AppState, id: Uuid, label: &str) -> AppResult<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("{} не найден: {}", label, id)))
}

async fn create_contract(
    State(state): State<AppState>,
    _auth: AuthToken,
    Json(payload): Json<CreateContractRequest>,
) -> AppResult<Json<ContractResponse>> {
    if payload.start_date > payload.end_date {
        return Err(AppError::Validation(
            "Дата начала не может быть позже даты окончания".to_string(),
        ));
    }
    if payload.rent_amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Арендная плата должна быть больше нуля".to_string(),
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
    fetch_user(&state, payload.landlord_id, "Арендодатель").await?;
    fetch_user(&state, payload.tenant_id, "Арендатор").await?;

    let contract_no = match payload.contract_no.as_deref() {
        Some(no) if !no.trim().is_empty() => no.trim().to_string(),
        _ => AuthService::generate_contract_no(),
    };

    let duplicate: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM contracts WHERE contract_no = $1")
            .bind(&contract_no)
            .fetch_optional(&state.pool)
            .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(format!(
            "Договор с номером {} уже существует",
            contract_no
        )));
    }

    let contract = sqlx::query_as::<_, Contract>(
        r#"
        INSERT INTO contracts (
            contract_no, house_id, landlord_id, tenant_id, start_date, end_date,
            rent_amount, payment_cycle, payment_method, breach_clause, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(&contract_no)
    .bind(payload.house_id)
    .bind(payload.landlord_id)
    .bind(payload.tenant_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.rent_amount)
    .bind(payload.payment_cycle)
    .bind(payload.payment_method)
    .bind(&payload.breach_clause)
    .bind(payload.status.unwrap_or_default())
    .fetch_one(&state.pool)
    .await?;

    // график платежей создаётся один раз при подписании, первый период
    // считается оплаченным
    generate_schedule_for_contract(&state.pool, &contract, true).await?;

    Ok(Json(build_contract_response(&state, &contract).await?))
}

async fn update_contract(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateContractRequest>,
) -> AppResult<Json<ContractResponse>> {
    if payload.start_date > payload.end_date {
        return Err(AppError::Validation(
            "Дата начала не может быть позже даты окончания".to_string(),
        ));
    }

    let existing = sqlx::query_as::<_, Contract>("SELECT * FROM contracts WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Договор не найден".to_string()))?;

    if let Some(house_id) = payload.house_id {
        let house: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM houses WHERE id = $1")
            .bind(house_id)
            .fetch_optional(&state.pool)
            .await?;
        if house.is_none() {
            return Err(AppError::BadRequest(format!("Дом не найден: {}", house_id)));
        }
    }
    if let Some(landlord_id) = payload.landlord_id {
        fetch_user(&state, landlord_id, "Арендодатель").await?;
    }
    if let Some(tenant_id) = payload.tenant_id {
        fetch_user(&state, tenant_id, "Арендатор").await?;
    }

    if let Some(no) = payload.contract_no.as_deref() {
        let duplicate: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM contracts WHERE contract_no = $1 AND id <> $2")
                .bind(no)
                .bind(id)
                .fetch_optional(&state.pool)
                .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict(format!(
                "Договор с номером {} уже существует",
                no
            )));
        }
    }

    // повторная генерация графика при обновлении не выполняется
    let contract = sqlx::query_as::<_, Contract>(
        r#"
        UPDATE contracts SET
            contract_no = COALESCE($2, contract_no),
            house_id = COALESCE($3, house_id),
            landlord_id = COALESCE($4, landlord_id),
            tenant_id = COALESCE($5, tenant_id),
            start_date = $6,
            end_date = $7,
            rent_amount = $8,
            payment_cycle = $9,
            payment_method = $10,
            breach_clause = $11,
            status = $12
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&payload.contract_no)
    .bind(payload.house_id)
    .bind(payload.landlord_id)
    .bind(payload.tenant_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.rent_amount)
    .bind(payload.payment_cycle)
    .bind(payload.payment_method)
    .bind(&payload.breach_clause)
    .bind(payload.status.unwrap_or(existing.status))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(build_contract_response(&state, &contract).await?))
}

async fn get_contract(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ContractResponse>> {
    let contract = sqlx::query_as::<_, Contract>("SELECT * FROM contracts WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Договор не найден".to_string()))?;

    Ok(Json(build_contract_response(&state, &contract).await?))
}

async fn delete_contract(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM contracts WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Договор не найден".to_string()));
    }

    // платежи и оценки договора удаляются каскадом
    sqlx::query("DELETE FROM contracts WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(serde_json::json!({"success": true})))
}

async fn search_contracts(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<ContractsQuery>,
) -> AppResult<Json<PageResponse<ContractResponse>>> {
    let (limit, offset) = page_window(query.page, query.size);
    let no_pattern = query.contract_no.as_ref().map(|n| format!("%{}%", n));

    const FILTER: &str = r#"
        FROM contracts
        WHERE ($1::varchar IS NULL OR contract_no LIKE $1)
          AND ($2::uuid IS NULL OR house_id = $2)
          AND ($3::uuid IS NULL OR landlord_id = $3)
          AND ($4::uuid IS NULL OR tenant_id = $4)
          AND ($5::contract_status IS NULL OR status = $5)
          AND ($6::date IS NULL OR start_date >= $6)
          AND ($7::date IS NULL OR start_date <= $7)
          AND ($8::date IS NULL OR end_date >= $8)
          AND ($9::date IS NULL OR end_date <= $9)
    "#;

    let contracts = sqlx::query_as::<_, Contract>(&format!(
        "SELECT * {FILTER} ORDER BY signed_at DESC LIMIT $10 OFFSET $11"
    ))
    .bind(&no_pattern)
    .bind(query.house_id)
    .bind(query.landlord_id)
    .bind(query.tenant_id)
    .bind(query.status)
    .bind(query.start_date_from)
    .bind(query.start_date_to)
    .bind(query.end_date_from)
    .bind(query.end_date_to)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {FILTER}"))
        .bind(&no_pattern)
        .bind(query.house_id)
        .bind(query.landlord_id)
        .bind(query.tenant_id)
        .bind(query.status)
        .bind(query.start_date_from)
        .bind(query.start_date_to)
        .bind(query.end_date_from)
        .bind(query.end_date_to)
        .fetch_one(&state.pool)
        .await?;

    let mut response = Vec::new();
    for contract in &contracts {
        response.push(build_contract_response(&state, contract).await?);
    }

    Ok(Json(PageResponse::new(response, query.page, limit, total.0)))
}

/// Скаляры для формы договора: дом и стороны по переданным ID
async fn template_data(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<TemplateQuery>,
) -> AppResult<Json<ContractTemplateData>> {
    let house: (String, Decimal) =
        sqlx::query_as("SELECT address, rent FROM houses WHERE id = $1")
            .bind(query.house_id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("Дом не найден: {}", query.house_id))
            })?;

    let landlord = fetch_user(&state, query.landlord_id, "Арендодатель").await?;
    let tenant = fetch_user(&state, query.tenant_id, "Арендатор").await?;

    Ok(Json(ContractTemplateData {
        house_id: query.house_id,
        house_address: house.0,
        house_rent: house.1,
        landlord_id: landlord.id,
        landlord_name: landlord.real_name,
        landlord_phone: landlord.phone,
        tenant_id: tenant.id,
        tenant_name: tenant.real_name,
        tenant_phone: tenant.phone,
    }))
}
