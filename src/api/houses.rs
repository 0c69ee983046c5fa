use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::{AppState, AuthToken};
use crate::models::{
    page_window, CreateHouseRequest, House, HouseResponse, HouseStatus, PageResponse,
    UpdateHouseRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_house))
        .route("/search", get(search_houses))
        .route("/recommended", get(recommended_houses))
        .route("/:id", get(get_house))
        .route("/:id", put(update_house))
        .route("/:id", delete(delete_house))
        .route("/:id/recommend", post(toggle_recommend))
}

#[derive(Debug, Deserialize)]
pub struct HousesQuery {
    address: Option<String>,
    house_type: Option<String>,
    min_area: Option<Decimal>,
    max_area: Option<Decimal>,
    min_rent: Option<Decimal>,
    max_rent: Option<Decimal>,
    decoration: Option<String>,
    facilities: Option<String>,
    status: Option<HouseStatus>,
    recommended: Option<bool>,
    landlord_id: Option<Uuid>,
    landlord_name: Option<String>,
    page: Option<i64>,
    size: Option<i64>,
}

async fn build_house_response(state: &AppState, house: &House) -> AppResult<HouseResponse> {
    let landlord_name: Option<String> =
        sqlx::query_as::<_, (String,)>("SELECT real_name FROM users WHERE id = $1")
            .bind(house.landlord_id)
            .fetch_optional(&state.pool)
            .await?
            .map(|(name,)| name);

    Ok(HouseResponse {
        id: house.id,
        address: house.address.clone(),
        house_type: house.house_type.clone(),
        area: house.area,
        rent: house.rent,
        decoration: house.decoration.clone(),
        facilities: house.facilities.clone(),
        status: house.status,
        description: house.description.clone(),
        recommended: house.recommended,
        landlord_id: house.landlord_id,
        landlord_name,
        created_at: house.created_at,
        updated_at: house.updated_at,
    })
}

/// Поиск домов по необязательным фильтрам
#[utoipa::path(
    get,
    path = "/api/houses/search",
    tag = "houses",
    params(
        ("address" = Option<String>, Query, description = "Подстрока адреса"),
        ("house_type" = Option<String>, Query, description = "Тип жилья"),
        ("min_area" = Option<String>, Query, description = "Площадь от"),
        ("max_area" = Option<String>, Query, description = "Площадь до"),
        ("min_rent" = Option<String>, Query, description = "Аренда от"),
        ("max_rent" = Option<String>, Query, description = "Аренда до"),
        ("decoration" = Option<String>, Query, description = "Отделка"),
        ("facilities" = Option<String>, Query, description = "Подстрока удобств"),
        ("status" = Option<String>, Query, description = "Статус дома"),
        ("recommended" = Option<bool>, Query, description = "Только рекомендованные"),
        ("landlord_id" = Option<Uuid>, Query, description = "ID арендодателя"),
        ("landlord_name" = Option<String>, Query, description = "Подстрока имени арендодателя"),
        ("page" = Option<i64>, Query, description = "Номер страницы (с нуля)"),
        ("size" = Option<i64>, Query, description = "Размер страницы")
    ),
    responses(
        (status = 200, description = "Страница домов")
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_houses(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<HousesQuery>,
) -> AppResult<Json<PageResponse<HouseResponse>>> {
    let (limit, offset) = page_window(query.page, query.size);
    let address_pattern = query.address.as_ref().map(|a| format!("%{}%", a));
    let facilities_pattern = query.facilities.as_ref().map(|f| format!("%{}%", f));
    let landlord_pattern = query.landlord_name.as_ref().map(|n| format!("%{}%", n));

    const FILTER: &str = r#"
        FROM houses h
        LEFT JOIN users u ON u.id = h.landlord_id
        WHERE ($1::varchar IS NULL OR h.address LIKE $1)
          AND ($2::varchar IS NULL OR h.house_type = $2)
          AND ($3::numeric IS NULL OR h.area >= $3)
          AND ($4::numeric IS NULL OR h.area <= $4)
          AND ($5::numeric IS NULL OR h.rent >= $5)
          AND ($6::numeric IS NULL OR h.rent <= $6)
          AND ($7::varchar IS NULL OR h.decoration = $7)
          AND ($8::varchar IS NULL OR h.facilities LIKE $8)
          AND ($9::house_status IS NULL OR h.status = $9)
          AND ($10::boolean IS NULL OR h.recommended = $10)
          AND ($11::uuid IS NULL OR h.landlord_id = $11)
          AND ($12::varchar IS NULL OR u.real_name ILIKE $12)
    "#;

    let houses = sqlx::query_as::<_, House>(&format!(
        "SELECT h.* {FILTER} ORDER BY h.created_at DESC LIMIT $13 OFFSET $14"
    ))
    .bind(&address_pattern)
    .bind(&query.house_type)
    .bind(query.min_area)
    .bind(query.max_area)
    .bind(query.min_rent)
    .bind(query.max_rent)
    .bind(&query.decoration)
    .bind(&facilities_pattern)
    .bind(query.status)
    .bind(query.recommended)
    .bind(query.landlord_id)
    .bind(&landlord_pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {FILTER}"))
        .bind(&address_pattern)
        .bind(&query.house_type)
        .bind(query.min_area)
        .bind(query.max_area)
        .bind(query.min_rent)
        .bind(query.max_rent)
        .bind(&query.decoration)
        .bind(&facilities_pattern)
        .bind(query.status)
        .bind(query.recommended)
        .bind(query.landlord_id)
        .bind(&landlord_pattern)
        .fetch_one(&state.pool)
        .await?;

    let mut response = Vec::new();
    for house in &houses {
        response.push(build_house_response(&state, house).await?);
    }

    Ok(Json(PageResponse::new(response, query.page, limit, total.0)))
}

/// Рекомендованные дома
#[utoipa::path(
    get,
    path = "/api/houses/recommended",
    tag = "houses",
    responses(
        (status = 200, description = "Список рекомендованных домов", body = Vec<HouseResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn recommended_houses(
    State(state): State<AppState>,
    _auth: AuthToken,
) -> AppResult<Json<Vec<HouseResponse>>> {
    let houses = sqlx::query_as::<_, House>(
        "SELECT * FROM houses WHERE recommended = true ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    let mut response = Vec::new();
    for house in &houses {
        response.push(build_house_response(&state, house).await?);
    }

    Ok(Json(response))
}

/// Дом по ID
#[utoipa::path(
    get,
    path = "/api/houses/{id}",
    tag = "houses",
    params(("id" = Uuid, Path, description = "ID дома")),
    responses(
        (status = 200, description = "Дом", body = HouseResponse),
        (status = 404, description = "Дом не найден")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_house(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<HouseResponse>> {
    let house = sqlx::query_as::<_, House>("SELECT * FROM houses WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Дом не найден".to_string()))?;

    Ok(Json(build_house_response(&state, &house).await?))
}

/// Создание дома
#[utoipa::path(
    post,
    path = "/api/houses",
    tag = "houses",
    request_body = CreateHouseRequest,
    responses(
        (status = 200, description = "Созданный дом", body = HouseResponse),
        (status = 400, description = "Арендодатель не найден или данные некорректны")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_house(
    State(state): State<AppState>,
    _auth: AuthToken,
    Json(payload): Json<CreateHouseRequest>,
) -> AppResult<Json<HouseResponse>> {
    if payload.address.trim().is_empty() {
        return Err(AppError::Validation("Адрес не может быть пустым".to_string()));
    }
    if payload.rent <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Арендная плата должна быть больше нуля".to_string(),
        ));
    }

    let landlord: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(payload.landlord_id)
        .fetch_optional(&state.pool)
        .await?;
    if landlord.is_none() {
        return Err(AppError::BadRequest(format!(
            "Арендодатель не найден: {}",
            payload.landlord_id
        )));
    }

    let house = sqlx::query_as::<_, House>(
        r#"
        INSERT INTO houses (
            address, house_type, area, rent, decoration, facilities,
            status, description, recommended, landlord_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(payload.address.trim())
    .bind(&payload.house_type)
    .bind(payload.area)
    .bind(payload.rent)
    .bind(&payload.decoration)
    .bind(&payload.facilities)
    .bind(payload.status.unwrap_or_default())
    .bind(&payload.description)
    .bind(payload.recommended.unwrap_or(false))
    .bind(payload.landlord_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(build_house_response(&state, &house).await?))
}

/// Обновление дома
#[utoipa::path(
    put,
    path = "/api/houses/{id}",
    tag = "houses",
    params(("id" = Uuid, Path, description = "ID дома")),
    request_body = UpdateHouseRequest,
    responses(
        (status = 200, description = "Обновлённый дом", body = HouseResponse),
        (status = 404, description = "Дом не найден")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_house(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateHouseRequest>,
) -> AppResult<Json<HouseResponse>> {
    if payload.rent <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Арендная плата должна быть больше нуля".to_string(),
        ));
    }

    let existing = sqlx::query_as::<_, House>("SELECT * FROM houses WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Дом не найден".to_string()))?;

    // арендодатель меняется только если передан явно
    if let Some(landlord_id) = payload.landlord_id {
        let landlord: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(landlord_id)
            .fetch_optional(&state.pool)
            .await?;
        if landlord.is_none() {
            return Err(AppError::BadRequest(format!(
                "Арендодатель не найден: {}",
                landlord_id
            )));
        }
    }

    let house = sqlx::query_as::<_, House>(
        r#"
        UPDATE houses SET
            address = $2,
            house_type = $3,
            area = $4,
            rent = $5,
            decoration = $6,
            facilities = $7,
            status = $8,
            description = $9,
            recommended = $10,
            landlord_id = COALESCE($11, landlord_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.address.trim())
    .bind(&payload.house_type)
    .bind(payload.area)
    .bind(payload.rent)
    .bind(&payload.decoration)
    .bind(&payload.facilities)
    .bind(payload.status.unwrap_or(existing.status))
    .bind(&payload.description)
    .bind(payload.recommended.unwrap_or(existing.recommended))
    .bind(payload.landlord_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(build_house_response(&state, &house).await?))
}

/// Удаление дома
#[utoipa::path(
    delete,
    path = "/api/houses/{id}",
    tag = "houses",
    params(("id" = Uuid, Path, description = "ID дома")),
    responses(
        (status = 200, description = "Дом удалён"),
        (status = 404, description = "Дом не найден")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_house(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM houses WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Дом не найден".to_string()));
    }

    let has_contracts: Option<(i32,)> =
        sqlx::query_as("SELECT 1 FROM contracts WHERE house_id = $1 LIMIT 1")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    if has_contracts.is_some() {
        return Err(AppError::BadRequest(
            "Нельзя удалить дом, по которому есть договоры".to_string(),
        ));
    }

    sqlx::query("DELETE FROM houses WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(serde_json::json!({"success": true})))
}

/// Переключение флага рекомендации
#[utoipa::path(
    post,
    path = "/api/houses/{id}/recommend",
    tag = "houses",
    params(("id" = Uuid, Path, description = "ID дома")),
    responses(
        (status = 200, description = "Дом с обновлённым флагом", body = HouseResponse),
        (status = 404, description = "Дом не найден")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_recommend(
    State(state): State<AppState>,
    _auth: AuthToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<HouseResponse>> {
    let house = sqlx::query_as::<_, House>(
        r#"
        UPDATE houses
        SET recommended = NOT recommended, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Дом не найден".to_string()))?;

    Ok(Json(build_house_response(&state, &house).await?))
}
