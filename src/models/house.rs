use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "house_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HouseStatus {
    Available,
    Rented,
    Maintenance,
    Offline,
}

impl Default for HouseStatus {
    fn default() -> Self {
        Self::Available
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct House {
    pub id: Uuid,
    pub address: String,
    pub house_type: Option<String>,
    pub area: Option<Decimal>,
    pub rent: Decimal,
    pub decoration: Option<String>,
    pub facilities: Option<String>,
    pub status: HouseStatus,
    pub description: Option<String>,
    pub recommended: bool,
    pub landlord_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Проекция для выдачи: вместо вложенного арендодателя — id и имя
#[derive(Debug, Serialize, ToSchema)]
pub struct HouseResponse {
    pub id: Uuid,
    pub address: String,
    pub house_type: Option<String>,
    pub area: Option<Decimal>,
    pub rent: Decimal,
    pub decoration: Option<String>,
    pub facilities: Option<String>,
    pub status: HouseStatus,
    pub description: Option<String>,
    pub recommended: bool,
    pub landlord_id: Uuid,
    pub landlord_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateHouseRequest {
    pub address: String,
    pub house_type: Option<String>,
    pub area: Option<Decimal>,
    pub rent: Decimal,
    pub decoration: Option<String>,
    pub facilities: Option<String>,
    pub status: Option<HouseStatus>,
    pub description: Option<String>,
    pub recommended: Option<bool>,
    pub landlord_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateHouseRequest {
    pub address: String,
    pub house_type: Option<String>,
    pub area: Option<Decimal>,
    pub rent: Decimal,
    pub decoration: Option<String>,
    pub facilities: Option<String>,
    pub status: Option<HouseStatus>,
    pub description: Option<String>,
    pub recommended: Option<bool>,
    pub landlord_id: Option<Uuid>,
}
