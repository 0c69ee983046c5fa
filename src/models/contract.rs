use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "contract_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    Active,
    Expired,
    Terminated,
}

impl Default for ContractStatus {
    fn default() -> Self {
        Self::Draft
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_cycle", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentCycle {
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl PaymentCycle {
    /// Шаг графика платежей в месяцах
    pub fn step_months(&self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::HalfYearly => 6,
            Self::Yearly => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Alipay,
    WechatPay,
    CreditCard,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Contract {
    pub id: Uuid,
    pub contract_no: String,
    pub house_id: Uuid,
    pub landlord_id: Uuid,
    pub tenant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rent_amount: Decimal,
    pub payment_cycle: Option<PaymentCycle>,
    pub payment_method: Option<PaymentMethod>,
    pub breach_clause: Option<String>,
    pub status: ContractStatus,
    pub signed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContractResponse {
    pub id: Uuid,
    pub contract_no: String,
    pub house_id: Uuid,
    pub house_address: Option<String>,
    pub landlord_id: Uuid,
    pub landlord_name: Option<String>,
    pub tenant_id: Uuid,
    pub tenant_name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rent_amount: Decimal,
    pub payment_cycle: Option<PaymentCycle>,
    pub payment_method: Option<PaymentMethod>,
    pub breach_clause: Option<String>,
    pub status: ContractStatus,
    pub signed_at: DateTime<Utc>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContractRequest {
    pub contract_no: Option<String>,
    pub house_id: Uuid,
    pub landlord_id: Uuid,
    pub tenant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rent_amount: Decimal,
    pub payment_cycle: Option<PaymentCycle>,
    pub payment_method: Option<PaymentMethod>,
    pub breach_clause: Option<String>,
    pub status: Option<ContractStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateContractRequest {
    pub contract_no: Option<String>,
    pub house_id: Option<Uuid>,
    pub landlord_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rent_amount: Decimal,
    pub payment_cycle: Option<PaymentCycle>,
    pub payment_method: Option<PaymentMethod>,
    pub breach_clause: Option<String>,
    pub status: Option<ContractStatus>,
}

/// Данные для шаблона договора: скаляры, которые фронтенд подставляет в форму
#[derive(Debug, Serialize, ToSchema)]
pub struct ContractTemplateData {
    pub house_id: Uuid,
    pub house_address: String,
    pub house_rent: Decimal,
    pub landlord_id: Uuid,
    pub landlord_name: String,
    pub landlord_phone: Option<String>,
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub tenant_phone: Option<String>,
}
