use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RentPayment {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: PaymentStatus,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub reminded_at: Option<DateTime<Utc>>,
    pub overdue_processed: bool,
    pub penalty: Option<Decimal>,
}

impl RentPayment {
    /// Статус на момент чтения: просрочка вычисляется по дате, в базе не
    /// фиксируется до явной обработки
    pub fn effective_status(&self, today: NaiveDate) -> PaymentStatus {
        if self.status == PaymentStatus::Pending && self.due_date < today {
            PaymentStatus::Overdue
        } else {
            self.status
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RentPaymentResponse {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub contract_no: Option<String>,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: PaymentStatus,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub reminded_at: Option<DateTime<Utc>>,
    pub overdue_processed: bool,
    pub penalty: Option<Decimal>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRentPaymentRequest {
    pub contract_id: Uuid,
    pub due_date: NaiveDate,
    pub amount: Option<Decimal>,
    pub status: Option<PaymentStatus>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRentPaymentRequest {
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: PaymentStatus,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub penalty: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use rust_decimal::Decimal;

    fn payment(status: PaymentStatus, due: NaiveDate) -> RentPayment {
        RentPayment {
            id: Uuid::new_v4(),
            contract_id: Uuid::new_v4(),
            due_date: due,
            amount: Decimal::new(150_000, 2),
            paid_at: None,
            status,
            period_start: due.with_day(1).unwrap(),
            period_end: due,
            reminded_at: None,
            overdue_processed: false,
            penalty: None,
        }
    }

    #[test]
    fn test_pending_past_due_reported_overdue() {
        let due = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let rp = payment(PaymentStatus::Pending, due);
        assert_eq!(rp.effective_status(today), PaymentStatus::Overdue);
        // в самой записи статус не меняется
        assert_eq!(rp.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_pending_before_due_stays_pending() {
        let due = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let rp = payment(PaymentStatus::Pending, due);
        assert_eq!(rp.effective_status(today), PaymentStatus::Pending);
    }

    #[test]
    fn test_paid_never_reported_overdue() {
        let due = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rp = payment(PaymentStatus::Paid, due);
        assert_eq!(rp.effective_status(today), PaymentStatus::Paid);
    }
}
