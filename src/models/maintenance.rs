use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
    Paid,
}

impl Default for MaintenanceStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl MaintenanceStatus {
    /// Статусы, фиксирующие завершение работ
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Paid)
    }
}

/// Время завершения после смены статуса: выставляется один раз при первом
/// переходе в COMPLETED/PAID, повторные переходы его не перезаписывают
pub fn next_completed_at(
    new_status: MaintenanceStatus,
    current: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if new_status.is_terminal() && current.is_none() {
        Some(now)
    } else {
        current
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MaintenanceRequest {
    pub id: Uuid,
    pub house_id: Uuid,
    pub description: String,
    pub cost: Option<Decimal>,
    pub status: MaintenanceStatus,
    pub requester_name: Option<String>,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MaintenanceRequestResponse {
    pub id: Uuid,
    pub house_id: Uuid,
    pub house_address: Option<String>,
    pub description: String,
    pub cost: Option<Decimal>,
    pub status: MaintenanceStatus,
    pub requester_name: Option<String>,
    pub contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMaintenanceRequest {
    pub house_id: Uuid,
    pub description: String,
    pub cost: Option<Decimal>,
    pub requester_name: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMaintenanceRequest {
    pub house_id: Option<Uuid>,
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    pub status: Option<MaintenanceStatus>,
    pub requester_name: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMaintenanceStatusRequest {
    pub status: MaintenanceStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMaintenanceCostRequest {
    pub cost: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_first_terminal_transition_sets_completed_at() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            next_completed_at(MaintenanceStatus::Completed, None, now),
            Some(now)
        );
        assert_eq!(
            next_completed_at(MaintenanceStatus::Paid, None, now),
            Some(now)
        );
    }

    #[test]
    fn test_repeated_terminal_transition_keeps_original() {
        let first = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            next_completed_at(MaintenanceStatus::Paid, Some(first), later),
            Some(first)
        );
        assert_eq!(
            next_completed_at(MaintenanceStatus::Completed, Some(first), later),
            Some(first)
        );
    }

    #[test]
    fn test_non_terminal_status_leaves_completed_at_unset() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            next_completed_at(MaintenanceStatus::InProgress, None, now),
            None
        );
        // и не стирает уже выставленное
        assert_eq!(
            next_completed_at(MaintenanceStatus::Pending, Some(now), now),
            Some(now)
        );
    }
}
