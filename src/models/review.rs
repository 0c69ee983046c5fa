use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "review_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewType {
    TenantToLandlord,
    LandlordToTenant,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub review_type: ReviewType,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub contract_no: Option<String>,
    pub reviewer_id: Uuid,
    pub reviewer_name: Option<String>,
    pub reviewee_id: Uuid,
    pub reviewee_name: Option<String>,
    pub review_type: ReviewType,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

// DTOs
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub contract_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub review_type: ReviewType,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;

pub fn rating_in_range(rating: i32) -> bool {
    (RATING_MIN..=RATING_MAX).contains(&rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(rating_in_range(1));
        assert!(rating_in_range(5));
        assert!(!rating_in_range(0));
        assert!(!rating_in_range(6));
        assert!(!rating_in_range(-1));
    }
}
