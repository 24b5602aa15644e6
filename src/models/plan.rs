use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MembershipPlan {
    pub id: Uuid,
    pub plan_name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_months: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePlan {
    pub plan_name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_months: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePlan {
    pub plan_name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub duration_months: Option<i32>,
    pub is_active: Option<bool>,
}
