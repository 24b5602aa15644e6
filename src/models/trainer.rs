use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Trainer row joined with user columns and the taught-class count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrainerRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub certifications: Option<String>,
    pub hourly_rate: Decimal,
    pub availability: Option<String>,
    pub total_classes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTrainer {
    pub user_id: Uuid,
    pub specialization: Option<String>,
    pub certifications: Option<String>,
    pub hourly_rate: Decimal,
    pub availability: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateTrainer {
    pub specialization: Option<String>,
    pub certifications: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub availability: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TrainerStats {
    pub total: i64,
    pub avg_rate: Option<Decimal>,
    pub min_rate: Option<Decimal>,
    pub max_rate: Option<Decimal>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SpecializationCount {
    pub specialization: String,
    pub count: i64,
}
