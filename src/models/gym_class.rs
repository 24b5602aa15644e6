use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "class_status", rename_all = "UPPERCASE")]
pub enum ClassStatus {
    Scheduled,
    #[serde(rename = "IN_PROGRESS")]
    #[sqlx(rename = "IN_PROGRESS")]
    InProgress,
    Completed,
    Cancelled,
    Full,
}

/// Class row joined with trainer and trainer-user columns.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GymClassRow {
    pub id: Uuid,
    pub class_name: String,
    pub description: Option<String>,
    pub trainer_id: Uuid,
    pub trainer_first_name: String,
    pub trainer_last_name: String,
    pub specialization: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: i32,
    pub current_bookings: i32,
    pub status: ClassStatus,
}

impl GymClassRow {
    pub fn spots_left(&self) -> i32 {
        (self.max_capacity - self.current_bookings).max(0)
    }
}

/// API shape for a class: the row plus the derived open-spot count.
#[derive(Debug, Serialize)]
pub struct ClassResponse {
    #[serde(flatten)]
    pub class: GymClassRow,
    pub spots_left: i32,
}

impl From<GymClassRow> for ClassResponse {
    fn from(class: GymClassRow) -> Self {
        let spots_left = class.spots_left();
        Self { class, spots_left }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateClass {
    pub class_name: String,
    pub description: Option<String>,
    pub trainer_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_capacity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateClass {
    pub class_name: Option<String>,
    pub description: Option<String>,
    pub trainer_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_capacity: Option<i32>,
    pub status: Option<ClassStatus>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ClassStats {
    pub total_classes: i64,
    pub scheduled: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub avg_occupancy_pct: Option<f64>,
    pub total_bookings: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_class(max_capacity: i32, current_bookings: i32) -> GymClassRow {
        GymClassRow {
            id: Uuid::new_v4(),
            class_name: "Morning Strength".into(),
            description: None,
            trainer_id: Uuid::new_v4(),
            trainer_first_name: "Sarah".into(),
            trainer_last_name: "Coach".into(),
            specialization: Some("Strength".into()),
            start_time: Utc::now(),
            end_time: Utc::now(),
            max_capacity,
            current_bookings,
            status: ClassStatus::Scheduled,
        }
    }

    #[test]
    fn spots_left_never_goes_negative() {
        assert_eq!(sample_class(15, 4).spots_left(), 11);
        assert_eq!(sample_class(15, 15).spots_left(), 0);
        // Capacity lowered below the booking count still reads as zero.
        assert_eq!(sample_class(10, 12).spots_left(), 0);
    }

    #[test]
    fn class_response_flattens_row_and_adds_spots() {
        let response = ClassResponse::from(sample_class(20, 7));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["class_name"], "Morning Strength");
        assert_eq!(json["spots_left"], 13);
    }
}
