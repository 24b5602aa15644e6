use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "booking_status", rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Attended,
    #[serde(rename = "NO_SHOW")]
    #[sqlx(rename = "NO_SHOW")]
    NoShow,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClassBooking {
    pub id: Uuid,
    pub class_id: Uuid,
    pub member_id: Uuid,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
}

/// One roster line: the booking plus the member's name and contact.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RosterEntry {
    pub booking_id: Uuid,
    pub member_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize)]
pub struct BookClassRequest {
    /// Admins book on behalf of a member; members book themselves and
    /// leave this unset.
    pub member_id: Option<Uuid>,
}
