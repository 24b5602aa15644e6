use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored membership states. EXPIRING_SOON is never stored, it is derived
/// on read from the end date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "membership_status", rename_all = "UPPERCASE")]
pub enum MembershipStatus {
    Active,
    Expired,
    Suspended,
}

/// Member row joined with its user and (optional) plan columns.
#[derive(Debug, Clone, FromRow)]
pub struct MemberRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_conditions: Option<String>,
    pub membership_plan_id: Option<Uuid>,
    pub plan_name: Option<String>,
    pub plan_price: Option<Decimal>,
    pub membership_start_date: NaiveDate,
    pub membership_end_date: NaiveDate,
    pub membership_status: MembershipStatus,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_conditions: Option<String>,
    pub membership_plan_id: Option<Uuid>,
    pub plan_name: Option<String>,
    pub plan_price: Option<Decimal>,
    pub membership_start_date: NaiveDate,
    pub membership_end_date: NaiveDate,
    pub membership_status: MembershipStatus,
    pub days_remaining: i64,
    pub expiring_soon: bool,
}

impl From<MemberRow> for MemberResponse {
    fn from(m: MemberRow) -> Self {
        let today = Utc::now().date_naive();
        let days_remaining = (m.membership_end_date - today).num_days();
        let expiring_soon = m.membership_status == MembershipStatus::Active
            && (0..=7).contains(&days_remaining);

        Self {
            id: m.id,
            user_id: m.user_id,
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            phone: m.phone,
            emergency_contact: m.emergency_contact,
            medical_conditions: m.medical_conditions,
            membership_plan_id: m.membership_plan_id,
            plan_name: m.plan_name,
            plan_price: m.plan_price,
            membership_start_date: m.membership_start_date,
            membership_end_date: m.membership_end_date,
            membership_status: m.membership_status,
            days_remaining,
            expiring_soon,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMember {
    pub user_id: Uuid,
    pub emergency_contact: Option<String>,
    pub medical_conditions: Option<String>,
    pub membership_plan_id: Option<Uuid>,
    pub membership_start_date: NaiveDate,
    pub membership_end_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateMember {
    pub emergency_contact: Option<String>,
    pub medical_conditions: Option<String>,
    pub membership_plan_id: Option<Uuid>,
    pub membership_start_date: Option<NaiveDate>,
    pub membership_end_date: Option<NaiveDate>,
    pub membership_status: Option<MembershipStatus>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct MembershipStats {
    pub total: i64,
    pub active: i64,
    pub expired: i64,
    pub suspended: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(end: NaiveDate, status: MembershipStatus) -> MemberRow {
        MemberRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            phone: None,
            emergency_contact: None,
            medical_conditions: None,
            membership_plan_id: None,
            plan_name: None,
            plan_price: None,
            membership_start_date: end - Duration::days(30),
            membership_end_date: end,
            membership_status: status,
        }
    }

    #[test]
    fn membership_ending_within_a_week_is_flagged() {
        let end = Utc::now().date_naive() + Duration::days(3);
        let resp = MemberResponse::from(row(end, MembershipStatus::Active));
        assert!(resp.expiring_soon);
        assert_eq!(resp.days_remaining, 3);
    }

    #[test]
    fn distant_end_date_is_not_flagged() {
        let end = Utc::now().date_naive() + Duration::days(60);
        let resp = MemberResponse::from(row(end, MembershipStatus::Active));
        assert!(!resp.expiring_soon);
    }

    #[test]
    fn suspended_membership_is_never_expiring_soon() {
        let end = Utc::now().date_naive() + Duration::days(2);
        let resp = MemberResponse::from(row(end, MembershipStatus::Suspended));
        assert!(!resp.expiring_soon);
    }

    #[test]
    fn past_end_date_yields_negative_days() {
        let end = Utc::now().date_naive() - Duration::days(5);
        let resp = MemberResponse::from(row(end, MembershipStatus::Expired));
        assert_eq!(resp.days_remaining, -5);
        assert!(!resp.expiring_soon);
    }
}
