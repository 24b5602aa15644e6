use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::gym_class::ClassStats;
use crate::models::member::MembershipStats;
use crate::models::payment::PaymentStats;

#[derive(Debug, Serialize)]
pub struct DashboardReport {
    pub membership: MembershipStats,
    pub classes: ClassStats,
    pub payments: PaymentStats,
}

/// Figures for one calendar month, used by the monthly report.
#[derive(Debug, Serialize)]
pub struct MonthlyFigures {
    pub year: i32,
    pub month: u32,
    pub new_members: i64,
    pub total_members: i64,
    /// ACTIVE member count as of the query, not scoped to the month.
    pub current_active_members: i64,
    pub revenue: Decimal,
    pub completed_payments: i64,
    pub failed_payments: i64,
    pub refunded_payments: i64,
    pub pending_payments: i64,
    pub total_refunds: Decimal,
    pub cash_payments: i64,
    pub card_payments: i64,
    pub online_payments: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub current: MonthlyFigures,
    pub previous: MonthlyFigures,
    /// Month-over-month revenue change, absent when the previous month
    /// had no revenue.
    pub revenue_change_pct: Option<f64>,
}
