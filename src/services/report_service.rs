use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::{DashboardReport, MonthlyFigures, MonthlyReport};
use crate::services::{ClassService, MemberService, PaymentService, ServiceError};

/// Aggregated reporting over the other services' domains.
#[derive(Debug, Clone)]
pub struct ReportService {
    db: PgPool,
    members: MemberService,
    classes: ClassService,
    payments: PaymentService,
}

#[derive(Debug, sqlx::FromRow)]
struct MonthPaymentAgg {
    revenue: Decimal,
    completed_payments: i64,
    failed_payments: i64,
    refunded_payments: i64,
    pending_payments: i64,
    total_refunds: Decimal,
    cash_payments: i64,
    card_payments: i64,
    online_payments: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct MonthMemberAgg {
    new_members: i64,
    total_members: i64,
    current_active_members: i64,
}

impl ReportService {
    pub fn new(db: PgPool) -> Self {
        Self {
            members: MemberService::new(db.clone()),
            classes: ClassService::new(db.clone()),
            payments: PaymentService::new(db.clone()),
            db,
        }
    }

    /// Dashboard aggregate. Statuses are refreshed first so the figures
    /// reflect the current clock.
    pub async fn dashboard(&self) -> Result<DashboardReport, ServiceError> {
        self.members.refresh_expired_memberships().await?;
        self.classes.refresh_class_statuses().await?;

        Ok(DashboardReport {
            membership: self.members.membership_stats().await?,
            classes: self.classes.class_stats().await?,
            payments: self.payments.payment_stats().await?,
        })
    }

    /// Figures for the given month next to the month before it.
    pub async fn monthly_report(
        &self,
        year: i32,
        month: u32,
    ) -> Result<MonthlyReport, ServiceError> {
        let current = self.month_figures(year, month).await?;
        let (prev_year, prev_month) = if month == 1 {
            (year - 1, 12)
        } else {
            (year, month - 1)
        };
        let previous = self.month_figures(prev_year, prev_month).await?;

        let revenue_change_pct = if previous.revenue > Decimal::ZERO {
            (((current.revenue - previous.revenue) / previous.revenue) * Decimal::ONE_HUNDRED)
                .to_f64()
        } else {
            None
        };

        Ok(MonthlyReport {
            current,
            previous,
            revenue_change_pct,
        })
    }

    /// Figures for the current calendar month.
    pub async fn current_monthly_report(&self) -> Result<MonthlyReport, ServiceError> {
        let today = Utc::now().date_naive();
        self.monthly_report(today.year(), today.month()).await
    }

    async fn month_figures(&self, year: i32, month: u32) -> Result<MonthlyFigures, ServiceError> {
        let (start, end) = month_bounds(year, month)
            .ok_or_else(|| ServiceError::Validation("Invalid year or month".into()))?;

        let payments = sqlx::query_as::<_, MonthPaymentAgg>(
            "SELECT COALESCE(SUM(final_amount) FILTER (WHERE status = 'COMPLETED'), 0) AS revenue,
                    COUNT(*) FILTER (WHERE status = 'COMPLETED') AS completed_payments,
                    COUNT(*) FILTER (WHERE status = 'FAILED') AS failed_payments,
                    COUNT(*) FILTER (WHERE status = 'REFUNDED') AS refunded_payments,
                    COUNT(*) FILTER (WHERE status = 'PENDING') AS pending_payments,
                    COALESCE(SUM(refund_amount) FILTER (WHERE status = 'REFUNDED'), 0)
                        AS total_refunds,
                    COUNT(*) FILTER (WHERE payment_method = 'CASH') AS cash_payments,
                    COUNT(*) FILTER (WHERE payment_method = 'CARD') AS card_payments,
                    COUNT(*) FILTER (WHERE payment_method IN ('ONLINE', 'UPI', 'WALLET'))
                        AS online_payments
             FROM payments
             WHERE payment_date >= $1 AND payment_date < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;

        let members = sqlx::query_as::<_, MonthMemberAgg>(
            "SELECT COUNT(*) FILTER (WHERE membership_start_date >= $1
                                       AND membership_start_date < $2) AS new_members,
                    COUNT(*) FILTER (WHERE membership_start_date < $2) AS total_members,
                    COUNT(*) FILTER (WHERE membership_status = 'ACTIVE')
                        AS current_active_members
             FROM members",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;

        Ok(MonthlyFigures {
            year,
            month,
            new_members: members.new_members,
            total_members: members.total_members,
            current_active_members: members.current_active_members,
            revenue: payments.revenue,
            completed_payments: payments.completed_payments,
            failed_payments: payments.failed_payments,
            refunded_payments: payments.refunded_payments,
            pending_payments: payments.pending_payments,
            total_refunds: payments.total_refunds,
            cash_payments: payments.cash_payments,
            card_payments: payments.card_payments,
            online_payments: payments.online_payments,
        })
    }
}

/// First day of the month and first day of the next month.
fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn month_bounds_cover_december_rollover() {
        let (start, end) = month_bounds(2025, 12).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn month_bounds_reject_invalid_month() {
        assert!(month_bounds(2025, 13).is_none());
        assert!(month_bounds(2025, 0).is_none());
    }
}
