use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    CreatePayment, PaymentRow, PaymentStats, PaymentStatus, PaymentType, RefundRequest,
};
use crate::services::ServiceError;

const PAYMENT_COLUMNS: &str = "p.id, p.member_id, p.transaction_ref, p.amount, p.discount, \
     p.final_amount, p.payment_method, p.payment_type, p.status, p.payment_date, \
     p.description, p.invoice_number, p.coupon_code, p.refund_amount, p.refund_date, \
     p.refund_reason, p.processed_by, u.first_name, u.last_name, u.email, mp.plan_name";

const PAYMENT_JOINS: &str = "FROM payments p \
     JOIN members m ON p.member_id = m.id \
     JOIN users u ON m.user_id = u.id \
     LEFT JOIN membership_plans mp ON m.membership_plan_id = mp.id";

#[derive(Debug, Clone)]
pub struct PaymentService {
    db: PgPool,
}

impl PaymentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a payment. MEMBERSHIP and RENEWAL payments extend the
    /// member's membership by the plan duration in the same transaction.
    pub async fn create_payment(
        &self,
        payment: CreatePayment,
        processed_by: Option<Uuid>,
    ) -> Result<PaymentRow, ServiceError> {
        if payment.amount <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "Amount must be greater than zero".into(),
            ));
        }
        let discount = payment.discount.unwrap_or(Decimal::ZERO);
        if discount < Decimal::ZERO || discount > payment.amount {
            return Err(ServiceError::Validation(
                "Discount must be between zero and the amount".into(),
            ));
        }
        let final_amount = payment.amount - discount;
        let transaction_ref = generate_transaction_ref();
        let invoice_number = generate_invoice_number();
        let status = payment.status.clone().unwrap_or(PaymentStatus::Completed);

        let mut tx = self.db.begin().await?;

        let payment_id: Uuid = sqlx::query_scalar(
            "INSERT INTO payments (id, member_id, transaction_ref, amount, discount, final_amount,
                                   payment_method, payment_type, status, description,
                                   invoice_number, coupon_code, processed_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(payment.member_id)
        .bind(&transaction_ref)
        .bind(payment.amount)
        .bind(discount)
        .bind(final_amount)
        .bind(&payment.payment_method)
        .bind(&payment.payment_type)
        .bind(&status)
        .bind(&payment.description)
        .bind(&invoice_number)
        .bind(&payment.coupon_code)
        .bind(processed_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if ServiceError::is_pg_code(&e, "23503") {
                ServiceError::NotFound("Member")
            } else {
                ServiceError::Database(e)
            }
        })?;

        if extends_membership(&payment.payment_type) {
            // Extension stacks on an unexpired membership and restarts
            // from today otherwise.
            let result = sqlx::query(
                "UPDATE members m
                 SET membership_end_date = CAST(CASE
                         WHEN m.membership_end_date > CURRENT_DATE
                             THEN m.membership_end_date
                                  + make_interval(months => mp.duration_months)
                         ELSE CURRENT_DATE
                              + make_interval(months => mp.duration_months)
                     END AS date),
                     membership_status = 'ACTIVE'
                 FROM membership_plans mp
                 WHERE m.id = $1 AND m.membership_plan_id = mp.id",
            )
            .bind(payment.member_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(ServiceError::conflict(
                    "Member has no membership plan to extend",
                ));
            }
        }

        tx.commit().await?;

        tracing::info!(%payment_id, %transaction_ref, "payment recorded");
        self.get_payment(payment_id).await
    }

    pub async fn get_payment(&self, payment_id: Uuid) -> Result<PaymentRow, ServiceError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} {PAYMENT_JOINS} WHERE p.id = $1");
        sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ServiceError::NotFound("Payment"))
    }

    pub async fn get_payment_by_transaction_ref(
        &self,
        transaction_ref: &str,
    ) -> Result<PaymentRow, ServiceError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} {PAYMENT_JOINS} WHERE p.transaction_ref = $1");
        sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(transaction_ref)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ServiceError::NotFound("Payment"))
    }

    pub async fn list_payments(&self) -> Result<Vec<PaymentRow>, ServiceError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} {PAYMENT_JOINS} ORDER BY p.payment_date DESC");
        let rows = sqlx::query_as::<_, PaymentRow>(&sql).fetch_all(&self.db).await?;
        Ok(rows)
    }

    pub async fn payments_by_member(
        &self,
        member_id: Uuid,
    ) -> Result<Vec<PaymentRow>, ServiceError> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} {PAYMENT_JOINS}
             WHERE p.member_id = $1
             ORDER BY p.payment_date DESC"
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(member_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn payments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PaymentRow>, ServiceError> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} {PAYMENT_JOINS}
             WHERE p.payment_date >= $1 AND p.payment_date <= $2
             ORDER BY p.payment_date DESC"
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Search by payer name, transaction ref or invoice number.
    pub async fn search_payments(&self, term: &str) -> Result<Vec<PaymentRow>, ServiceError> {
        let pattern = format!("%{}%", term.to_lowercase());
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} {PAYMENT_JOINS}
             WHERE LOWER(u.first_name) LIKE $1 OR LOWER(u.last_name) LIKE $1
                OR LOWER(p.transaction_ref) LIKE $1 OR LOWER(p.invoice_number) LIKE $1
             ORDER BY p.payment_date DESC"
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(&pattern)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn update_payment_status(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> Result<PaymentRow, ServiceError> {
        if status == PaymentStatus::Refunded {
            return Err(ServiceError::Validation(
                "Use the refund endpoint to refund a payment".into(),
            ));
        }

        let result = sqlx::query("UPDATE payments SET status = $2 WHERE id = $1")
            .bind(payment_id)
            .bind(&status)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Payment"));
        }
        self.get_payment(payment_id).await
    }

    /// Refund a COMPLETED payment, up to its final amount.
    pub async fn refund_payment(
        &self,
        payment_id: Uuid,
        refund: RefundRequest,
    ) -> Result<PaymentRow, ServiceError> {
        if refund.refund_amount <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "Refund amount must be greater than zero".into(),
            ));
        }

        let current = self.get_payment(payment_id).await?;
        if current.status != PaymentStatus::Completed {
            return Err(ServiceError::conflict(
                "Only completed payments can be refunded",
            ));
        }
        if refund.refund_amount > current.final_amount {
            return Err(ServiceError::Validation(
                "Refund amount must not exceed the amount paid".into(),
            ));
        }

        sqlx::query(
            "UPDATE payments
             SET status = 'REFUNDED', refund_amount = $2, refund_reason = $3, refund_date = NOW()
             WHERE id = $1",
        )
        .bind(payment_id)
        .bind(refund.refund_amount)
        .bind(&refund.reason)
        .execute(&self.db)
        .await?;

        tracing::info!(%payment_id, "payment refunded");
        self.get_payment(payment_id).await
    }

    /// Payments are never hard-deleted; delete marks them CANCELLED,
    /// whatever status they are in.
    pub async fn cancel_payment(&self, payment_id: Uuid) -> Result<PaymentRow, ServiceError> {
        let result = sqlx::query("UPDATE payments SET status = 'CANCELLED' WHERE id = $1")
            .bind(payment_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Payment"));
        }
        self.get_payment(payment_id).await
    }

    pub async fn payment_stats(&self) -> Result<PaymentStats, ServiceError> {
        let stats = sqlx::query_as::<_, PaymentStats>(
            "SELECT COUNT(*) AS total_payments,
                    COUNT(*) FILTER (WHERE status = 'COMPLETED') AS completed_count,
                    COUNT(*) FILTER (WHERE status = 'PENDING') AS pending_count,
                    COUNT(*) FILTER (WHERE status = 'FAILED') AS failed_count,
                    COUNT(*) FILTER (WHERE status = 'REFUNDED') AS refunded_count,
                    COALESCE(SUM(final_amount) FILTER (WHERE status = 'COMPLETED'), 0)
                        AS completed_revenue,
                    COALESCE(SUM(final_amount) FILTER (WHERE status = 'PENDING'), 0)
                        AS pending_revenue,
                    COALESCE(SUM(refund_amount) FILTER (WHERE status = 'REFUNDED'), 0)
                        AS total_refunds
             FROM payments",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(stats)
    }
}

/// MEMBERSHIP and RENEWAL payments extend the membership when recorded,
/// whatever status they are recorded with.
fn extends_membership(payment_type: &PaymentType) -> bool {
    matches!(payment_type, PaymentType::Membership | PaymentType::Renewal)
}

fn generate_transaction_ref() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("TXN{millis}{suffix:03}")
}

fn generate_invoice_number() -> String {
    format!("INV{}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_refs_have_txn_prefix_and_are_unique_enough() {
        let a = generate_transaction_ref();
        let b = generate_transaction_ref();
        assert!(a.starts_with("TXN"));
        assert!(a.len() >= 16);
        // Same millisecond is possible; the random suffix still varies
        // almost always, so only check the shape here.
        assert!(b.starts_with("TXN"));
    }

    #[test]
    fn invoice_numbers_have_inv_prefix() {
        assert!(generate_invoice_number().starts_with("INV"));
    }

    #[test]
    fn only_membership_and_renewal_extend_the_membership() {
        assert!(extends_membership(&PaymentType::Membership));
        assert!(extends_membership(&PaymentType::Renewal));
        assert!(!extends_membership(&PaymentType::Class));
        assert!(!extends_membership(&PaymentType::Other));
    }
}
