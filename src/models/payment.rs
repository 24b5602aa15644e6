use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "payment_method", rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
    Upi,
    Wallet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "payment_type", rename_all = "UPPERCASE")]
pub enum PaymentType {
    Membership,
    Class,
    Renewal,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "payment_status", rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
    Cancelled,
}

/// Payment row joined with payer and plan columns.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub member_id: Uuid,
    pub transaction_ref: String,
    pub amount: Decimal,
    pub discount: Decimal,
    pub final_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub description: Option<String>,
    pub invoice_number: Option<String>,
    pub coupon_code: Option<String>,
    pub refund_amount: Option<Decimal>,
    pub refund_date: Option<DateTime<Utc>>,
    pub refund_reason: Option<String>,
    pub processed_by: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub plan_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePayment {
    pub member_id: Uuid,
    pub amount: Decimal,
    pub discount: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub status: Option<PaymentStatus>,
    pub description: Option<String>,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatus {
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub refund_amount: Decimal,
    pub reason: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PaymentStats {
    pub total_payments: i64,
    pub completed_count: i64,
    pub pending_count: i64,
    pub failed_count: i64,
    pub refunded_count: i64,
    pub completed_revenue: Decimal,
    pub pending_revenue: Decimal,
    pub total_refunds: Decimal,
}
