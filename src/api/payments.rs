use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{admin_only_middleware, UserSession};
use crate::models::{
    CreatePayment, PaymentRow, PaymentStats, RefundRequest, UpdatePaymentStatus,
};
use crate::services::{MemberService, PaymentService, ServiceError};

#[derive(Clone)]
struct PaymentsState {
    payments: PaymentService,
    members: MemberService,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
struct DateRangeQuery {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

/// Payment processing. Members can read their own payment history via
/// `/my`; everything else is admin-only.
pub fn payment_routes(db: PgPool) -> Router {
    let state = PaymentsState {
        payments: PaymentService::new(db.clone()),
        members: MemberService::new(db),
    };

    let admin = Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route("/search", get(search_payments))
        .route("/range", get(payments_between))
        .route("/stats", get(payment_stats))
        .route("/transaction/:ref", get(get_payment_by_ref))
        .route("/member/:member_id", get(payments_by_member))
        .route("/:id", get(get_payment).delete(cancel_payment))
        .route("/:id/status", put(update_status))
        .route("/:id/refund", post(refund_payment))
        .route_layer(middleware::from_fn(admin_only_middleware));

    Router::new()
        .route("/my", get(my_payments))
        .merge(admin)
        .with_state(state)
}

/// The calling member's own payment history
#[tracing::instrument(skip(state))]
async fn my_payments(
    State(state): State<PaymentsState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<Vec<PaymentRow>>, ServiceError> {
    let member_id = state.members.member_id_for_user(session.user_id).await?;
    let payments = state.payments.payments_by_member(member_id).await?;
    Ok(Json(payments))
}

#[tracing::instrument(skip(state))]
async fn list_payments(
    State(state): State<PaymentsState>,
) -> Result<Json<Vec<PaymentRow>>, ServiceError> {
    let payments = state.payments.list_payments().await?;
    Ok(Json(payments))
}

#[tracing::instrument(skip(state, payment))]
async fn create_payment(
    State(state): State<PaymentsState>,
    Extension(session): Extension<UserSession>,
    Json(payment): Json<CreatePayment>,
) -> Result<Json<PaymentRow>, ServiceError> {
    let created = state
        .payments
        .create_payment(payment, Some(session.user_id))
        .await?;
    Ok(Json(created))
}

#[tracing::instrument(skip(state))]
async fn search_payments(
    State(state): State<PaymentsState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PaymentRow>>, ServiceError> {
    let payments = state.payments.search_payments(&query.q).await?;
    Ok(Json(payments))
}

#[tracing::instrument(skip(state))]
async fn payments_between(
    State(state): State<PaymentsState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<PaymentRow>>, ServiceError> {
    if query.to < query.from {
        return Err(ServiceError::Validation(
            "Range end must not precede its start".into(),
        ));
    }
    let payments = state.payments.payments_between(query.from, query.to).await?;
    Ok(Json(payments))
}

#[tracing::instrument(skip(state))]
async fn payment_stats(
    State(state): State<PaymentsState>,
) -> Result<Json<PaymentStats>, ServiceError> {
    let stats = state.payments.payment_stats().await?;
    Ok(Json(stats))
}

#[tracing::instrument(skip(state))]
async fn get_payment_by_ref(
    State(state): State<PaymentsState>,
    Path(transaction_ref): Path<String>,
) -> Result<Json<PaymentRow>, ServiceError> {
    let payment = state
        .payments
        .get_payment_by_transaction_ref(&transaction_ref)
        .await?;
    Ok(Json(payment))
}

#[tracing::instrument(skip(state))]
async fn payments_by_member(
    State(state): State<PaymentsState>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentRow>>, ServiceError> {
    let payments = state.payments.payments_by_member(member_id).await?;
    Ok(Json(payments))
}

#[tracing::instrument(skip(state))]
async fn get_payment(
    State(state): State<PaymentsState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentRow>, ServiceError> {
    let payment = state.payments.get_payment(payment_id).await?;
    Ok(Json(payment))
}

#[tracing::instrument(skip(state, request))]
async fn update_status(
    State(state): State<PaymentsState>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<UpdatePaymentStatus>,
) -> Result<Json<PaymentRow>, ServiceError> {
    let updated = state
        .payments
        .update_payment_status(payment_id, request.status)
        .await?;
    Ok(Json(updated))
}

#[tracing::instrument(skip(state, request))]
async fn refund_payment(
    State(state): State<PaymentsState>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<RefundRequest>,
) -> Result<Json<PaymentRow>, ServiceError> {
    let refunded = state.payments.refund_payment(payment_id, request).await?;
    Ok(Json(refunded))
}

#[tracing::instrument(skip(state))]
async fn cancel_payment(
    State(state): State<PaymentsState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentRow>, ServiceError> {
    let cancelled = state.payments.cancel_payment(payment_id).await?;
    Ok(Json(cancelled))
}
