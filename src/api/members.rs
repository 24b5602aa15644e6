use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{admin_only_middleware, UserSession};
use crate::models::{
    CreateMember, MemberResponse, MembershipStats, MembershipStatus, UpdateMember,
};
use crate::services::{MemberService, ServiceError};

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
struct ExpiringQuery {
    /// Look-ahead window in days (default 7)
    days: Option<i32>,
}

/// Member management. Members can read their own profile via `/me`;
/// everything else is admin-only.
pub fn member_routes(db: PgPool) -> Router {
    let admin = Router::new()
        .route("/", get(list_members).post(create_member))
        .route("/search", get(search_members))
        .route("/expiring", get(expiring_members))
        .route("/stats", get(membership_stats))
        .route("/status/:status", get(members_by_status))
        .route("/refresh-expired", post(refresh_expired))
        .route(
            "/:id",
            get(get_member).put(update_member).delete(delete_member),
        )
        .route_layer(middleware::from_fn(admin_only_middleware));

    Router::new()
        .route("/me", get(my_profile))
        .merge(admin)
        .with_state(MemberService::new(db))
}

/// The calling member's own profile
#[tracing::instrument(skip(service))]
async fn my_profile(
    State(service): State<MemberService>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<MemberResponse>, ServiceError> {
    let member = service.get_member_by_user(session.user_id).await?;
    Ok(Json(member))
}

#[tracing::instrument(skip(service))]
async fn list_members(
    State(service): State<MemberService>,
) -> Result<Json<Vec<MemberResponse>>, ServiceError> {
    let members = service.list_members().await?;
    Ok(Json(members))
}

#[tracing::instrument(skip(service, member))]
async fn create_member(
    State(service): State<MemberService>,
    Json(member): Json<CreateMember>,
) -> Result<Json<MemberResponse>, ServiceError> {
    let created = service.create_member(member).await?;
    Ok(Json(created))
}

#[tracing::instrument(skip(service))]
async fn search_members(
    State(service): State<MemberService>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<MemberResponse>>, ServiceError> {
    let members = service.search_members(&query.q).await?;
    Ok(Json(members))
}

#[tracing::instrument(skip(service))]
async fn expiring_members(
    State(service): State<MemberService>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<Vec<MemberResponse>>, ServiceError> {
    let days = query.days.unwrap_or(7);
    if days < 0 {
        return Err(ServiceError::Validation(
            "Days must be non-negative".into(),
        ));
    }
    let members = service.expiring_memberships(days).await?;
    Ok(Json(members))
}

#[tracing::instrument(skip(service))]
async fn membership_stats(
    State(service): State<MemberService>,
) -> Result<Json<MembershipStats>, ServiceError> {
    let stats = service.membership_stats().await?;
    Ok(Json(stats))
}

#[tracing::instrument(skip(service))]
async fn members_by_status(
    State(service): State<MemberService>,
    Path(status): Path<MembershipStatus>,
) -> Result<Json<Vec<MemberResponse>>, ServiceError> {
    let members = service.members_by_status(status).await?;
    Ok(Json(members))
}

#[tracing::instrument(skip(service))]
async fn refresh_expired(
    State(service): State<MemberService>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let updated = service.refresh_expired_memberships().await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

#[tracing::instrument(skip(service))]
async fn get_member(
    State(service): State<MemberService>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<MemberResponse>, ServiceError> {
    let member = service.get_member(member_id).await?;
    Ok(Json(member))
}

#[tracing::instrument(skip(service, member))]
async fn update_member(
    State(service): State<MemberService>,
    Path(member_id): Path<Uuid>,
    Json(member): Json<UpdateMember>,
) -> Result<Json<MemberResponse>, ServiceError> {
    let updated = service.update_member(member_id, member).await?;
    Ok(Json(updated))
}

#[tracing::instrument(skip(service))]
async fn delete_member(
    State(service): State<MemberService>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    service.delete_member(member_id).await?;
    Ok(Json(serde_json::json!({ "message": "Member deleted" })))
}
