use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::admin_only_middleware;
use crate::models::{CreatePlan, MembershipPlan, UpdatePlan};
use crate::services::{PlanService, ServiceError};

#[derive(Debug, Deserialize)]
struct ListPlansQuery {
    active_only: Option<bool>,
}

/// Membership plan catalog. Reads are open to any authenticated user,
/// mutations are admin-only.
pub fn plan_routes(db: PgPool) -> Router {
    let admin = Router::new()
        .route("/", post(create_plan))
        .route("/:id", put(update_plan).delete(delete_plan))
        .route_layer(middleware::from_fn(admin_only_middleware));

    Router::new()
        .route("/", get(list_plans))
        .route("/:id", get(get_plan))
        .merge(admin)
        .with_state(PlanService::new(db))
}

#[tracing::instrument(skip(service))]
async fn list_plans(
    State(service): State<PlanService>,
    Query(query): Query<ListPlansQuery>,
) -> Result<Json<Vec<MembershipPlan>>, ServiceError> {
    let plans = service.list_plans(query.active_only.unwrap_or(false)).await?;
    Ok(Json(plans))
}

#[tracing::instrument(skip(service))]
async fn get_plan(
    State(service): State<PlanService>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<MembershipPlan>, ServiceError> {
    let plan = service.get_plan(plan_id).await?;
    Ok(Json(plan))
}

#[tracing::instrument(skip(service, plan))]
async fn create_plan(
    State(service): State<PlanService>,
    Json(plan): Json<CreatePlan>,
) -> Result<Json<MembershipPlan>, ServiceError> {
    let created = service.create_plan(plan).await?;
    Ok(Json(created))
}

#[tracing::instrument(skip(service, plan))]
async fn update_plan(
    State(service): State<PlanService>,
    Path(plan_id): Path<Uuid>,
    Json(plan): Json<UpdatePlan>,
) -> Result<Json<MembershipPlan>, ServiceError> {
    let updated = service.update_plan(plan_id, plan).await?;
    Ok(Json(updated))
}

#[tracing::instrument(skip(service))]
async fn delete_plan(
    State(service): State<PlanService>,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    service.delete_plan(plan_id).await?;
    Ok(Json(serde_json::json!({ "message": "Plan deleted" })))
}
