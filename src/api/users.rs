use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::PaginationQuery;
use crate::models::{CreateUser, UpdateUser, UserResponse};
use crate::services::{ServiceError, UserService};

/// User administration. The whole area is mounted behind the admin
/// gate in `routes`.
pub fn user_routes(db: PgPool) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .with_state(UserService::new(db))
}

#[tracing::instrument(skip(service))]
async fn list_users(
    State(service): State<UserService>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Vec<UserResponse>>, ServiceError> {
    pagination.validate().map_err(ServiceError::validation)?;
    let users = service
        .list_users(pagination.get_limit(), pagination.get_offset())
        .await?;
    Ok(Json(users))
}

#[tracing::instrument(skip(service, user))]
async fn create_user(
    State(service): State<UserService>,
    Json(user): Json<CreateUser>,
) -> Result<Json<UserResponse>, ServiceError> {
    let created = service.create_user(user).await?;
    Ok(Json(created))
}

#[tracing::instrument(skip(service))]
async fn get_user(
    State(service): State<UserService>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ServiceError> {
    let user = service.get_user_by_id(user_id).await?;
    Ok(Json(user))
}

#[tracing::instrument(skip(service, user))]
async fn update_user(
    State(service): State<UserService>,
    Path(user_id): Path<Uuid>,
    Json(user): Json<UpdateUser>,
) -> Result<Json<UserResponse>, ServiceError> {
    let updated = service.update_user(user_id, user).await?;
    Ok(Json(updated))
}

#[tracing::instrument(skip(service))]
async fn delete_user(
    State(service): State<UserService>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    service.delete_user(user_id).await?;
    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}
