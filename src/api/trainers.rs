use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::admin_only_middleware;
use crate::models::{
    ClassResponse, CreateTrainer, SpecializationCount, TrainerRow, TrainerStats, UpdateTrainer,
};
use crate::services::{ClassService, ServiceError, TrainerService};

#[derive(Clone)]
struct TrainersState {
    trainers: TrainerService,
    classes: ClassService,
}

#[derive(Debug, Deserialize)]
struct TopQuery {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SpecializationQuery {
    specialization: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
struct RateRangeQuery {
    min: Decimal,
    max: Decimal,
}

/// Trainer directory. Reads are open to any authenticated user,
/// mutations are admin-only.
pub fn trainer_routes(db: PgPool) -> Router {
    let state = TrainersState {
        trainers: TrainerService::new(db.clone()),
        classes: ClassService::new(db),
    };

    let admin = Router::new()
        .route("/", post(create_trainer))
        .route("/:id", put(update_trainer).delete(delete_trainer))
        .route_layer(middleware::from_fn(admin_only_middleware));

    Router::new()
        .route("/", get(list_trainers))
        .route("/search", get(search_trainers))
        .route("/rate-range", get(trainers_by_rate_range))
        .route("/top", get(top_trainers))
        .route("/stats", get(trainer_stats))
        .route("/specializations", get(specialization_distribution))
        .route("/:id", get(get_trainer))
        .route("/:id/classes", get(trainer_classes))
        .merge(admin)
        .with_state(state)
}

#[tracing::instrument(skip(state))]
async fn list_trainers(
    State(state): State<TrainersState>,
    Query(query): Query<SpecializationQuery>,
) -> Result<Json<Vec<TrainerRow>>, ServiceError> {
    let trainers = match query.specialization {
        Some(specialization) => {
            state
                .trainers
                .trainers_by_specialization(&specialization)
                .await?
        }
        None => state.trainers.list_trainers().await?,
    };
    Ok(Json(trainers))
}

#[tracing::instrument(skip(state))]
async fn search_trainers(
    State(state): State<TrainersState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<TrainerRow>>, ServiceError> {
    let trainers = state.trainers.search_trainers(&query.q).await?;
    Ok(Json(trainers))
}

#[tracing::instrument(skip(state))]
async fn trainers_by_rate_range(
    State(state): State<TrainersState>,
    Query(query): Query<RateRangeQuery>,
) -> Result<Json<Vec<TrainerRow>>, ServiceError> {
    let trainers = state
        .trainers
        .trainers_by_rate_range(query.min, query.max)
        .await?;
    Ok(Json(trainers))
}

#[tracing::instrument(skip(state))]
async fn top_trainers(
    State(state): State<TrainersState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<TrainerRow>>, ServiceError> {
    let limit = query.limit.unwrap_or(5).clamp(1, 50);
    let trainers = state.trainers.top_trainers(limit).await?;
    Ok(Json(trainers))
}

#[tracing::instrument(skip(state))]
async fn trainer_stats(
    State(state): State<TrainersState>,
) -> Result<Json<TrainerStats>, ServiceError> {
    let stats = state.trainers.trainer_stats().await?;
    Ok(Json(stats))
}

#[tracing::instrument(skip(state))]
async fn specialization_distribution(
    State(state): State<TrainersState>,
) -> Result<Json<Vec<SpecializationCount>>, ServiceError> {
    let distribution = state.trainers.specialization_distribution().await?;
    Ok(Json(distribution))
}

#[tracing::instrument(skip(state))]
async fn get_trainer(
    State(state): State<TrainersState>,
    Path(trainer_id): Path<Uuid>,
) -> Result<Json<TrainerRow>, ServiceError> {
    let trainer = state.trainers.get_trainer(trainer_id).await?;
    Ok(Json(trainer))
}

#[tracing::instrument(skip(state))]
async fn trainer_classes(
    State(state): State<TrainersState>,
    Path(trainer_id): Path<Uuid>,
) -> Result<Json<Vec<ClassResponse>>, ServiceError> {
    // 404 for unknown trainers rather than an empty list.
    let _ = state.trainers.get_trainer(trainer_id).await?;
    let classes = state.classes.classes_by_trainer(trainer_id).await?;
    Ok(Json(classes.into_iter().map(ClassResponse::from).collect()))
}

#[tracing::instrument(skip(state, trainer))]
async fn create_trainer(
    State(state): State<TrainersState>,
    Json(trainer): Json<CreateTrainer>,
) -> Result<Json<TrainerRow>, ServiceError> {
    let created = state.trainers.create_trainer(trainer).await?;
    Ok(Json(created))
}

#[tracing::instrument(skip(state, trainer))]
async fn update_trainer(
    State(state): State<TrainersState>,
    Path(trainer_id): Path<Uuid>,
    Json(trainer): Json<UpdateTrainer>,
) -> Result<Json<TrainerRow>, ServiceError> {
    let updated = state.trainers.update_trainer(trainer_id, trainer).await?;
    Ok(Json(updated))
}

#[tracing::instrument(skip(state))]
async fn delete_trainer(
    State(state): State<TrainersState>,
    Path(trainer_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state.trainers.delete_trainer(trainer_id).await?;
    Ok(Json(serde_json::json!({ "message": "Trainer deleted" })))
}
