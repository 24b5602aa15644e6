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

use crate::auth::{admin_only_middleware, staff_only_middleware, UserRole, UserSession};
use crate::models::{
    BookClassRequest, BookingStatus, ClassBooking, ClassResponse, ClassStats, ClassStatus,
    CreateClass, GymClassRow, RosterEntry, UpdateClass,
};
use crate::services::{
    BookingService, ClassService, MemberService, ServiceError, TrainerService,
};

#[derive(Clone)]
struct ClassesState {
    classes: ClassService,
    bookings: BookingService,
    members: MemberService,
    trainers: TrainerService,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
struct PopularQuery {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DateRangeQuery {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct AttendanceRequest {
    status: BookingStatus,
}

/// Class catalog and the booking flow. The catalog is readable by any
/// authenticated user; class management is admin-only; rosters and
/// attendance are staff-only.
pub fn class_routes(db: PgPool) -> Router {
    let state = ClassesState {
        classes: ClassService::new(db.clone()),
        bookings: BookingService::new(db.clone()),
        members: MemberService::new(db.clone()),
        trainers: TrainerService::new(db),
    };

    let staff = Router::new()
        .route("/:id/bookings/roster", get(class_roster))
        .route("/:id/bookings/:member_id/status", put(mark_attendance))
        .route_layer(middleware::from_fn(staff_only_middleware));

    let admin = Router::new()
        .route("/", post(create_class))
        .route("/stats", get(class_stats))
        .route("/refresh-statuses", post(refresh_statuses))
        .route("/:id", put(update_class).delete(delete_class))
        .route("/:id/cancel", post(cancel_class))
        .route_layer(middleware::from_fn(admin_only_middleware));

    Router::new()
        .route("/", get(list_classes))
        .route("/search", get(search_classes))
        .route("/available", get(available_classes))
        .route("/popular", get(popular_classes))
        .route("/schedule", get(classes_between))
        .route("/status/:status", get(classes_by_status))
        .route("/my-bookings", get(my_booked_classes))
        .route("/:id", get(get_class))
        .route("/:id/bookings", post(book_class))
        .route("/:id/bookings/:member_id", axum::routing::delete(cancel_booking))
        .merge(staff)
        .merge(admin)
        .with_state(state)
}

#[tracing::instrument(skip(state))]
async fn list_classes(
    State(state): State<ClassesState>,
) -> Result<Json<Vec<ClassResponse>>, ServiceError> {
    let classes = state.classes.list_classes().await?;
    Ok(Json(with_spots(classes)))
}

#[tracing::instrument(skip(state))]
async fn search_classes(
    State(state): State<ClassesState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ClassResponse>>, ServiceError> {
    let classes = state.classes.search_classes(&query.q).await?;
    Ok(Json(with_spots(classes)))
}

/// Open spots in upcoming classes. Members see only classes they have
/// not booked yet.
#[tracing::instrument(skip(state))]
async fn available_classes(
    State(state): State<ClassesState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<Vec<ClassResponse>>, ServiceError> {
    let classes = if session.role == UserRole::Member {
        let member_id = state.members.member_id_for_user(session.user_id).await?;
        state.bookings.available_classes_for_member(member_id).await?
    } else {
        state.classes.available_classes().await?
    };
    Ok(Json(with_spots(classes)))
}

#[tracing::instrument(skip(state))]
async fn popular_classes(
    State(state): State<ClassesState>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<ClassResponse>>, ServiceError> {
    let limit = query.limit.unwrap_or(5).clamp(1, 50);
    let classes = state.classes.popular_classes(limit).await?;
    Ok(Json(with_spots(classes)))
}

#[tracing::instrument(skip(state))]
async fn classes_between(
    State(state): State<ClassesState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<ClassResponse>>, ServiceError> {
    if query.to < query.from {
        return Err(ServiceError::Validation(
            "Range end must not precede its start".into(),
        ));
    }
    let classes = state.classes.classes_between(query.from, query.to).await?;
    Ok(Json(with_spots(classes)))
}

#[tracing::instrument(skip(state))]
async fn classes_by_status(
    State(state): State<ClassesState>,
    Path(status): Path<ClassStatus>,
) -> Result<Json<Vec<ClassResponse>>, ServiceError> {
    let classes = state.classes.classes_by_status(status).await?;
    Ok(Json(with_spots(classes)))
}

/// Classes the calling member holds a booking for
#[tracing::instrument(skip(state))]
async fn my_booked_classes(
    State(state): State<ClassesState>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<Vec<ClassResponse>>, ServiceError> {
    let member_id = state.members.member_id_for_user(session.user_id).await?;
    let classes = state.bookings.member_classes(member_id).await?;
    Ok(Json(with_spots(classes)))
}

#[tracing::instrument(skip(state))]
async fn get_class(
    State(state): State<ClassesState>,
    Path(class_id): Path<Uuid>,
) -> Result<Json<ClassResponse>, ServiceError> {
    let class = state.classes.get_class(class_id).await?;
    Ok(Json(class.into()))
}

#[tracing::instrument(skip(state, request))]
async fn book_class(
    State(state): State<ClassesState>,
    Path(class_id): Path<Uuid>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<BookClassRequest>,
) -> Result<Json<ClassBooking>, ServiceError> {
    let member_id = match session.role {
        UserRole::Admin => request.member_id.ok_or_else(|| {
            ServiceError::Validation("member_id is required when booking on behalf".into())
        })?,
        UserRole::Member => {
            let own = state.members.member_id_for_user(session.user_id).await?;
            if matches!(request.member_id, Some(requested) if requested != own) {
                return Err(ServiceError::Forbidden(
                    "Members can only book for themselves",
                ));
            }
            own
        }
        UserRole::Trainer => {
            return Err(ServiceError::Forbidden("Trainers cannot book classes"))
        }
    };

    let booking = state.bookings.book_class(class_id, member_id).await?;
    Ok(Json(booking))
}

#[tracing::instrument(skip(state))]
async fn cancel_booking(
    State(state): State<ClassesState>,
    Path((class_id, member_id)): Path<(Uuid, Uuid)>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    if session.role != UserRole::Admin {
        let own = state.members.member_id_for_user(session.user_id).await?;
        if own != member_id {
            return Err(ServiceError::Forbidden(
                "Members can only cancel their own bookings",
            ));
        }
    }

    state.bookings.cancel_booking(class_id, member_id).await?;
    Ok(Json(serde_json::json!({ "message": "Booking cancelled" })))
}

/// Booked members for a class. Trainers only see rosters for their own
/// classes.
#[tracing::instrument(skip(state))]
async fn class_roster(
    State(state): State<ClassesState>,
    Path(class_id): Path<Uuid>,
    Extension(session): Extension<UserSession>,
) -> Result<Json<Vec<RosterEntry>>, ServiceError> {
    let class = state.classes.get_class(class_id).await?;
    ensure_staff_owns_class(&state, &session, &class).await?;

    let roster = state.bookings.class_roster(class_id).await?;
    Ok(Json(roster))
}

#[tracing::instrument(skip(state, request))]
async fn mark_attendance(
    State(state): State<ClassesState>,
    Path((class_id, member_id)): Path<(Uuid, Uuid)>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<AttendanceRequest>,
) -> Result<Json<ClassBooking>, ServiceError> {
    let class = state.classes.get_class(class_id).await?;
    ensure_staff_owns_class(&state, &session, &class).await?;

    let booking = state
        .bookings
        .set_booking_status(class_id, member_id, request.status)
        .await?;
    Ok(Json(booking))
}

fn with_spots(classes: Vec<GymClassRow>) -> Vec<ClassResponse> {
    classes.into_iter().map(ClassResponse::from).collect()
}

async fn ensure_staff_owns_class(
    state: &ClassesState,
    session: &UserSession,
    class: &GymClassRow,
) -> Result<(), ServiceError> {
    if session.role == UserRole::Trainer {
        let trainer_id = state.trainers.trainer_id_for_user(session.user_id).await?;
        if class.trainer_id != trainer_id {
            return Err(ServiceError::Forbidden(
                "Trainers can only access their own classes",
            ));
        }
    }
    Ok(())
}

#[tracing::instrument(skip(state, class))]
async fn create_class(
    State(state): State<ClassesState>,
    Json(class): Json<CreateClass>,
) -> Result<Json<ClassResponse>, ServiceError> {
    let created = state.classes.create_class(class).await?;
    Ok(Json(created.into()))
}

#[tracing::instrument(skip(state, class))]
async fn update_class(
    State(state): State<ClassesState>,
    Path(class_id): Path<Uuid>,
    Json(class): Json<UpdateClass>,
) -> Result<Json<ClassResponse>, ServiceError> {
    let updated = state.classes.update_class(class_id, class).await?;
    Ok(Json(updated.into()))
}

#[tracing::instrument(skip(state))]
async fn delete_class(
    State(state): State<ClassesState>,
    Path(class_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state.classes.delete_class(class_id).await?;
    Ok(Json(serde_json::json!({ "message": "Class deleted" })))
}

#[tracing::instrument(skip(state))]
async fn cancel_class(
    State(state): State<ClassesState>,
    Path(class_id): Path<Uuid>,
) -> Result<Json<ClassResponse>, ServiceError> {
    let cancelled = state.classes.cancel_class(class_id).await?;
    Ok(Json(cancelled.into()))
}

#[tracing::instrument(skip(state))]
async fn refresh_statuses(
    State(state): State<ClassesState>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let updated = state.classes.refresh_class_statuses().await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

#[tracing::instrument(skip(state))]
async fn class_stats(
    State(state): State<ClassesState>,
) -> Result<Json<ClassStats>, ServiceError> {
    let stats = state.classes.class_stats().await?;
    Ok(Json(stats))
}
