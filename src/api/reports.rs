use axum::{
    extract::{Query, State},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::admin_only_middleware;
use crate::models::{DashboardReport, MonthlyReport};
use crate::services::{ReportService, ServiceError};

#[derive(Debug, Deserialize)]
struct MonthQuery {
    year: Option<i32>,
    month: Option<u32>,
}

/// Reporting endpoints, admin-only.
pub fn report_routes(db: PgPool) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/monthly", get(monthly))
        .route_layer(middleware::from_fn(admin_only_middleware))
        .with_state(ReportService::new(db))
}

#[tracing::instrument(skip(service))]
async fn dashboard(
    State(service): State<ReportService>,
) -> Result<Json<DashboardReport>, ServiceError> {
    let report = service.dashboard().await?;
    Ok(Json(report))
}

/// Monthly figures with a previous-month comparison. Defaults to the
/// current calendar month.
#[tracing::instrument(skip(service))]
async fn monthly(
    State(service): State<ReportService>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyReport>, ServiceError> {
    let report = match (query.year, query.month) {
        (Some(year), Some(month)) => service.monthly_report(year, month).await?,
        (None, None) => service.current_monthly_report().await?,
        _ => {
            return Err(ServiceError::Validation(
                "Provide both year and month, or neither".into(),
            ))
        }
    };
    Ok(Json(report))
}
