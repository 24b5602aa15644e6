use axum::{middleware, routing::get, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use super::auth::auth_routes;
use super::classes::class_routes;
use super::health::health_check;
use super::members::member_routes;
use super::payments::payment_routes;
use super::plans::plan_routes;
use super::reports::report_routes;
use super::trainers::trainer_routes;
use super::users::user_routes;
use crate::auth::{
    admin_only_middleware, cors_layer, jwt_auth_middleware, security_headers_layer, AuthService,
};

pub fn create_routes(db: PgPool, jwt_secret: &str) -> Router {
    let auth_service = AuthService::new(db.clone(), jwt_secret);

    // Everything below requires a valid access token; role gates are
    // applied inside each area (or here for fully admin-only areas).
    let protected = Router::new()
        .nest(
            "/users",
            user_routes(db.clone()).route_layer(middleware::from_fn(admin_only_middleware)),
        )
        .nest("/plans", plan_routes(db.clone()))
        .nest("/members", member_routes(db.clone()))
        .nest("/trainers", trainer_routes(db.clone()))
        .nest("/classes", class_routes(db.clone()))
        .nest("/payments", payment_routes(db.clone()))
        .nest("/reports", report_routes(db))
        .route_layer(middleware::from_fn_with_state(
            auth_service.clone(),
            jwt_auth_middleware,
        ));

    let api = Router::new()
        .nest("/auth", auth_routes(auth_service))
        .merge(protected);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(security_headers_layer())
}
