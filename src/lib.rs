pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::{AppEnv, DbPool};
use modules::auth::auth_routes;
use modules::bookings::{booking_routes, provider_booking_routes};
use modules::users::user_routes;
use services::google::GoogleTokenVerifier;
use services::jwt::JwtService;
use services::rate_limit::{create_rate_limiter, RateLimitLayer};
use services::security::security_headers;

pub struct AppState {
    pub db: DbPool,
    pub jwt_service: JwtService,
    pub app_env: AppEnv,
    // None when Google sign-in is not configured; /auth/google answers 503.
    pub google_verifier: Option<Arc<dyn GoogleTokenVerifier>>,
}

pub async fn create_app(
    db: DbPool,
    jwt_service: JwtService,
    app_env: AppEnv,
    google_verifier: Option<Arc<dyn GoogleTokenVerifier>>,
) -> Router {
    let state = Arc::new(AppState {
        db,
        jwt_service,
        app_env,
        google_verifier,
    });

    // Steady 60/min with burst headroom for page loads
    let rate_limiter = create_rate_limiter(60, 500);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/bookings", booking_routes())
        .nest("/provider/bookings", provider_booking_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(RateLimitLayer::new(rate_limiter))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "LocalServe API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
