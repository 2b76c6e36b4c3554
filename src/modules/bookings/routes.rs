use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

use super::controller;

pub fn booking_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            post(controller::create_booking).get(controller::list_my_bookings),
        )
        .route("/{id}", get(controller::get_my_booking))
}

pub fn provider_booking_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(controller::list_provider_bookings))
        .route("/{id}", get(controller::get_provider_booking))
}
