use axum::{routing::get, Router};
use std::sync::Arc;

use crate::AppState;

use super::controller;

pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(controller::me))
}
