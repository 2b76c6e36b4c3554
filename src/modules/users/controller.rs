use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::modules::auth::schema::ErrorResponse;
use crate::services::auth_guard::AuthUser;
use crate::AppState;

use super::crud::UserCrud;
use super::schema::UserResponse;

pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, (StatusCode, Json<ErrorResponse>)> {
    let crud = UserCrud::new(state.db.clone());

    let view = crud
        .find_view_by_id(auth.user_id)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_message("UNEXPECTED_ERROR", e.to_string())),
            )
        })?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::with_message("USER_NOT_FOUND", "User not found")),
        ))?;

    Ok(Json(view.into()))
}
