use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::modules::auth::schema::ErrorResponse;
use crate::modules::users::model::Role;
use crate::AppState;

/// Identity proven by a bearer access token. Verification is purely
/// cryptographic; no database round trip happens here.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: u64,
    pub role: Role,
}

impl AuthUser {
    /// Role gate for handlers restricted to a role subset.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::with_message("AUTH_FORBIDDEN", "Forbidden")),
            ))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let token = header_value.strip_prefix("Bearer ").ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::with_message(
                "AUTH_TOKEN_MISSING",
                "Authentication token missing",
            )),
        ))?;

        let data = state.jwt_service.verify_access_token(token).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::with_message(
                    "AUTH_INVALID_TOKEN",
                    "Invalid or expired token",
                )),
            )
        })?;

        let user_id = data.claims.sub.parse::<u64>().map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::with_message(
                    "AUTH_INVALID_TOKEN",
                    "Invalid or expired token",
                )),
            )
        })?;

        Ok(AuthUser {
            user_id,
            role: data.claims.role,
        })
    }
}
