use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use crate::AppState;

use super::crud::{AuthCrud, AuthError, SessionResult};
use super::schema::{
    ErrorResponse, ForgotPasswordRequest, ForgotPasswordResponse, GoogleLoginRequest,
    LoginRequest, LogoutRequest, MessageResponse, RefreshTokenRequest, RegisterRequest,
    ResetPasswordRequest, SessionResponse,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn map_auth_error(err: AuthError) -> ApiError {
    if matches!(
        err,
        AuthError::Database(_) | AuthError::Hashing(_) | AuthError::Token(_)
    ) {
        tracing::error!("Auth operation failed: {}", err);
    }
    (
        err.status_code(),
        Json(ErrorResponse::with_message(err.code(), err.to_string())),
    )
}

fn validation_error(err: validator::ValidationErrors) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::with_message("VALIDATION_ERROR", err.to_string())),
    )
}

fn session_response(result: SessionResult) -> SessionResponse {
    SessionResponse {
        access_token: result.tokens.access_token,
        refresh_token: result.tokens.refresh_token,
        token_type: "Bearer",
        expires_in: result.tokens.expires_in,
        user: result.user.into(),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    payload.validate().map_err(validation_error)?;

    let crud = AuthCrud::new(state.db.clone(), &state.jwt_service);
    let result = crud.register(&payload).await.map_err(map_auth_error)?;

    tracing::info!(user_id = result.user.id, "User registered");

    Ok((StatusCode::CREATED, Json(session_response(result))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    payload.validate().map_err(validation_error)?;

    let crud = AuthCrud::new(state.db.clone(), &state.jwt_service);
    let result = crud
        .login(&payload.identifier, &payload.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(session_response(result)))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let crud = AuthCrud::new(state.db.clone(), &state.jwt_service);
    let result = crud
        .refresh(&payload.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(session_response(result)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LogoutRequest>,
) -> StatusCode {
    let crud = AuthCrud::new(state.db.clone(), &state.jwt_service);
    crud.logout(payload.refresh_token.as_deref()).await;

    StatusCode::NO_CONTENT
}

pub async fn google_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GoogleLoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    payload.validate().map_err(validation_error)?;

    let verifier = state
        .google_verifier
        .as_ref()
        .ok_or_else(|| map_auth_error(AuthError::GoogleDisabled))?;

    let crud = AuthCrud::new(state.db.clone(), &state.jwt_service);
    let result = crud
        .login_with_google(verifier.as_ref(), &payload.credential)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(session_response(result)))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    payload.validate().map_err(validation_error)?;

    let crud = AuthCrud::new(state.db.clone(), &state.jwt_service);
    let raw_token = crud
        .request_password_reset(&payload.identifier)
        .await
        .map_err(map_auth_error)?;

    // Identical reply whether or not the account exists; the token is only
    // echoed back in development for end-to-end testing.
    Ok(Json(ForgotPasswordResponse {
        message: "If the account exists, a reset link has been sent.",
        reset_token: raw_token.filter(|_| state.app_env.is_development()),
    }))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.validate().map_err(validation_error)?;

    let crud = AuthCrud::new(state.db.clone(), &state.jwt_service);
    crud.reset_password(&payload.token, &payload.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(MessageResponse {
        message: "Password has been reset. Please log in again.",
    }))
}
