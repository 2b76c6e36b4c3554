use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::modules::auth::schema::ErrorResponse;
use crate::modules::bookings::model::BookingStatus;
use crate::modules::catalog::crud::CatalogCrud;
use crate::modules::users::model::Role;
use crate::services::auth_guard::AuthUser;
use crate::AppState;

use super::crud::{BookingCrud, BookingError};
use super::schema::{
    BookingListResponse, BookingResponse, CreateBookingRequest, ListBookingsQuery, PaginationMeta,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn map_booking_error(err: BookingError) -> ApiError {
    if matches!(err, BookingError::Database(_) | BookingError::CodeExhausted) {
        tracing::error!("Booking operation failed: {}", err);
    }
    (
        err.status_code(),
        Json(ErrorResponse::with_message(err.code(), err.to_string())),
    )
}

fn db_error(err: sqlx::Error) -> ApiError {
    map_booking_error(BookingError::Database(err))
}

fn parse_status_filter(query: &ListBookingsQuery) -> Result<Option<BookingStatus>, ApiError> {
    match query.status.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => BookingStatus::parse(raw)
            .map(Some)
            .ok_or_else(|| map_booking_error(BookingError::InvalidStatusFilter)),
    }
}

/// Resolves the provider record for the authenticated provider account.
async fn provider_id_for(state: &AppState, auth: &AuthUser) -> Result<u64, ApiError> {
    auth.require_role(&[Role::Provider])?;
    let record = CatalogCrud::new(state.db.clone())
        .find_provider_by_user_id(auth.user_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| map_booking_error(BookingError::ProviderProfileMissing))?;
    Ok(record.id)
}

// =============================================================================
// CUSTOMER HANDLERS
// =============================================================================

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    auth.require_role(&[Role::Customer])?;
    payload.validate().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_message("VALIDATION_ERROR", e.to_string())),
        )
    })?;

    let crud = BookingCrud::new(state.db.clone());
    let row = crud
        .create_booking(auth.user_id, &payload)
        .await
        .map_err(map_booking_error)?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<BookingListResponse>, ApiError> {
    auth.require_role(&[Role::Customer])?;
    let status = parse_status_filter(&query)?;
    let (page, page_size) = query.pagination();

    let crud = BookingCrud::new(state.db.clone());
    let (rows, total) = crud
        .list_for_customer(auth.user_id, status, page, page_size)
        .await
        .map_err(db_error)?;

    Ok(Json(BookingListResponse {
        data: rows.into_iter().map(BookingResponse::from).collect(),
        meta: PaginationMeta::new(total, page, page_size),
    }))
}

pub async fn get_my_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(booking_id): Path<u64>,
) -> Result<Json<BookingResponse>, ApiError> {
    auth.require_role(&[Role::Customer])?;

    let crud = BookingCrud::new(state.db.clone());
    let row = crud
        .find_for_customer(booking_id, auth.user_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| map_booking_error(BookingError::NotFound))?;

    Ok(Json(row.into()))
}

// =============================================================================
// PROVIDER HANDLERS
// =============================================================================

pub async fn list_provider_bookings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<BookingListResponse>, ApiError> {
    let provider_id = provider_id_for(&state, &auth).await?;
    let status = parse_status_filter(&query)?;
    let (page, page_size) = query.pagination();

    let crud = BookingCrud::new(state.db.clone());
    let (rows, total) = crud
        .list_for_provider(provider_id, status, page, page_size)
        .await
        .map_err(db_error)?;

    Ok(Json(BookingListResponse {
        data: rows
            .into_iter()
            .map(BookingResponse::provider_view)
            .collect(),
        meta: PaginationMeta::new(total, page, page_size),
    }))
}

pub async fn get_provider_booking(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(booking_id): Path<u64>,
) -> Result<Json<BookingResponse>, ApiError> {
    let provider_id = provider_id_for(&state, &auth).await?;

    let crud = BookingCrud::new(state.db.clone());
    let row = crud
        .find_for_provider(booking_id, provider_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| map_booking_error(BookingError::NotFound))?;

    Ok(Json(BookingResponse::provider_view(row)))
}
