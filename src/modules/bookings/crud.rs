use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::config::DbPool;
use crate::modules::catalog::crud::CatalogCrud;
use crate::services::booking_code::generate_booking_code;

use super::model::{BookingRow, BookingStatus};
use super::schema::CreateBookingRequest;

// =============================================================================
// BOOKING ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    InvalidSchedule(&'static str),
    #[error("Service is not available for booking")]
    ServiceUnavailable,
    #[error("Provider is not available for the selected schedule.")]
    ScheduleConflict,
    #[error("Provider profile not found for this account")]
    ProviderProfileMissing,
    #[error("Unknown booking status filter")]
    InvalidStatusFilter,
    #[error("Booking not found")]
    NotFound,
    #[error("Could not allocate a booking code")]
    CodeExhausted,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidSchedule(_) => "BOOKING_INVALID_SCHEDULE",
            BookingError::ServiceUnavailable => "BOOKING_SERVICE_UNAVAILABLE",
            BookingError::ScheduleConflict => "BOOKING_SCHEDULE_CONFLICT",
            BookingError::ProviderProfileMissing => "BOOKING_PROVIDER_PROFILE_MISSING",
            BookingError::InvalidStatusFilter => "BOOKING_INVALID_STATUS_FILTER",
            BookingError::NotFound => "BOOKING_NOT_FOUND",
            BookingError::CodeExhausted | BookingError::Database(_) => "UNEXPECTED_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::InvalidSchedule(_)
            | BookingError::ProviderProfileMissing
            | BookingError::InvalidStatusFilter => StatusCode::BAD_REQUEST,
            BookingError::ServiceUnavailable | BookingError::NotFound => StatusCode::NOT_FOUND,
            BookingError::ScheduleConflict => StatusCode::CONFLICT,
            BookingError::CodeExhausted | BookingError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Two racing creates for the same window can take compatible gap locks on
/// the empty range and then deadlock on insert. InnoDB kills one of them
/// (1213, or 1205 on lock wait timeout); for the losing request that is a
/// schedule conflict, not a server fault.
fn map_lock_contention(err: sqlx::Error) -> BookingError {
    if let sqlx::Error::Database(ref db_err) = err {
        if let Some(mysql_err) = db_err.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
            if mysql_err.number() == 1213 || mysql_err.number() == 1205 {
                return BookingError::ScheduleConflict;
            }
        }
    }
    BookingError::Database(err)
}

// =============================================================================
// SCHEDULE + PRICING (pure)
// =============================================================================

/// RFC 3339 in, UTC out. Start must precede end and sit in the future.
pub fn validate_schedule(
    start: &str,
    end: &str,
) -> Result<(DateTime<Utc>, DateTime<Utc>), BookingError> {
    let start = DateTime::parse_from_rfc3339(start)
        .map_err(|_| BookingError::InvalidSchedule("Invalid scheduledStart timestamp"))?
        .with_timezone(&Utc);
    let end = DateTime::parse_from_rfc3339(end)
        .map_err(|_| BookingError::InvalidSchedule("Invalid scheduledEnd timestamp"))?
        .with_timezone(&Utc);

    if start >= end {
        return Err(BookingError::InvalidSchedule(
            "Scheduled start must be before scheduled end",
        ));
    }
    if start <= Utc::now() {
        return Err(BookingError::InvalidSchedule(
            "Scheduled start must be in the future",
        ));
    }

    Ok((start, end))
}

pub struct Pricing {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Each component is rounded to 2dp before the next is derived, so the
/// stored total always equals subtotal + tax exactly.
pub fn compute_pricing(base_price: Decimal, tax_rate: Decimal) -> Pricing {
    let subtotal = base_price.round_dp(2);
    let tax = (subtotal * tax_rate / Decimal::from(100)).round_dp(2);
    let total = (subtotal + tax).round_dp(2);
    Pricing {
        subtotal,
        tax,
        total,
    }
}

// =============================================================================
// BOOKING CRUD
// =============================================================================

const ROW_SELECT: &str = r#"
    SELECT b.id, b.booking_code, b.customer_id, b.provider_id, b.service_id,
           s.title AS service_title, sp.business_name,
           cu.email AS customer_email, cu.phone AS customer_phone,
           cp.first_name AS customer_first_name, cp.last_name AS customer_last_name,
           b.scheduled_start, b.scheduled_end,
           b.address_line1, b.address_line2, b.city, b.state, b.country, b.postal_code,
           b.lat, b.lng, b.status, b.payment_status,
           b.subtotal, b.tax, b.total_amount, b.created_at
    FROM bookings b
    JOIN services s ON b.service_id = s.id
    JOIN service_providers sp ON b.provider_id = sp.id
    JOIN users cu ON b.customer_id = cu.id
    LEFT JOIN user_profiles cp ON cp.user_id = cu.id
"#;

const CODE_ATTEMPTS: usize = 10;

pub struct BookingCrud {
    pool: DbPool,
}

impl BookingCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // CREATE
    // =========================================================================

    pub async fn create_booking(
        &self,
        customer_id: u64,
        req: &CreateBookingRequest,
    ) -> Result<BookingRow, BookingError> {
        let (start, end) = validate_schedule(&req.scheduled_start, &req.scheduled_end)?;

        let service = CatalogCrud::new(self.pool.clone())
            .find_bookable_service(req.service_id)
            .await?
            .ok_or(BookingError::ServiceUnavailable)?;

        let pricing = compute_pricing(service.base_price, service.tax_rate);

        let mut tx = self.pool.begin().await?;

        // Lock the provider's overlapping bookings for the life of the
        // transaction. Two racing requests for the same window serialize
        // here; the loser sees the winner's committed row.
        let conflict: Option<(u64,)> = sqlx::query_as(
            r#"
            SELECT id FROM bookings
            WHERE provider_id = ?
              AND status IN ('pending', 'confirmed', 'in_progress')
              AND scheduled_start < ?
              AND scheduled_end > ?
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(service.provider_id)
        .bind(end)
        .bind(start)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_lock_contention)?;

        if conflict.is_some() {
            return Err(BookingError::ScheduleConflict);
        }

        let booking_code = self.allocate_code(&mut tx).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO bookings (
                booking_code, customer_id, provider_id, service_id,
                scheduled_start, scheduled_end,
                address_line1, address_line2, city, state, country, postal_code,
                lat, lng, subtotal, tax, total_amount
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&booking_code)
        .bind(customer_id)
        .bind(service.provider_id)
        .bind(service.id)
        .bind(start)
        .bind(end)
        .bind(&req.address_line1)
        .bind(&req.address_line2)
        .bind(&req.city)
        .bind(&req.state)
        .bind(&req.country)
        .bind(&req.postal_code)
        .bind(req.lat.and_then(Decimal::from_f64))
        .bind(req.lng.and_then(Decimal::from_f64))
        .bind(pricing.subtotal)
        .bind(pricing.tax)
        .bind(pricing.total)
        .execute(&mut *tx)
        .await
        .map_err(map_lock_contention)?;

        let booking_id = result.last_insert_id();
        tx.commit().await?;

        tracing::info!(
            booking_id,
            provider_id = service.provider_id,
            "Booking created"
        );

        self.fetch_row(booking_id).await?.ok_or(BookingError::NotFound)
    }

    async fn allocate_code(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    ) -> Result<String, BookingError> {
        for _ in 0..CODE_ATTEMPTS {
            let candidate = generate_booking_code();
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE booking_code = ?")
                    .bind(&candidate)
                    .fetch_one(&mut **tx)
                    .await?;
            if count == 0 {
                return Ok(candidate);
            }
        }
        tracing::error!(
            attempts = CODE_ATTEMPTS,
            "Booking code space exhausted after repeated collisions"
        );
        Err(BookingError::CodeExhausted)
    }

    async fn fetch_row(&self, booking_id: u64) -> Result<Option<BookingRow>, sqlx::Error> {
        sqlx::query_as::<_, BookingRow>(&format!("{ROW_SELECT} WHERE b.id = ?"))
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
    }

    // =========================================================================
    // READS (owner-scoped)
    // =========================================================================

    pub async fn find_for_customer(
        &self,
        booking_id: u64,
        customer_id: u64,
    ) -> Result<Option<BookingRow>, sqlx::Error> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "{ROW_SELECT} WHERE b.id = ? AND b.customer_id = ?"
        ))
        .bind(booking_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_for_provider(
        &self,
        booking_id: u64,
        provider_id: u64,
    ) -> Result<Option<BookingRow>, sqlx::Error> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "{ROW_SELECT} WHERE b.id = ? AND b.provider_id = ?"
        ))
        .bind(booking_id)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_for_customer(
        &self,
        customer_id: u64,
        status: Option<BookingStatus>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<BookingRow>, u64), sqlx::Error> {
        self.list_by_owner("b.customer_id", customer_id, status, page, page_size)
            .await
    }

    pub async fn list_for_provider(
        &self,
        provider_id: u64,
        status: Option<BookingStatus>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<BookingRow>, u64), sqlx::Error> {
        self.list_by_owner("b.provider_id", provider_id, status, page, page_size)
            .await
    }

    async fn list_by_owner(
        &self,
        owner_column: &str,
        owner_id: u64,
        status: Option<BookingStatus>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<BookingRow>, u64), sqlx::Error> {
        let status_clause = if status.is_some() {
            " AND b.status = ?"
        } else {
            ""
        };
        let offset = u64::from(page - 1) * u64::from(page_size);

        let count_sql = format!(
            "SELECT COUNT(*) FROM bookings b WHERE {owner_column} = ?{status_clause}"
        );
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql).bind(owner_id);
        if let Some(status) = status {
            count_query = count_query.bind(status.as_str());
        }
        let (total,) = count_query.fetch_one(&self.pool).await?;

        let rows_sql = format!(
            "{ROW_SELECT} WHERE {owner_column} = ?{status_clause} \
             ORDER BY b.created_at DESC, b.id DESC LIMIT ? OFFSET ?"
        );
        let mut rows_query = sqlx::query_as::<_, BookingRow>(&rows_sql).bind(owner_id);
        if let Some(status) = status {
            rows_query = rows_query.bind(status.as_str());
        }
        let rows = rows_query
            .bind(page_size)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total as u64))
    }
}
