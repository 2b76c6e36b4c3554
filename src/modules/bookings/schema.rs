use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::{BookingRow, BookingStatus, PaymentStatus};

// =============================================================================
// CREATE
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(range(min = 1, message = "Service id is required"))]
    pub service_id: u64,
    #[validate(length(min = 1, message = "Scheduled start is required"))]
    pub scheduled_start: String,
    #[validate(length(min = 1, message = "Scheduled end is required"))]
    pub scheduled_end: String,
    #[validate(length(min = 1, max = 255, message = "Address line 1 is required"))]
    pub address_line1: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "Address line 2 is too long"))]
    pub address_line2: Option<String>,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
    #[validate(length(min = 1, max = 30, message = "Postal code is required"))]
    pub postal_code: String,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub lat: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub lng: Option<f64>,
}

// =============================================================================
// LIST
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

impl ListBookingsQuery {
    /// Out-of-range values clamp instead of erroring.
    pub fn pagination(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(total: u64, page: u32, page_size: u32) -> Self {
        Self {
            total,
            page,
            page_size,
            // An empty result set still reports one page.
            total_pages: (total.div_ceil(page_size as u64)).max(1),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub data: Vec<BookingResponse>,
    pub meta: PaginationMeta,
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Customer contact details, exposed only on provider-facing reads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
    pub email: String,
    pub phone: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: u64,
    pub booking_code: String,
    pub customer_id: u64,
    pub provider_id: u64,
    pub service_id: u64,
    pub service_title: String,
    pub business_name: String,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<Decimal>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerContact>,
}

impl BookingResponse {
    /// Provider-facing view: same booking plus the customer contact block.
    pub fn provider_view(row: BookingRow) -> Self {
        let contact = CustomerContact {
            email: row.customer_email.clone(),
            phone: row.customer_phone.clone(),
            first_name: row.customer_first_name.clone(),
            last_name: row.customer_last_name.clone(),
        };
        let mut response = Self::from(row);
        response.customer = Some(contact);
        response
    }
}

impl From<BookingRow> for BookingResponse {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            booking_code: row.booking_code,
            customer_id: row.customer_id,
            provider_id: row.provider_id,
            service_id: row.service_id,
            service_title: row.service_title,
            business_name: row.business_name,
            scheduled_start: row.scheduled_start,
            scheduled_end: row.scheduled_end,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            city: row.city,
            state: row.state,
            country: row.country,
            postal_code: row.postal_code,
            lat: row.lat,
            lng: row.lng,
            status: row.status,
            payment_status: row.payment_status,
            subtotal: row.subtotal,
            tax: row.tax,
            total_amount: row.total_amount,
            created_at: row.created_at,
            customer: None,
        }
    }
}
