use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PriceUnit {
    PerHour,
    PerJob,
    PerDay,
}

/// A service as the booking engine sees it: only rows whose service is
/// active and whose owning user is active qualify.
#[derive(Debug, Clone, FromRow)]
pub struct BookableService {
    pub id: u64,
    pub provider_id: u64,
    pub category_id: u64,
    pub title: String,
    pub base_price: Decimal,
    pub tax_rate: Decimal,
    pub price_unit: PriceUnit,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProviderRecord {
    pub id: u64,
    pub user_id: u64,
    pub business_name: String,
}
