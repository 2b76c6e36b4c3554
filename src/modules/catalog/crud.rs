use crate::config::DbPool;

use super::model::{BookableService, ProviderRecord};

/// Read model over the service catalog. The booking engine only reads from
/// here; catalog management is owned elsewhere.
pub struct CatalogCrud {
    pool: DbPool,
}

impl CatalogCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_bookable_service(
        &self,
        service_id: u64,
    ) -> Result<Option<BookableService>, sqlx::Error> {
        sqlx::query_as::<_, BookableService>(
            r#"
            SELECT s.id, s.provider_id, s.category_id, s.title,
                   s.base_price, s.tax_rate, s.price_unit
            FROM services s
            JOIN service_providers sp ON s.provider_id = sp.id
            JOIN users u ON sp.user_id = u.id
            WHERE s.id = ? AND s.is_active = TRUE AND u.status = 'active'
            "#,
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_provider_by_user_id(
        &self,
        user_id: u64,
    ) -> Result<Option<ProviderRecord>, sqlx::Error> {
        sqlx::query_as::<_, ProviderRecord>(
            "SELECT id, user_id, business_name FROM service_providers WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
