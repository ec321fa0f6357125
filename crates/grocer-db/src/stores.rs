//! Read operations for the `stores` table.

use chrono::{DateTime, Utc};
use grocer_core::LocatedEntity;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::located::coordinate;

/// A row from the `stores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: Uuid,
    pub owner_account_id: Option<Uuid>,
    pub name: String,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreRow {
    /// Wrap the row for proximity ranking, carrying itself as the payload.
    #[must_use]
    pub fn into_located(self) -> LocatedEntity<StoreRow> {
        LocatedEntity::new(
            self.id,
            coordinate(self.latitude),
            coordinate(self.longitude),
            self,
        )
    }
}

/// List active stores that have both coordinates on record.
///
/// Results are ordered by `name ASC, id ASC` so that equal-distance ties
/// downstream resolve the same way on every call.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_located_stores(pool: &PgPool) -> Result<Vec<StoreRow>, sqlx::Error> {
    sqlx::query_as::<_, StoreRow>(
        "SELECT id, owner_account_id, name, address_line1, city, province, \
                latitude, longitude, is_active, created_at, updated_at \
         FROM stores \
         WHERE is_active = TRUE \
           AND latitude IS NOT NULL \
           AND longitude IS NOT NULL \
         ORDER BY name ASC, id ASC",
    )
    .fetch_all(pool)
    .await
}
