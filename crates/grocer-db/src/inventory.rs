//! Read operations for the `store_inventory` table.

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

/// A product a store currently has on hand.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct InStockRow {
    pub store_id: Uuid,
    pub product_id: Uuid,
}

/// List `(store, product)` pairs for the given products with quantity on hand.
///
/// Only active stores and active products are considered. An empty
/// `product_ids` slice yields no rows without touching the database.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_in_stock_products(
    pool: &PgPool,
    product_ids: &[Uuid],
) -> Result<Vec<InStockRow>, sqlx::Error> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, InStockRow>(
        "SELECT si.store_id, si.product_id \
         FROM store_inventory si \
         JOIN stores s ON s.id = si.store_id \
         JOIN products p ON p.id = si.product_id \
         WHERE si.product_id = ANY($1::uuid[]) \
           AND si.quantity > 0 \
           AND s.is_active = TRUE \
           AND p.is_active = TRUE \
         ORDER BY si.store_id, si.product_id",
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await
}

/// Group in-stock rows into a per-store product set.
#[must_use]
pub fn in_stock_by_store(rows: &[InStockRow]) -> HashMap<Uuid, HashSet<Uuid>> {
    let mut by_store: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for row in rows {
        by_store
            .entry(row.store_id)
            .or_default()
            .insert(row.product_id);
    }
    by_store
}
