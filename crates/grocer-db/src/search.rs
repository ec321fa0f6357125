//! Proximity searches that combine candidate queries with the ranking core.
//!
//! Each function fetches the full candidate set, then ranks it in memory. A
//! failed fetch fails the search; there are no partial results.

use std::collections::{HashMap, HashSet};

use grocer_core::{
    availability_score, find_nearest, rank_stores_by_match, resolve_origin, AccountRole, GeoError,
    GeoPoint, NearestQuery, PositionReading, RankedResult, RankingConfig, StoreCandidateInput,
    StoreMatchCandidate,
};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    get_account, in_stock_by_store, list_in_stock_products, list_located_accounts_by_roles,
    list_located_stores, AccountRow, DbError, StoreRow,
};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Geo(#[from] GeoError),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for SearchError {
    fn from(e: sqlx::Error) -> Self {
        SearchError::Db(DbError::Sqlx(e))
    }
}

/// A store paired with its match score for a shopping list.
#[derive(Debug, Clone)]
pub struct StoreMatch {
    pub store: StoreRow,
    pub candidate: StoreMatchCandidate,
}

/// Resolve the origin for a request, falling back to the account's stored
/// location when the device reading is missing or failed.
///
/// A named account must exist even when the reading is a usable fix.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown account, and the
/// [`GeoError`] from [`resolve_origin`] when no usable point exists.
pub async fn resolve_account_origin(
    pool: &PgPool,
    account_id: Option<Uuid>,
    reading: Option<PositionReading>,
) -> Result<GeoPoint, SearchError> {
    let stored = match account_id {
        Some(id) => {
            let account = get_account(pool, id).await?.ok_or(DbError::NotFound)?;
            Some(account.stored_position())
        }
        None => None,
    };

    Ok(resolve_origin(reading, stored)?)
}

/// Nearest active stores to `origin`.
///
/// # Errors
///
/// Returns [`SearchError`] if the query fails or the ranking input is invalid.
pub async fn nearby_stores(
    pool: &PgPool,
    origin: GeoPoint,
    query: NearestQuery,
) -> Result<Vec<RankedResult<StoreRow>>, SearchError> {
    let stores = list_located_stores(pool).await?;
    let ranked = find_nearest(origin, stores.into_iter().map(StoreRow::into_located), query)?;
    Ok(ranked)
}

/// Nearest accounts in a regulated role to `origin`, leaving out the
/// requesting account itself.
///
/// # Errors
///
/// Returns [`SearchError`] if the query fails or the ranking input is invalid.
pub async fn nearby_regulated_accounts(
    pool: &PgPool,
    origin: GeoPoint,
    query: NearestQuery,
    requester: Option<Uuid>,
) -> Result<Vec<RankedResult<AccountRow>>, SearchError> {
    let accounts = list_located_accounts_by_roles(pool, &AccountRole::regulated()).await?;
    let ranked = find_nearest(
        origin,
        accounts
            .into_iter()
            .filter(|account| Some(account.id) != requester)
            .map(AccountRow::into_located),
        query,
    )?;
    Ok(ranked)
}

/// Rank stores for a shopping list by stock coverage and proximity.
///
/// Only located stores inside the match search radius take part; a store
/// whose distance cannot be computed is never ranked.
///
/// # Errors
///
/// Returns [`SearchError`] if a query fails or the ranking input is invalid.
pub async fn best_stores_for_list(
    pool: &PgPool,
    origin: GeoPoint,
    product_ids: &[Uuid],
    config: &RankingConfig,
) -> Result<Vec<StoreMatch>, SearchError> {
    let stores = list_located_stores(pool).await?;
    let in_stock = in_stock_by_store(&list_in_stock_products(pool, product_ids).await?);

    let matches = score_stores(origin, stores, product_ids, &in_stock, config)?;
    Ok(matches)
}

/// In-memory half of [`best_stores_for_list`].
///
/// Stores pass through [`find_nearest`] with the match query first, so the
/// same radius and count limit apply to every store. Stores without
/// coordinates drop out there, like stores beyond the radius.
///
/// # Errors
///
/// Returns [`GeoError`] if a store has invalid coordinates or the ranking
/// configuration is invalid.
pub fn score_stores(
    origin: GeoPoint,
    stores: Vec<StoreRow>,
    product_ids: &[Uuid],
    in_stock: &HashMap<Uuid, HashSet<Uuid>>,
    config: &RankingConfig,
) -> Result<Vec<StoreMatch>, GeoError> {
    let nearest = find_nearest(
        origin,
        stores.into_iter().map(StoreRow::into_located),
        config.match_query(),
    )?;

    let empty = HashSet::new();
    let mut by_id: HashMap<Uuid, StoreRow> = HashMap::with_capacity(nearest.len());
    let mut inputs = Vec::with_capacity(nearest.len());

    for ranked in nearest {
        let store = ranked.entity.payload;
        inputs.push(StoreCandidateInput {
            store_id: store.id,
            availability_score: availability_score(
                product_ids,
                in_stock.get(&store.id).unwrap_or(&empty),
            ),
            distance_km: Some(ranked.distance_km),
            max_considered_distance_km: config.match_max_considered_distance_km,
        });
        by_id.insert(store.id, store);
    }

    let ranked = rank_stores_by_match(&inputs, &config.weights)?;

    Ok(ranked
        .into_iter()
        .filter_map(|candidate| {
            by_id
                .remove(&candidate.store_id)
                .map(|store| StoreMatch { store, candidate })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn store(name: &str, coords: Option<(i64, i64)>) -> StoreRow {
        StoreRow {
            id: Uuid::new_v4(),
            owner_account_id: None,
            name: name.to_string(),
            address_line1: None,
            city: Some("Manila".to_string()),
            province: None,
            latitude: coords.map(|(lat, _)| Decimal::new(lat, 6)),
            longitude: coords.map(|(_, lng)| Decimal::new(lng, 6)),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn manila() -> GeoPoint {
        GeoPoint::new(14.5995, 120.9842).expect("origin")
    }

    #[test]
    fn score_stores_prefers_full_coverage_over_proximity() {
        let near = store("Near Mart", Some((14_609_100, 120_983_600)));
        let far = store("Far Grocer", Some((14_554_700, 121_024_400)));

        let milk = Uuid::new_v4();
        let rice = Uuid::new_v4();
        let mut in_stock: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        in_stock.insert(far.id, [milk, rice].into_iter().collect());
        in_stock.insert(near.id, [milk].into_iter().collect());

        let (near_id, far_id) = (near.id, far.id);
        let matches = score_stores(
            manila(),
            vec![near, far],
            &[milk, rice],
            &in_stock,
            &RankingConfig::default(),
        )
        .expect("scored");

        let order: Vec<Uuid> = matches.iter().map(|m| m.store.id).collect();
        assert_eq!(order, vec![far_id, near_id]);
        assert!(matches.iter().all(|m| m.candidate.distance_km.is_some()));
    }

    #[test]
    fn unlocated_store_gets_no_edge_over_a_located_store_out_of_range() {
        let cebu = store("Cebu Market", Some((10_315_700, 123_885_400)));
        let ghost = store("Ghost Stall", None);

        let rice = Uuid::new_v4();
        let mut in_stock: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        in_stock.insert(cebu.id, [rice].into_iter().collect());
        in_stock.insert(ghost.id, [rice].into_iter().collect());

        let matches = score_stores(
            manila(),
            vec![cebu, ghost],
            &[rice],
            &in_stock,
            &RankingConfig::default(),
        )
        .expect("scored");

        assert!(matches.is_empty(), "{matches:?}");
    }

    #[test]
    fn located_store_beyond_considered_distance_is_kept_with_zero_distance_score() {
        // Baguio is roughly 200 km away; widen the search radius to reach it.
        let baguio = store("Baguio Market", Some((16_402_300, 120_596_000)));
        let rice = Uuid::new_v4();
        let mut in_stock: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        in_stock.insert(baguio.id, [rice].into_iter().collect());
        let config = RankingConfig {
            match_search_radius_km: 500.0,
            ..RankingConfig::default()
        };

        let matches =
            score_stores(manila(), vec![baguio], &[rice], &in_stock, &config).expect("scored");

        assert_eq!(matches.len(), 1);
        assert!(matches[0].candidate.distance_score.abs() < f64::EPSILON);
        assert!((matches[0].candidate.combined_score - 60.0).abs() < 1e-9);
    }

    #[test]
    fn score_stores_drops_located_stores_beyond_search_radius() {
        let cebu = store("Cebu Market", Some((10_315_700, 123_885_400)));
        let config = RankingConfig::default();

        let matches = score_stores(manila(), vec![cebu], &[], &HashMap::new(), &config)
            .expect("scored");

        assert!(matches.is_empty());
    }

    #[test]
    fn score_stores_with_empty_list_ranks_by_distance_only() {
        let near = store("Near Mart", Some((14_609_100, 120_983_600)));
        let far = store("Far Grocer", Some((14_554_700, 121_024_400)));
        let near_id = near.id;

        let matches = score_stores(
            manila(),
            vec![far, near],
            &[],
            &HashMap::new(),
            &RankingConfig::default(),
        )
        .expect("scored");

        assert_eq!(matches[0].store.id, near_id);
        assert!(matches.iter().all(|m| m.candidate.availability_score.abs() < f64::EPSILON));
    }
}
