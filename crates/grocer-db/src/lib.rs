//! Postgres access for grocer: pool setup, schema migrations, candidate
//! queries and the proximity searches built on them.

use std::{collections::HashSet, time::Duration};

use grocer_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

// Resolves to <workspace-root>/migrations/.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Failures talking to the candidate store. Propagated as-is; nothing in this
/// crate retries.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Open a pool sized by the `GROCER_DB_*` settings.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if no connection can be established.
pub async fn connect_pool(config: &AppConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections.min(config.db_max_connections))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Apply the embedded migrations the database has not recorded yet.
///
/// Returns how many were pending before the run.
///
/// # Errors
///
/// Returns [`DbError`] if the bookkeeping query or any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DbError> {
    let applied = applied_migration_versions(pool).await?;
    let pending = MIGRATOR
        .iter()
        .filter(|migration| !applied.contains(&migration.version))
        .count();

    MIGRATOR.run(pool).await?;
    Ok(pending)
}

async fn applied_migration_versions(pool: &PgPool) -> Result<HashSet<i64>, DbError> {
    let tracked: bool =
        sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;
    if !tracked {
        return Ok(HashSet::new());
    }

    let versions: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = TRUE")
            .fetch_all(pool)
            .await?;
    Ok(versions.into_iter().collect())
}

/// Confirm the database answers and the store schema is in place.
///
/// # Errors
///
/// Returns [`DbError`] if the check query fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1 FROM stores LIMIT 1")
        .execute(pool)
        .await?;
    Ok(())
}

pub mod accounts;
pub mod inventory;
mod located;
pub mod search;
pub mod stores;

pub use accounts::{get_account, list_located_accounts_by_roles, AccountRow};
pub use inventory::{in_stock_by_store, list_in_stock_products, InStockRow};
pub use search::{
    best_stores_for_list, nearby_regulated_accounts, nearby_stores, resolve_account_origin,
    score_stores, SearchError, StoreMatch,
};
pub use stores::{list_located_stores, StoreRow};
