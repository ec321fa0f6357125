//! Store lookups for the CLI: plain proximity and shopping-list matching.

use clap::Subcommand;
use grocer_core::{GeoPoint, PositionReading, RankingConfig};
use uuid::Uuid;

/// Sub-commands available under `stores`.
#[derive(Debug, Subcommand)]
pub enum StoresCommands {
    /// List the stores nearest to a point
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Maximum number of stores to show (defaults to `GROCER_NEARBY_K`)
        #[arg(long)]
        k: Option<usize>,
        /// Search radius in kilometres
        #[arg(long)]
        max_km: Option<f64>,
    },
    /// Rank stores for a shopping list by stock coverage and distance
    Match {
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Fall back to this account's stored location when no fix is given
        #[arg(long)]
        account: Option<Uuid>,
        /// Product on the list; repeat for each item
        #[arg(long = "product")]
        products: Vec<Uuid>,
    },
}

/// Print the stores nearest to `(lat, lng)`.
///
/// # Errors
///
/// Returns an error if the point or query is invalid or the database query
/// fails.
pub(crate) async fn run_stores_nearby(
    pool: &sqlx::PgPool,
    ranking: &RankingConfig,
    lat: f64,
    lng: f64,
    k: Option<usize>,
    max_km: Option<f64>,
) -> anyhow::Result<()> {
    let origin = GeoPoint::new(lat, lng)?;
    let mut query = ranking.nearby_query();
    query.k = k.unwrap_or(query.k);
    query.max_distance_km = max_km.unwrap_or(query.max_distance_km);
    let ranked = grocer_db::nearby_stores(pool, origin, query).await?;

    if ranked.is_empty() {
        println!(
            "no stores within {} km of {lat}, {lng}",
            query.max_distance_km
        );
        return Ok(());
    }

    println!("{:<4}{:<10}{:<32}CITY", "#", "KM", "STORE");
    for (rank, result) in ranked.iter().enumerate() {
        let store = &result.entity.payload;
        println!(
            "{:<4}{:<10}{:<32}{}",
            rank + 1,
            super::fmt_km(Some(result.distance_km)),
            store.name,
            store.city.as_deref().unwrap_or("\u{2014}")
        );
    }

    Ok(())
}

/// Print stores ranked for the given shopping list.
///
/// # Errors
///
/// Returns an error if no origin can be resolved, the account is unknown, or
/// a database query fails.
pub(crate) async fn run_stores_match(
    pool: &sqlx::PgPool,
    ranking: &RankingConfig,
    account: Option<Uuid>,
    reading: Option<PositionReading>,
    products: &[Uuid],
) -> anyhow::Result<()> {
    let origin = grocer_db::resolve_account_origin(pool, account, reading).await?;
    let matches = grocer_db::best_stores_for_list(pool, origin, products, ranking).await?;

    tracing::info!(
        products = products.len(),
        stores = matches.len(),
        "store matches ranked"
    );

    if matches.is_empty() {
        println!("no stores within {} km", ranking.match_search_radius_km);
        return Ok(());
    }

    println!(
        "{:<4}{:<8}{:<8}{:<10}STORE",
        "#", "SCORE", "AVAIL%", "KM"
    );
    for (rank, m) in matches.iter().enumerate() {
        println!(
            "{:<4}{:<8.1}{:<8.1}{:<10}{}",
            rank + 1,
            m.candidate.combined_score,
            m.candidate.availability_score,
            super::fmt_km(m.candidate.distance_km),
            m.store.name
        );
    }

    Ok(())
}
