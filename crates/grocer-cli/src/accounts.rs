use clap::Subcommand;
use grocer_core::{PositionReading, RankingConfig};
use uuid::Uuid;

/// Sub-commands available under `accounts`.
#[derive(Debug, Subcommand)]
pub enum AccountsCommands {
    /// List regulated (store-role) accounts nearest to an account
    NearbyRegulated {
        #[arg(long)]
        account: Uuid,
        /// Current fix; the account's stored location is used without one
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,
        #[arg(long)]
        k: Option<usize>,
    },
}

/// # Errors
///
/// Returns an error if the account is unknown, no origin can be resolved, or
/// the database query fails.
pub(crate) async fn run_accounts_nearby_regulated(
    pool: &sqlx::PgPool,
    ranking: &RankingConfig,
    account: Uuid,
    reading: Option<PositionReading>,
    k: Option<usize>,
) -> anyhow::Result<()> {
    let origin = grocer_db::resolve_account_origin(pool, Some(account), reading).await?;
    let mut query = ranking.nearby_query();
    query.k = k.unwrap_or(query.k);
    let ranked = grocer_db::nearby_regulated_accounts(pool, origin, query, Some(account)).await?;

    if ranked.is_empty() {
        println!(
            "no regulated accounts within {} km",
            query.max_distance_km
        );
        return Ok(());
    }

    println!("{:<4}{:<10}{:<38}NAME", "#", "KM", "ID");
    for (rank, result) in ranked.iter().enumerate() {
        println!(
            "{:<4}{:<10}{:<38}{}",
            rank + 1,
            super::fmt_km(Some(result.distance_km)),
            result.entity.id,
            result.entity.payload.display_name
        );
    }

    Ok(())
}
