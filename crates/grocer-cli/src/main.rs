mod accounts;
mod stores;

use clap::{Parser, Subcommand};
use grocer_core::PositionReading;
use tracing_subscriber::EnvFilter;

use crate::{accounts::AccountsCommands, stores::StoresCommands};

#[derive(Debug, Parser)]
#[command(name = "grocer-cli")]
#[command(about = "Grocer proximity and store-match command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Store proximity and shopping-list matching
    Stores {
        #[command(subcommand)]
        command: StoresCommands,
    },
    /// Account-centred lookups
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Verify the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("grocer-cli: pass --help to list commands");
        return Ok(());
    };

    let config = grocer_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = grocer_db::connect_pool(&config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                grocer_db::health_check(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = grocer_db::run_migrations(&pool).await?;
                println!("applied {applied} migration(s)");
            }
        },
        Commands::Stores { command } => match command {
            StoresCommands::Nearby {
                lat,
                lng,
                k,
                max_km,
            } => stores::run_stores_nearby(&pool, &config.ranking, lat, lng, k, max_km).await?,
            StoresCommands::Match {
                lat,
                lng,
                account,
                products,
            } => {
                let reading = reading_from_args(lat, lng)?;
                stores::run_stores_match(&pool, &config.ranking, account, reading, &products)
                    .await?;
            }
        },
        Commands::Accounts { command } => match command {
            AccountsCommands::NearbyRegulated {
                account,
                lat,
                lng,
                k,
            } => {
                let reading = reading_from_args(lat, lng)?;
                accounts::run_accounts_nearby_regulated(&pool, &config.ranking, account, reading, k)
                    .await?;
            }
        },
    }

    Ok(())
}

/// A device fix from `--lat`/`--lng`, or `None` when neither was passed.
fn reading_from_args(
    lat: Option<f64>,
    lng: Option<f64>,
) -> anyhow::Result<Option<PositionReading>> {
    match (lat, lng) {
        (Some(latitude), Some(longitude)) => Ok(Some(PositionReading::Fix {
            latitude,
            longitude,
        })),
        (None, None) => Ok(None),
        _ => anyhow::bail!("--lat and --lng must be passed together"),
    }
}

/// Format an optional distance for display, returning a dash when unknown.
fn fmt_km(distance_km: Option<f64>) -> String {
    distance_km.map_or_else(|| "\u{2014}".to_string(), |d| format!("{d:.2}"))
}
