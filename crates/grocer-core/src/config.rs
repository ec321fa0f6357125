use std::str::FromStr;

use crate::app_config::{AppConfig, Environment, RankingConfig};
use crate::{ConfigError, ScoringWeights};

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let api_key_hash_salt = require("GROCER_API_KEY_HASH_SALT")?;

    let env = parse_environment(&or_default("GROCER_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_var(&or_default, "GROCER_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("GROCER_LOG_LEVEL", "info");

    let db_max_connections: u32 = parse_var(&or_default, "GROCER_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections: u32 = parse_var(&or_default, "GROCER_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs: u64 =
        parse_var(&or_default, "GROCER_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let ranking = build_ranking_config(&or_default)?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        api_key_hash_salt: Some(api_key_hash_salt),
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        ranking,
    })
}

fn build_ranking_config<D>(or_default: &D) -> Result<RankingConfig, ConfigError>
where
    D: Fn(&str, &str) -> String,
{
    let nearby_k: usize = parse_var(or_default, "GROCER_NEARBY_K", "20")?;
    let match_candidate_limit: usize = parse_var(or_default, "GROCER_MATCH_CANDIDATE_LIMIT", "50")?;
    for (var, value) in [
        ("GROCER_NEARBY_K", nearby_k),
        ("GROCER_MATCH_CANDIDATE_LIMIT", match_candidate_limit),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
    }

    let nearby_max_distance_km = parse_km(or_default, "GROCER_NEARBY_MAX_DISTANCE_KM", "50")?;
    let match_max_considered_distance_km =
        parse_km(or_default, "GROCER_MATCH_MAX_CONSIDERED_DISTANCE_KM", "50")?;
    let match_search_radius_km = parse_km(or_default, "GROCER_MATCH_SEARCH_RADIUS_KM", "100")?;

    let availability_weight: f64 = parse_var(or_default, "GROCER_AVAILABILITY_WEIGHT", "0.6")?;
    let distance_weight: f64 = parse_var(or_default, "GROCER_DISTANCE_WEIGHT", "0.4")?;
    let weights = ScoringWeights::new(availability_weight, distance_weight).map_err(|e| {
        let invalid = |w: f64| !(w.is_finite() && w >= 0.0);
        let var = if invalid(availability_weight) {
            "GROCER_AVAILABILITY_WEIGHT"
        } else if invalid(distance_weight) {
            "GROCER_DISTANCE_WEIGHT"
        } else {
            "GROCER_AVAILABILITY_WEIGHT + GROCER_DISTANCE_WEIGHT"
        };
        ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok(RankingConfig {
        nearby_k,
        nearby_max_distance_km,
        match_max_considered_distance_km,
        match_search_radius_km,
        match_candidate_limit,
        weights,
    })
}

fn parse_var<D, T>(or_default: &D, var: &str, default: &str) -> Result<T, ConfigError>
where
    D: Fn(&str, &str) -> String,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = or_default(var, default);
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a distance in kilometres that must be a positive finite number.
fn parse_km<D>(or_default: &D, var: &str, default: &str) -> Result<f64, ConfigError>
where
    D: Fn(&str, &str) -> String,
{
    let km: f64 = parse_var(or_default, var, default)?;
    if km.is_finite() && km > 0.0 {
        Ok(km)
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("must be a positive number of kilometres, got {km}"),
        })
    }
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value is not a recognized environment.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GROCER_ENV".to_string(),
            reason: format!("unrecognized environment '{other}'; expected development, test, or production"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
