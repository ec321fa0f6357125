use std::net::SocketAddr;

use crate::{NearestQuery, ScoringWeights};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Tunable policy for the two ranking consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
    /// How many regulated accounts / stores the nearby lookups return.
    pub nearby_k: usize,
    pub nearby_max_distance_km: f64,
    /// Distance at which the proximity term of a store match reaches zero.
    pub match_max_considered_distance_km: f64,
    /// Radius of the proximity pre-filter applied before match scoring.
    pub match_search_radius_km: f64,
    pub match_candidate_limit: usize,
    pub weights: ScoringWeights,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            nearby_k: 20,
            nearby_max_distance_km: 50.0,
            match_max_considered_distance_km: 50.0,
            match_search_radius_km: 100.0,
            match_candidate_limit: 50,
            weights: ScoringWeights::default(),
        }
    }
}

impl RankingConfig {
    #[must_use]
    pub fn nearby_query(&self) -> NearestQuery {
        NearestQuery::new(self.nearby_k, self.nearby_max_distance_km)
    }

    #[must_use]
    pub fn match_query(&self) -> NearestQuery {
        NearestQuery::new(self.match_candidate_limit, self.match_search_radius_km)
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub api_key_hash_salt: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub ranking: RankingConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "api_key_hash_salt",
                &self.api_key_hash_salt.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("ranking", &self.ranking)
            .finish()
    }
}
