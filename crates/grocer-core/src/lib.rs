pub mod accounts;
pub mod app_config;
pub mod availability;
pub mod config;
pub mod geo;
pub mod position;
pub mod proximity;
pub mod scoring;

pub use accounts::AccountRole;
pub use app_config::{AppConfig, Environment, RankingConfig};
pub use availability::availability_score;
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{distance_km, haversine_km, GeoPoint, EARTH_RADIUS_KM};
pub use position::{resolve_origin, PositionReading, UnavailableReason};
pub use proximity::{find_nearest, LocatedEntity, NearestQuery, RankedResult};
pub use scoring::{
    distance_score, rank_stores_by_match, ScoringWeights, StoreCandidateInput, StoreMatchCandidate,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Failures raised by the ranking core.
///
/// An empty candidate set is not an error; ranking it yields an empty list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("current location is unavailable: {reason}")]
    LocationUnavailable { reason: UnavailableReason },

    #[error("invalid proximity query: {0}")]
    InvalidQuery(String),

    #[error("invalid score input: {0}")]
    InvalidScoreInput(String),
}
