mod accounts;
mod stores;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use grocer_core::{GeoError, NearestQuery, PositionReading, RankingConfig};
use grocer_db::{DbError, SearchError};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

const MAX_K: usize = 200;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub ranking: RankingConfig,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "validation_error" => StatusCode::BAD_REQUEST,
            "location_unavailable" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Turn the caller's reported position into a reading.
///
/// `lat`/`lng` carry a device fix. Without them, `location_status` reports
/// why the device could not produce one (`timeout`, `permission_denied`,
/// `unavailable`).
pub(super) fn position_reading(
    lat: Option<f64>,
    lng: Option<f64>,
    location_status: Option<&str>,
) -> Result<Option<PositionReading>, String> {
    match (lat, lng) {
        (Some(latitude), Some(longitude)) => Ok(Some(PositionReading::Fix {
            latitude,
            longitude,
        })),
        (Some(_), None) | (None, Some(_)) => {
            Err("lat and lng must be supplied together".to_string())
        }
        (None, None) => match location_status {
            None => Ok(None),
            Some("timeout") => Ok(Some(PositionReading::Timeout)),
            Some("permission_denied") => Ok(Some(PositionReading::PermissionDenied)),
            Some("unavailable") => Ok(Some(PositionReading::Unavailable)),
            Some(other) => Err(format!(
                "location_status must be one of: timeout, permission_denied, unavailable; got {other:?}"
            )),
        },
    }
}

/// The configured nearby query with the caller's `k`/`max_km` overrides.
///
/// `k = 0` is rejected; larger values are capped at [`MAX_K`]. A bad `max_km`
/// is left for `find_nearest` to reject.
pub(super) fn nearby_query(
    ranking: &RankingConfig,
    k: Option<usize>,
    max_km: Option<f64>,
) -> Result<NearestQuery, String> {
    let mut query = ranking.nearby_query();
    match k {
        Some(0) => return Err("k must be at least 1".to_string()),
        Some(k) => query.k = k,
        None => {}
    }
    query.k = query.k.min(MAX_K);
    if let Some(max_km) = max_km {
        query.max_distance_km = max_km;
    }
    Ok(query)
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    if matches!(error, DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "account not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_search_error(request_id: String, error: &SearchError) -> ApiError {
    match error {
        SearchError::Geo(GeoError::LocationUnavailable { reason }) => {
            tracing::warn!(%reason, "ranking origin unavailable");
            ApiError::new(request_id, "location_unavailable", error.to_string())
        }
        SearchError::Geo(geo) => ApiError::new(request_id, "validation_error", geo.to_string()),
        SearchError::Db(db) => map_db_error(request_id, db),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/stores/nearby", get(stores::list_nearby_stores))
        .route("/api/v1/stores/match", post(stores::match_stores))
        .route(
            "/api/v1/accounts/{account_id}/nearby-regulated",
            get(accounts::list_nearby_regulated),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match grocer_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
