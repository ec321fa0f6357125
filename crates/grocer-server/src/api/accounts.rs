use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_search_error, nearby_query, position_reading, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct NearbyRegulatedQuery {
    pub k: Option<usize>,
    pub max_km: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub location_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RegulatedAccountItem {
    pub id: Uuid,
    pub display_name: String,
    pub role: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_km: f64,
}

/// Regulated accounts nearest to the caller, leaving the caller out. The origin
/// is the reported fix, else the account's stored location.
pub(super) async fn list_nearby_regulated(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<NearbyRegulatedQuery>,
) -> Result<Json<ApiResponse<Vec<RegulatedAccountItem>>>, ApiError> {
    let reading = position_reading(query.lat, query.lng, query.location_status.as_deref())
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;
    let nearest = nearby_query(&state.ranking, query.k, query.max_km)
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;

    let origin = grocer_db::resolve_account_origin(&state.pool, Some(account_id), reading)
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    let ranked =
        grocer_db::nearby_regulated_accounts(&state.pool, origin, nearest, Some(account_id))
            .await
            .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    tracing::info!(%account_id, results = ranked.len(), "nearby regulated accounts ranked");

    let data = ranked
        .into_iter()
        .map(|r| RegulatedAccountItem {
            id: r.entity.id,
            latitude: r.entity.latitude,
            longitude: r.entity.longitude,
            display_name: r.entity.payload.display_name,
            role: r.entity.payload.role,
            distance_km: r.distance_km,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
