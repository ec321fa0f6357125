use axum::{
    extract::{Query, State},
    Extension, Json,
};
use grocer_core::PositionReading;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_search_error, nearby_query, position_reading, ApiError, ApiResponse, AppState, ResponseMeta,
};

const MAX_PRODUCTS_PER_MATCH: usize = 200;

#[derive(Debug, Deserialize)]
pub(super) struct NearbyStoresQuery {
    pub account_id: Option<Uuid>,
    pub k: Option<usize>,
    pub max_km: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub location_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct NearbyStoreItem {
    pub id: Uuid,
    pub name: String,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_km: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct MatchStoresRequest {
    pub account_id: Option<Uuid>,
    pub position: Option<PositionReading>,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub(super) struct StoreMatchItem {
    pub store_id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub availability_score: f64,
    pub distance_km: Option<f64>,
    pub distance_score: f64,
    pub combined_score: f64,
}

pub(super) async fn list_nearby_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<NearbyStoresQuery>,
) -> Result<Json<ApiResponse<Vec<NearbyStoreItem>>>, ApiError> {
    let reading = position_reading(query.lat, query.lng, query.location_status.as_deref())
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;
    let nearest = nearby_query(&state.ranking, query.k, query.max_km)
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;

    let origin = grocer_db::resolve_account_origin(&state.pool, query.account_id, reading)
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    let ranked = grocer_db::nearby_stores(&state.pool, origin, nearest)
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    tracing::info!(
        results = ranked.len(),
        k = nearest.k,
        max_km = nearest.max_distance_km,
        "nearby stores ranked"
    );

    let data = ranked
        .into_iter()
        .map(|r| NearbyStoreItem {
            id: r.entity.id,
            latitude: r.entity.latitude,
            longitude: r.entity.longitude,
            name: r.entity.payload.name,
            address_line1: r.entity.payload.address_line1,
            city: r.entity.payload.city,
            province: r.entity.payload.province,
            distance_km: r.distance_km,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn match_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<MatchStoresRequest>,
) -> Result<Json<ApiResponse<Vec<StoreMatchItem>>>, ApiError> {
    if body.product_ids.len() > MAX_PRODUCTS_PER_MATCH {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("product_ids may contain at most {MAX_PRODUCTS_PER_MATCH} items"),
        ));
    }

    let origin = grocer_db::resolve_account_origin(&state.pool, body.account_id, body.position)
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    let matches =
        grocer_db::best_stores_for_list(&state.pool, origin, &body.product_ids, &state.ranking)
            .await
            .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    tracing::info!(
        products = body.product_ids.len(),
        stores = matches.len(),
        "store matches ranked"
    );

    let data = matches
        .into_iter()
        .map(|m| StoreMatchItem {
            store_id: m.store.id,
            name: m.store.name,
            city: m.store.city,
            availability_score: m.candidate.availability_score,
            distance_km: m.candidate.distance_km,
            distance_score: m.candidate.distance_score,
            combined_score: m.candidate.combined_score,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
