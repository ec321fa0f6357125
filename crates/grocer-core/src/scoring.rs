//! Composite store-match scoring: catalog availability blended with
//! distance decay.

use std::cmp::Ordering;

use serde::Serialize;
use uuid::Uuid;

use crate::GeoError;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Relative weights of the availability and proximity terms.
///
/// Both weights are non-negative and sum to 1, so the combined score of
/// in-range inputs stays within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringWeights {
    availability_weight: f64,
    distance_weight: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            availability_weight: 0.6,
            distance_weight: 0.4,
        }
    }
}

impl ScoringWeights {
    /// Weights within rounding of 1 are rescaled so they sum to exactly 1.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidScoreInput`] if either weight is negative or
    /// non-finite, or if they do not sum to 1.
    pub fn new(availability_weight: f64, distance_weight: f64) -> Result<Self, GeoError> {
        let valid = |w: f64| w.is_finite() && w >= 0.0;
        if !valid(availability_weight) || !valid(distance_weight) {
            return Err(GeoError::InvalidScoreInput(format!(
                "weights must be non-negative numbers, got {availability_weight} and {distance_weight}"
            )));
        }
        let sum = availability_weight + distance_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(GeoError::InvalidScoreInput(format!(
                "weights must sum to 1, got {sum}"
            )));
        }
        Ok(Self {
            availability_weight: availability_weight / sum,
            distance_weight: distance_weight / sum,
        })
    }

    #[must_use]
    pub fn availability_weight(&self) -> f64 {
        self.availability_weight
    }

    #[must_use]
    pub fn distance_weight(&self) -> f64 {
        self.distance_weight
    }
}

/// One store entering the match ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCandidateInput {
    pub store_id: Uuid,
    /// Percentage of requested items in stock, `0..=100`.
    pub availability_score: f64,
    /// `None` when the store has no location on record.
    pub distance_km: Option<f64>,
    pub max_considered_distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreMatchCandidate {
    pub store_id: Uuid,
    pub availability_score: f64,
    pub distance_km: Option<f64>,
    pub distance_score: f64,
    pub combined_score: f64,
}

/// Linear distance decay: 100 at the origin, 0 at `max_considered_distance_km`
/// and beyond. An unknown distance scores 0.
#[must_use]
pub fn distance_score(distance_km: Option<f64>, max_considered_distance_km: f64) -> f64 {
    match distance_km {
        Some(d) => (100.0 - (d / max_considered_distance_km) * 100.0).max(0.0),
        None => 0.0,
    }
}

/// Score and order stores for a shopping list, best match first.
///
/// Ordering is by combined score (descending), then availability
/// (descending), then distance (ascending, unknown last), then input order.
///
/// # Errors
///
/// Returns [`GeoError::InvalidScoreInput`] when an availability score lies
/// outside `[0, 100]`, a distance is negative or non-finite, or the
/// considered distance is not positive.
pub fn rank_stores_by_match(
    stores: &[StoreCandidateInput],
    weights: &ScoringWeights,
) -> Result<Vec<StoreMatchCandidate>, GeoError> {
    let mut scored = Vec::with_capacity(stores.len());

    for store in stores {
        validate_input(store)?;

        let distance_score = distance_score(store.distance_km, store.max_considered_distance_km);
        let combined_score = (store.availability_score * weights.availability_weight
            + distance_score * weights.distance_weight)
            .clamp(0.0, 100.0);

        scored.push(StoreMatchCandidate {
            store_id: store.store_id,
            availability_score: store.availability_score,
            distance_km: store.distance_km,
            distance_score,
            combined_score,
        });
    }

    scored.sort_by(compare_candidates);
    Ok(scored)
}

fn validate_input(store: &StoreCandidateInput) -> Result<(), GeoError> {
    if !(0.0..=100.0).contains(&store.availability_score) {
        return Err(GeoError::InvalidScoreInput(format!(
            "availability score for store {} must be within 0..=100, got {}",
            store.store_id, store.availability_score
        )));
    }
    if let Some(d) = store.distance_km {
        if !d.is_finite() || d < 0.0 {
            return Err(GeoError::InvalidScoreInput(format!(
                "distance for store {} must be a non-negative number, got {d}",
                store.store_id
            )));
        }
    }
    if !store.max_considered_distance_km.is_finite() || store.max_considered_distance_km <= 0.0 {
        return Err(GeoError::InvalidScoreInput(format!(
            "max considered distance must be positive, got {}",
            store.max_considered_distance_km
        )));
    }
    Ok(())
}

fn compare_candidates(a: &StoreMatchCandidate, b: &StoreMatchCandidate) -> Ordering {
    b.combined_score
        .total_cmp(&a.combined_score)
        .then_with(|| b.availability_score.total_cmp(&a.availability_score))
        .then_with(|| match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}
