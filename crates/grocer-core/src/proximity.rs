//! K-nearest proximity ranking over located users and stores.

use serde::Serialize;
use uuid::Uuid;

use crate::{geo::distance_km, GeoError, GeoPoint};

/// A record eligible for proximity ranking, carrying an opaque payload.
///
/// Coordinates stay optional because the candidate source may hand back rows
/// that were never geocoded. Such rows are excluded, never defaulted.
#[derive(Debug, Clone, Serialize)]
pub struct LocatedEntity<T> {
    pub id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payload: T,
}

impl<T> LocatedEntity<T> {
    #[must_use]
    pub fn new(id: Uuid, latitude: Option<f64>, longitude: Option<f64>, payload: T) -> Self {
        Self {
            id,
            latitude,
            longitude,
            payload,
        }
    }

    /// Returns `true` when both coordinates are present.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// The entity's validated point.
    ///
    /// `Ok(None)` when a coordinate is missing; an error when both are present
    /// but out of range.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] for out-of-range coordinates.
    pub fn point(&self) -> Result<Option<GeoPoint>, GeoError> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).map(Some),
            _ => Ok(None),
        }
    }
}

/// A candidate that survived ranking, with its distance from the origin.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult<T> {
    pub entity: LocatedEntity<T>,
    pub distance_km: f64,
    /// For plain proximity ranking this equals `distance_km`; lower is better.
    pub score: f64,
}

/// Bounds for [`find_nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestQuery {
    pub k: usize,
    pub max_distance_km: f64,
}

impl NearestQuery {
    #[must_use]
    pub fn new(k: usize, max_distance_km: f64) -> Self {
        Self { k, max_distance_km }
    }

    fn validate(&self) -> Result<(), GeoError> {
        if self.k == 0 {
            return Err(GeoError::InvalidQuery("k must be at least 1".to_string()));
        }
        if !self.max_distance_km.is_finite() || self.max_distance_km <= 0.0 {
            return Err(GeoError::InvalidQuery(format!(
                "max_distance_km must be a positive number, got {}",
                self.max_distance_km
            )));
        }
        Ok(())
    }
}

/// Return up to `k` candidates within `max_distance_km` of `origin`, nearest
/// first.
///
/// Candidates without coordinates are skipped. Candidates at exactly the same
/// distance keep their input order.
///
/// # Errors
///
/// Returns [`GeoError::InvalidQuery`] when `k` is zero or the radius is not a
/// positive finite number, and [`GeoError::InvalidCoordinate`] when a
/// candidate carries out-of-range coordinates.
pub fn find_nearest<T, I>(
    origin: GeoPoint,
    candidates: I,
    query: NearestQuery,
) -> Result<Vec<RankedResult<T>>, GeoError>
where
    I: IntoIterator<Item = LocatedEntity<T>>,
{
    query.validate()?;

    let mut ranked = Vec::new();
    for entity in candidates {
        let Some(point) = entity.point()? else {
            continue;
        };

        let distance = distance_km(origin, point);
        if distance <= query.max_distance_km {
            ranked.push(RankedResult {
                entity,
                distance_km: distance,
                score: distance,
            });
        }
    }

    // sort_by is stable, which preserves input order for equal distances.
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked.truncate(query.k);

    Ok(ranked)
}
