//! Resolving the ranking origin from a device reading or a stored address.
//!
//! GPS acquisition itself happens on the device. The server only sees what the
//! client reports, so a reading arrives here already classified.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GeoError, GeoPoint};

/// What the device's position capability reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PositionReading {
    Fix { latitude: f64, longitude: f64 },
    Timeout,
    PermissionDenied,
    Unavailable,
}

/// Why no origin could be produced. Logged, never branched on: every reason
/// surfaces to the caller as the same [`GeoError::LocationUnavailable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    Timeout,
    PermissionDenied,
    NoFix,
    NoStoredLocation,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::Timeout => write!(f, "position request timed out"),
            UnavailableReason::PermissionDenied => write!(f, "location permission denied"),
            UnavailableReason::NoFix => write!(f, "no position fix"),
            UnavailableReason::NoStoredLocation => write!(f, "no stored location"),
        }
    }
}

/// Pick the origin for a ranking request.
///
/// A device fix wins. Without one, the account's stored coordinates are used
/// if both are present. There is no further fallback.
///
/// # Errors
///
/// Returns [`GeoError::InvalidCoordinate`] for an out-of-range fix or stored
/// point, and [`GeoError::LocationUnavailable`] when neither source yields a
/// point.
pub fn resolve_origin(
    reading: Option<PositionReading>,
    stored: Option<(Option<f64>, Option<f64>)>,
) -> Result<GeoPoint, GeoError> {
    let device_failure = match reading {
        Some(PositionReading::Fix {
            latitude,
            longitude,
        }) => return GeoPoint::new(latitude, longitude),
        Some(PositionReading::Timeout) => Some(UnavailableReason::Timeout),
        Some(PositionReading::PermissionDenied) => Some(UnavailableReason::PermissionDenied),
        Some(PositionReading::Unavailable) => Some(UnavailableReason::NoFix),
        None => None,
    };

    if let Some((Some(latitude), Some(longitude))) = stored {
        return GeoPoint::new(latitude, longitude);
    }

    Err(GeoError::LocationUnavailable {
        reason: device_failure.unwrap_or(UnavailableReason::NoStoredLocation),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_is_used_directly() {
        let origin = resolve_origin(
            Some(PositionReading::Fix {
                latitude: 14.5995,
                longitude: 120.9842,
            }),
            Some((Some(10.0), Some(123.0))),
        )
        .expect("origin");
        assert!((origin.latitude() - 14.5995).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_fix_is_rejected_not_clamped() {
        let err = resolve_origin(
            Some(PositionReading::Fix {
                latitude: 91.0,
                longitude: 0.0,
            }),
            Some((Some(10.0), Some(123.0))),
        )
        .unwrap_err();
        assert!(matches!(err, GeoError::InvalidCoordinate { .. }));
    }

    #[test]
    fn falls_back_to_stored_location() {
        let origin = resolve_origin(
            Some(PositionReading::Timeout),
            Some((Some(10.3157), Some(123.8854))),
        )
        .expect("origin");
        assert!((origin.longitude() - 123.8854).abs() < f64::EPSILON);
    }

    #[test]
    fn timeout_and_denial_are_both_unavailable() {
        for reading in [PositionReading::Timeout, PositionReading::PermissionDenied] {
            let err = resolve_origin(Some(reading), None).unwrap_err();
            assert!(matches!(err, GeoError::LocationUnavailable { .. }));
        }
    }

    #[test]
    fn partial_stored_location_is_unavailable() {
        let err = resolve_origin(None, Some((Some(14.6), None))).unwrap_err();
        assert_eq!(
            err,
            GeoError::LocationUnavailable {
                reason: UnavailableReason::NoStoredLocation
            }
        );
    }

    #[test]
    fn reading_deserializes_from_tagged_json() {
        let reading: PositionReading =
            serde_json::from_str(r#"{"status":"fix","latitude":14.6,"longitude":121.0}"#)
                .expect("parse");
        assert!(matches!(reading, PositionReading::Fix { .. }));

        let reading: PositionReading =
            serde_json::from_str(r#"{"status":"permission_denied"}"#).expect("parse");
        assert_eq!(reading, PositionReading::PermissionDenied);
    }
}
