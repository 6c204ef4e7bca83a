//! Geographic point type shared by every stage of the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// A latitude/longitude pair in decimal degrees.
///
/// Construction through [`GeoPoint::new`] is unchecked: decoded polylines
/// carry whatever the producer encoded. Values that come from outside the
/// crate (geocoder replies, directory records) go through
/// [`GeoPoint::validated`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a point, rejecting non-finite or out-of-range coordinates.
    pub fn validated(lat: f64, lng: f64) -> Result<Self, PlanError> {
        let point = Self { lat, lng };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(PlanError::InvalidCoordinate { lat, lng })
        }
    }

    /// True when both axes are finite and inside their WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<GeoPoint> for (f64, f64) {
    fn from(point: GeoPoint) -> Self {
        (point.lat, point.lng)
    }
}
