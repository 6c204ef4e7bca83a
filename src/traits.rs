//! Interfaces to the external collaborators of the planner.
//!
//! The planning core never performs I/O. Geocoding, routing, station lookup
//! and travel-time estimation sit behind these traits so a trip can be
//! planned against HTTP services, fixtures or in-memory mocks.

use serde::Serialize;

use crate::corridor::Corridor;
use crate::error::ProviderError;
use crate::point::GeoPoint;
use crate::stations::RawStationRecord;

/// Resolves a free-text place name to coordinates.
pub trait Geocoder {
    fn locate(&self, place: &str) -> Result<GeoPoint, ProviderError>;
}

/// Geometry and length of a driving route as reported by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    pub distance_km: f64,
    pub encoded_polyline: String,
    /// Decimal digits the polyline was encoded with.
    pub precision: u32,
}

/// Computes a driving route between two points.
pub trait RouteProvider {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<RouteGeometry, ProviderError>;
}

/// Looks up charging stations inside a corridor.
pub trait StationDirectory {
    fn stations_within(&self, corridor: &Corridor) -> Result<Vec<RawStationRecord>, ProviderError>;
}

/// Inputs of a travel-time estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelTimeRequest {
    pub distance_km: f64,
    pub average_speed_kmh: f64,
    pub range_km: f64,
    pub recharge_hours: f64,
}

/// Estimates the duration of a trip, charging included.
pub trait TravelTimeEstimator {
    fn estimate_hours(&self, request: &TravelTimeRequest) -> Result<f64, ProviderError>;
}
