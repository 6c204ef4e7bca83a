//! Test fixtures for ev-stop-planner.
//!
//! Provides:
//! - Real French city coordinates (from OpenStreetMap)
//! - Builders for routes and projected candidates

#![allow(dead_code)]

pub mod french_cities;

pub use french_cities::*;

use ev_stop_planner::point::GeoPoint;
use ev_stop_planner::route::RouteProjection;
use ev_stop_planner::stations::{ProjectedCandidate, StationCandidate};

/// Point at fraction `f` of the straight lat/lng line from `from` to `to`.
pub fn point_along(from: GeoPoint, to: GeoPoint, f: f64) -> GeoPoint {
    GeoPoint::new(from.lat + f * (to.lat - from.lat), from.lng + f * (to.lng - from.lng))
}

/// Route from `from` to `to` split into `segments` equal lat/lng steps.
pub fn straight_route(from: GeoPoint, to: GeoPoint, segments: usize) -> Vec<GeoPoint> {
    (0..=segments)
        .map(|i| point_along(from, to, i as f64 / segments as f64))
        .collect()
}

/// A candidate already tagged with its arc length.
pub fn candidate(id: &str, arc_length_km: f64) -> ProjectedCandidate {
    candidate_off_route(id, arc_length_km, 0.0)
}

pub fn candidate_off_route(id: &str, arc_length_km: f64, perpendicular_distance_km: f64) -> ProjectedCandidate {
    ProjectedCandidate {
        station: StationCandidate {
            id: id.to_string(),
            location: GeoPoint::new(0.0, 0.0),
            power_kw: 50.0,
            operator_name: "Fixture".to_string(),
        },
        projection: RouteProjection {
            arc_length_km,
            perpendicular_distance_km,
        },
    }
}
