//! Great-circle distance and a local planar frame for short-range geometry.
//!
//! Distances use the haversine formula on a spherical earth. Segment
//! projection and corridor construction work in an equirectangular frame
//! around a reference point, which is accurate enough at the scale of a
//! corridor (tens of kilometres across).

use crate::point::GeoPoint;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude.
const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// Calculate haversine distance between two points in kilometers.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Equirectangular projection centred on a reference point.
///
/// `x` grows eastwards and `y` northwards, both in kilometres.
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    origin: GeoPoint,
    km_per_degree_lng: f64,
}

impl LocalFrame {
    pub fn new(origin: GeoPoint) -> Self {
        Self {
            origin,
            km_per_degree_lng: KM_PER_DEGREE * origin.lat.to_radians().cos(),
        }
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn to_local(&self, point: GeoPoint) -> (f64, f64) {
        (
            (point.lng - self.origin.lng) * self.km_per_degree_lng,
            (point.lat - self.origin.lat) * KM_PER_DEGREE,
        )
    }

    pub fn to_geo(&self, (x, y): (f64, f64)) -> GeoPoint {
        let lng = if self.km_per_degree_lng.abs() > f64::EPSILON {
            self.origin.lng + x / self.km_per_degree_lng
        } else {
            self.origin.lng
        };
        GeoPoint::new(self.origin.lat + y / KM_PER_DEGREE, lng)
    }
}
