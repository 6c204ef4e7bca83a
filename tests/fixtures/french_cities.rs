//! Real French city coordinates for realistic fixtures.
//!
//! Coordinates sourced from OpenStreetMap (Nominatim city centres).

use ev_stop_planner::point::GeoPoint;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

pub const PARIS: Location = Location::new("Paris", 48.8566, 2.3522);
pub const LYON: Location = Location::new("Lyon", 45.7578, 4.8320);
pub const MARSEILLE: Location = Location::new("Marseille", 43.2965, 5.3698);
pub const BORDEAUX: Location = Location::new("Bordeaux", 44.8378, -0.5792);
pub const LILLE: Location = Location::new("Lille", 50.6292, 3.0573);
pub const STRASBOURG: Location = Location::new("Strasbourg", 48.5734, 7.7521);
pub const CLERMONT_FERRAND: Location = Location::new("Clermont-Ferrand", 45.7772, 3.0870);

pub const CITIES: &[Location] = &[PARIS, LYON, MARSEILLE, BORDEAUX, LILLE, STRASBOURG, CLERMONT_FERRAND];

pub fn find(name: &str) -> Option<&'static Location> {
    CITIES.iter().find(|city| city.name.eq_ignore_ascii_case(name))
}
