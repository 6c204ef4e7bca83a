//! ev-stop-planner
//!
//! Plans electric-vehicle charging stops along a driving route: decodes the
//! route geometry, derives a station search corridor, projects candidate
//! stations onto the route and greedily selects a spaced sequence of stops.

pub mod config;
pub mod corridor;
pub mod error;
pub mod haversine;
pub mod irve;
pub mod nominatim;
pub mod osrm;
pub mod planner;
pub mod point;
pub mod polyline;
pub mod route;
pub mod stations;
pub mod traits;
pub mod travel_time;
pub mod trip;
