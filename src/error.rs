//! Error types for planning, collaborators and configuration.

use std::path::PathBuf;

/// Errors that make a planning call untrustworthy.
///
/// Infeasible plans are not errors; they are reported through
/// [`crate::planner::Feasibility`].
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("malformed polyline at byte {offset}: {reason}")]
    MalformedPolyline { offset: usize, reason: &'static str },

    #[error("route needs at least 2 points, got {points}")]
    DegenerateRoute { points: usize },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("coordinate out of range: ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },
}

/// Errors from the external collaborators (geocoder, router, directory,
/// travel-time estimator).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("place not found: {0}")]
    PlaceNotFound(String),

    #[error("no route between the requested points")]
    NoRoute,

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Errors that abort a whole trip request.
#[derive(Debug, thiserror::Error)]
pub enum TripError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("geocoding {place:?} failed: {source}")]
    Geocode {
        place: String,
        #[source]
        source: ProviderError,
    },

    #[error("route calculation failed: {0}")]
    Route(#[source] ProviderError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Errors while loading a [`crate::config::PlannerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
