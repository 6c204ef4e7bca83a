//! End-to-end trip planning: geocode, route, find stations, plan stops and
//! estimate the travel time.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::corridor::build_corridor;
use crate::error::TripError;
use crate::planner::{self, StopPlan};
use crate::point::GeoPoint;
use crate::polyline;
use crate::route::Route;
use crate::stations::{self, ProjectedCandidate};
use crate::traits::{Geocoder, RouteProvider, StationDirectory, TravelTimeEstimator, TravelTimeRequest};
use crate::travel_time::estimate_or_fallback;

/// A trip request as received from a client. Unset numbers take the
/// configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub start_place: String,
    pub end_place: String,
    pub range_km: Option<f64>,
    pub average_speed_kmh: Option<f64>,
    pub recharge_hours: Option<f64>,
}

impl TripRequest {
    pub fn new(start_place: impl Into<String>, end_place: impl Into<String>) -> Self {
        Self {
            start_place: start_place.into(),
            end_place: end_place.into(),
            ..Self::default()
        }
    }

    pub fn with_range_km(mut self, range_km: f64) -> Self {
        self.range_km = Some(range_km);
        self
    }

    /// Checks the request and fills in defaults.
    pub fn validate(&self, config: &PlannerConfig) -> Result<TripParameters, TripError> {
        let start_place = self.start_place.trim();
        let end_place = self.end_place.trim();
        if start_place.is_empty() || end_place.is_empty() {
            return Err(TripError::Validation(
                "start and end places are required".to_string(),
            ));
        }

        let range_km = self.range_km.unwrap_or(config.default_range_km);
        let average_speed_kmh = self.average_speed_kmh.unwrap_or(config.default_speed_kmh);
        let recharge_hours = self.recharge_hours.unwrap_or(config.default_recharge_hours);
        for (name, value) in [("rangeKm", range_km), ("averageSpeedKmh", average_speed_kmh)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TripError::Validation(format!("{name} must be positive, got {value}")));
            }
        }
        if !(recharge_hours.is_finite() && recharge_hours >= 0.0) {
            return Err(TripError::Validation(format!(
                "rechargeHours must not be negative, got {recharge_hours}"
            )));
        }

        Ok(TripParameters {
            start_place: start_place.to_string(),
            end_place: end_place.to_string(),
            range_km,
            average_speed_kmh,
            recharge_hours,
        })
    }
}

/// A validated trip request.
#[derive(Debug, Clone, PartialEq)]
pub struct TripParameters {
    pub start_place: String,
    pub end_place: String,
    pub range_km: f64,
    pub average_speed_kmh: f64,
    pub recharge_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    /// Whole kilometres.
    pub distance_km: f64,
    /// Rounded to one decimal.
    pub travel_time_hours: f64,
    pub stop_count: usize,
    pub stops_required: usize,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripResponse {
    pub start_place: String,
    pub end_place: String,
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub distance_km: f64,
    pub travel_time_hours: f64,
    pub route_coords: Vec<GeoPoint>,
    pub plan: StopPlan,
    pub summary: TripSummary,
}

/// Wires the collaborators and the planning core together.
pub struct TripPlanner<G, R, D, E> {
    geocoder: G,
    router: R,
    directory: D,
    estimator: E,
    config: PlannerConfig,
}

impl<G, R, D, E> TripPlanner<G, R, D, E>
where
    G: Geocoder + Sync,
    R: RouteProvider,
    D: StationDirectory,
    E: TravelTimeEstimator,
{
    pub fn new(geocoder: G, router: R, directory: D, estimator: E, config: PlannerConfig) -> Self {
        Self {
            geocoder,
            router,
            directory,
            estimator,
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans a trip.
    ///
    /// Geocoding, routing and decoding failures abort the request. A
    /// failing station directory or a degenerate corridor leaves the plan
    /// without candidates, and a plan that cannot keep every leg within
    /// range is returned flagged as incomplete.
    pub fn plan_trip(&self, request: &TripRequest) -> Result<TripResponse, TripError> {
        let trip = request.validate(&self.config)?;

        // Only the geocoder is shared across threads.
        let geocoder = &self.geocoder;
        let (start, end) = rayon::join(
            || geocoder.locate(&trip.start_place),
            || geocoder.locate(&trip.end_place),
        );
        let start = start.map_err(|source| TripError::Geocode {
            place: trip.start_place.clone(),
            source,
        })?;
        let end = end.map_err(|source| TripError::Geocode {
            place: trip.end_place.clone(),
            source,
        })?;

        let geometry = self.router.route(start, end).map_err(TripError::Route)?;
        let route = Route::try_from(polyline::decode(
            &geometry.encoded_polyline,
            geometry.precision,
        )?)?;
        let distance_km = if geometry.distance_km.is_finite() && geometry.distance_km > 0.0 {
            geometry.distance_km
        } else {
            route.total_length_km()
        };
        debug!(
            points = route.points().len(),
            distance_km,
            route_length_km = route.total_length_km(),
            "route decoded"
        );

        let candidates = self.find_candidates(&route);
        let plan = planner::plan(candidates, distance_km, trip.range_km, &self.config.plan_options())?;

        let travel_time_hours = estimate_or_fallback(
            &self.estimator,
            &TravelTimeRequest {
                distance_km,
                average_speed_kmh: trip.average_speed_kmh,
                range_km: trip.range_km,
                recharge_hours: trip.recharge_hours,
            },
        );

        let summary = TripSummary {
            distance_km: distance_km.round(),
            travel_time_hours: (travel_time_hours * 10.0).round() / 10.0,
            stop_count: plan.stops.len(),
            stops_required: plan.stops_required,
            complete: plan.is_complete(),
        };
        info!(
            start = %trip.start_place,
            end = %trip.end_place,
            distance_km = summary.distance_km,
            stops = summary.stop_count,
            complete = summary.complete,
            "trip planned"
        );

        Ok(TripResponse {
            start_place: trip.start_place,
            end_place: trip.end_place,
            start,
            end,
            distance_km,
            travel_time_hours,
            route_coords: route.points().to_vec(),
            plan,
            summary,
        })
    }

    fn find_candidates(&self, route: &Route) -> Vec<ProjectedCandidate> {
        let Some(corridor) = build_corridor(route, &self.config.corridor_options()) else {
            warn!("degenerate corridor, planning without stations");
            return Vec::new();
        };

        let records = match self.directory.stations_within(&corridor) {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "station lookup failed, planning without stations");
                return Vec::new();
            }
        };

        let projected = stations::project_candidates(route, stations::normalize(records));
        if self.config.apply_filter {
            stations::filter(projected, &self.config.candidate_filter())
        } else {
            projected
        }
    }
}
