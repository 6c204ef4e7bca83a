//! Trip duration estimate with a local fallback.

use tracing::warn;

use crate::error::ProviderError;
use crate::traits::{TravelTimeEstimator, TravelTimeRequest};

/// Local estimate: driving time at average speed plus one charging session
/// per started range-length of the trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackFormula;

impl FallbackFormula {
    pub fn hours(request: &TravelTimeRequest) -> f64 {
        let driving = request.distance_km / request.average_speed_kmh;
        let sessions = (request.distance_km / request.range_km).ceil();
        driving + sessions * request.recharge_hours
    }
}

impl TravelTimeEstimator for FallbackFormula {
    fn estimate_hours(&self, request: &TravelTimeRequest) -> Result<f64, ProviderError> {
        Ok(Self::hours(request))
    }
}

/// Asks the estimator, substituting [`FallbackFormula`] when it fails or
/// answers with a negative or non-finite duration.
pub fn estimate_or_fallback<E>(estimator: &E, request: &TravelTimeRequest) -> f64
where
    E: TravelTimeEstimator + ?Sized,
{
    match estimator.estimate_hours(request) {
        Ok(hours) if hours.is_finite() && hours >= 0.0 => hours,
        Ok(hours) => {
            warn!(hours, "travel-time estimate unusable, using fallback formula");
            FallbackFormula::hours(request)
        }
        Err(err) => {
            warn!(error = %err, "travel-time estimator failed, using fallback formula");
            FallbackFormula::hours(request)
        }
    }
}
