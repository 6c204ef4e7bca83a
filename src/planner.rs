//! Charging-stop planner (greedy forward selection).
//!
//! Candidates are scanned in route order. A candidate becomes the next stop
//! when it lies at least `range_km * safety_margin` past the previous stop
//! and fewer than the required number of stops have been picked. The scan
//! never backtracks, so the result is not guaranteed to keep every leg
//! within range; the plan records every leg that exceeds it.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PlanError;
use crate::stations::ProjectedCandidate;

/// Default fraction of the range used as minimum spacing between stops.
pub const DEFAULT_SAFETY_MARGIN: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Minimum spacing between stops as a fraction of range, in `(0, 1]`.
    pub safety_margin: f64,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }
}

/// A selected charging stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedStop {
    #[serde(flatten)]
    pub candidate: ProjectedCandidate,
    /// 1-based position in the plan.
    pub sequence_number: usize,
}

impl PlannedStop {
    pub fn arc_length_km(&self) -> f64 {
        self.candidate.arc_length_km()
    }
}

/// A leg of the planned trip that is longer than the vehicle's range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegGap {
    pub from_km: f64,
    pub to_km: f64,
    pub length_km: f64,
}

/// Whether every leg of a plan fits within range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Feasibility {
    Complete,
    Incomplete { gaps: Vec<LegGap> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPlan {
    pub stops: Vec<PlannedStop>,
    /// Recharges needed if every leg were driven at exactly full range.
    pub stops_required: usize,
    pub feasibility: Feasibility,
}

impl StopPlan {
    pub fn is_complete(&self) -> bool {
        matches!(self.feasibility, Feasibility::Complete)
    }

    /// Legs exceeding the range; empty for a complete plan.
    pub fn gaps(&self) -> &[LegGap] {
        match &self.feasibility {
            Feasibility::Complete => &[],
            Feasibility::Incomplete { gaps } => gaps,
        }
    }
}

/// Number of intermediate recharges for a trip, `max(0, ceil(d / r) - 1)`.
pub fn stops_required(distance_km: f64, range_km: f64) -> usize {
    let legs = (distance_km / range_km).ceil();
    if legs > 1.0 { legs as usize - 1 } else { 0 }
}

/// Selects charging stops along the route.
///
/// Candidates need not be sorted. `distance_km` and `range_km` must be
/// finite and positive and the safety margin must lie in `(0, 1]`.
pub fn plan(
    mut candidates: Vec<ProjectedCandidate>,
    distance_km: f64,
    range_km: f64,
    options: &PlanOptions,
) -> Result<StopPlan, PlanError> {
    ensure_positive("distance_km", distance_km)?;
    ensure_positive("range_km", range_km)?;
    let margin = options.safety_margin;
    if !(margin.is_finite() && margin > 0.0 && margin <= 1.0) {
        return Err(PlanError::InvalidParameter {
            name: "safety_margin",
            value: margin,
        });
    }

    candidates.sort_by(|a, b| a.route_order(b));

    let required = stops_required(distance_km, range_km);
    let min_spacing = range_km * margin;
    let mut stops: Vec<PlannedStop> = Vec::new();
    let mut last_stop_km = 0.0;

    for candidate in candidates {
        if stops.len() >= required {
            break;
        }
        if candidate.arc_length_km() - last_stop_km >= min_spacing {
            last_stop_km = candidate.arc_length_km();
            stops.push(PlannedStop {
                candidate,
                sequence_number: stops.len() + 1,
            });
        }
    }

    let gaps = leg_gaps(&stops, distance_km, range_km);
    debug!(
        stops = stops.len(),
        required,
        gaps = gaps.len(),
        distance_km,
        range_km,
        "planned charging stops"
    );

    let feasibility = if gaps.is_empty() {
        Feasibility::Complete
    } else {
        warn!(
            stops = stops.len(),
            required,
            gaps = gaps.len(),
            "plan leaves legs longer than the vehicle range"
        );
        Feasibility::Incomplete { gaps }
    };

    Ok(StopPlan {
        stops,
        stops_required: required,
        feasibility,
    })
}

fn ensure_positive(name: &'static str, value: f64) -> Result<(), PlanError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlanError::InvalidParameter { name, value })
    }
}

/// Legs from the start through every stop to the destination that exceed
/// the range.
fn leg_gaps(stops: &[PlannedStop], distance_km: f64, range_km: f64) -> Vec<LegGap> {
    let mut gaps = Vec::new();
    let mut from_km = 0.0;

    let waypoints = stops
        .iter()
        .map(PlannedStop::arc_length_km)
        .chain(std::iter::once(distance_km));

    for to_km in waypoints {
        let length_km = (to_km - from_km).max(0.0);
        if length_km > range_km {
            gaps.push(LegGap {
                from_km,
                to_km,
                length_km,
            });
        }
        from_km = from_km.max(to_km);
    }

    gaps
}
