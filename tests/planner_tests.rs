//! Stop planner tests
//!
//! Reference scenarios, feasibility reporting and property tests for the
//! greedy selection.

mod fixtures;

use proptest::prelude::*;

use ev_stop_planner::planner::{Feasibility, LegGap, PlanOptions, StopPlan, plan};
use ev_stop_planner::stations::ProjectedCandidate;

use fixtures::{candidate, candidate_off_route};

fn ids(plan: &StopPlan) -> Vec<&str> {
    plan.stops
        .iter()
        .map(|stop| stop.candidate.station.id.as_str())
        .collect()
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn scenario_a_picks_first_candidate_past_threshold() {
    let candidates = vec![candidate("km50", 50.0), candidate("km260", 260.0), candidate("km490", 490.0)];

    let plan = plan(candidates, 500.0, 300.0, &PlanOptions { safety_margin: 0.8 }).unwrap();

    assert_eq!(plan.stops_required, 1);
    assert_eq!(ids(&plan), vec!["km260"]);
    assert_eq!(plan.stops[0].sequence_number, 1);
    assert_eq!(plan.stops[0].arc_length_km(), 260.0);
    assert!(plan.is_complete());
}

#[test]
fn scenario_b_short_trip_needs_no_stop() {
    let candidates = vec![candidate("a", 10.0), candidate("b", 150.0), candidate("c", 190.0)];

    let plan = plan(candidates, 200.0, 300.0, &PlanOptions::default()).unwrap();

    assert_eq!(plan.stops_required, 0);
    assert!(plan.stops.is_empty());
    assert!(plan.is_complete());
}

#[test]
fn scenario_c_no_candidates_is_flagged_incomplete() {
    let plan = plan(Vec::new(), 700.0, 300.0, &PlanOptions::default()).unwrap();

    assert_eq!(plan.stops_required, 2);
    assert!(plan.stops.is_empty());
    assert_eq!(
        plan.feasibility,
        Feasibility::Incomplete {
            gaps: vec![LegGap {
                from_km: 0.0,
                to_km: 700.0,
                length_km: 700.0,
            }]
        }
    );
}

#[test]
fn no_candidates_on_short_trip_is_complete() {
    let plan = plan(Vec::new(), 250.0, 300.0, &PlanOptions::default()).unwrap();
    assert_eq!(plan.stops_required, 0);
    assert!(plan.is_complete());
}

// ============================================================================
// Feasibility
// ============================================================================

#[test]
fn reports_final_leg_beyond_range() {
    // Only one early stop qualifies; the rest of the trip is out of reach.
    let candidates = vec![candidate("early", 245.0), candidate("close", 300.0)];

    let plan = plan(candidates, 900.0, 300.0, &PlanOptions::default()).unwrap();

    assert_eq!(plan.stops_required, 2);
    assert_eq!(ids(&plan), vec!["early"]);
    assert_eq!(
        plan.gaps(),
        &[LegGap {
            from_km: 245.0,
            to_km: 900.0,
            length_km: 655.0,
        }]
    );
}

#[test]
fn reports_every_gap() {
    let candidates = vec![candidate("a", 320.0), candidate("b", 640.0)];

    let plan = plan(candidates, 960.0, 300.0, &PlanOptions::default()).unwrap();

    assert_eq!(plan.stops_required, 3);
    assert_eq!(ids(&plan), vec!["a", "b"]);
    let lengths: Vec<f64> = plan.gaps().iter().map(|gap| gap.length_km).collect();
    assert_eq!(lengths, vec![320.0, 320.0, 320.0]);
}

#[test]
fn stops_past_reported_distance_leave_no_final_gap() {
    // The decoded route can be slightly longer than the provider's distance.
    let plan = plan(vec![candidate("a", 260.0)], 256.0, 250.0, &PlanOptions::default()).unwrap();

    assert_eq!(plan.stops_required, 1);
    assert_eq!(ids(&plan), vec!["a"]);
    assert!(!plan.is_complete());
    assert_eq!(plan.gaps().len(), 1);
    assert_eq!(plan.gaps()[0].to_km, 260.0);
}

#[test]
fn selected_count_never_exceeds_required() {
    let candidates = (1..=20).map(|i| candidate(&format!("c{i:02}"), i as f64 * 100.0)).collect();

    let plan = plan(candidates, 1000.0, 400.0, &PlanOptions { safety_margin: 0.25 }).unwrap();

    assert_eq!(plan.stops_required, 2);
    assert_eq!(ids(&plan), vec!["c01", "c02"]);
    assert!(!plan.is_complete());
}

#[test]
fn tiny_range_reports_gaps_instead_of_allocating_for_every_stop() {
    let plan_empty = plan(Vec::new(), 1000.0, 1e-9, &PlanOptions::default()).unwrap();

    assert!(plan_empty.stops_required > 1_000_000_000_000 - 2);
    assert!(plan_empty.stops.is_empty());
    assert_eq!(plan_empty.gaps().len(), 1);

    let candidates = vec![candidate("a", 100.0), candidate("b", 200.0), candidate("c", 300.0)];
    let plan = plan(candidates, 1000.0, 1e-300, &PlanOptions::default()).unwrap();

    assert_eq!(plan.stops_required, usize::MAX - 1);
    assert_eq!(ids(&plan), vec!["a", "b", "c"]);
    assert_eq!(plan.gaps().len(), 4);
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn unsorted_input_is_sorted_by_route_order() {
    let candidates = vec![
        candidate_off_route("z", 400.0, 0.5),
        candidate_off_route("y", 250.0, 4.0),
        candidate_off_route("x", 250.0, 2.0),
    ];

    let plan = plan(candidates, 800.0, 300.0, &PlanOptions::default()).unwrap();

    assert_eq!(plan.stops[0].candidate.station.id, "x");
}

// ============================================================================
// Properties
// ============================================================================

fn build(raw: &[(f64, f64)]) -> Vec<ProjectedCandidate> {
    raw.iter()
        .enumerate()
        .map(|(i, &(arc, perpendicular))| candidate_off_route(&format!("s{i:03}"), arc, perpendicular))
        .collect()
}

fn raw_candidates() -> impl Strategy<Value = Vec<(f64, f64)>> {
    // Coarse arc lengths produce plenty of ties.
    prop::collection::vec(((0u32..200).prop_map(|k| k as f64 * 5.0), (0u32..4).prop_map(f64::from)), 0..40)
}

proptest! {
    #[test]
    fn sequence_numbers_follow_arc_length(
        raw in raw_candidates(),
        distance in 1.0..2000.0f64,
        range in 50.0..600.0f64,
        margin in 0.1..=1.0f64,
    ) {
        let plan = plan(build(&raw), distance, range, &PlanOptions { safety_margin: margin }).unwrap();

        for (index, stop) in plan.stops.iter().enumerate() {
            prop_assert_eq!(stop.sequence_number, index + 1);
        }
        for pair in plan.stops.windows(2) {
            prop_assert!(pair[1].arc_length_km() > pair[0].arc_length_km());
        }
        prop_assert!(plan.stops.len() <= plan.stops_required);
    }

    #[test]
    fn accepted_stops_respect_spacing(
        raw in raw_candidates(),
        distance in 1.0..2000.0f64,
        range in 50.0..600.0f64,
        margin in 0.1..=1.0f64,
    ) {
        let plan = plan(build(&raw), distance, range, &PlanOptions { safety_margin: margin }).unwrap();

        let mut last = 0.0;
        for stop in &plan.stops {
            prop_assert!(stop.arc_length_km() - last >= range * margin);
            last = stop.arc_length_km();
        }
    }

    #[test]
    fn completeness_matches_leg_lengths(
        raw in raw_candidates(),
        distance in 1.0..2000.0f64,
        range in 50.0..600.0f64,
    ) {
        let plan = plan(build(&raw), distance, range, &PlanOptions::default()).unwrap();

        let mut waypoints = vec![0.0];
        waypoints.extend(plan.stops.iter().map(|s| s.arc_length_km()));
        waypoints.push(distance);
        let within_range = waypoints.windows(2).all(|leg| leg[1] - leg[0] <= range);

        prop_assert_eq!(plan.is_complete(), within_range);
    }

    #[test]
    fn planning_is_deterministic(
        raw in raw_candidates(),
        distance in 1.0..2000.0f64,
        range in 50.0..600.0f64,
    ) {
        let forward = build(&raw);
        let mut reversed = forward.clone();
        reversed.reverse();

        let first = plan(forward, distance, range, &PlanOptions::default()).unwrap();
        let second = plan(reversed, distance, range, &PlanOptions::default()).unwrap();

        prop_assert_eq!(first, second);
    }
}
