//! Charging-station candidates: normalization of directory records,
//! projection onto the route and the optional corridor/power filter.

use std::cmp::Ordering;
use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corridor::DEFAULT_CORRIDOR_WIDTH_KM;
use crate::point::GeoPoint;
use crate::route::{Route, RouteProjection};

/// Power assigned to stations whose rating is missing or unreadable.
pub const DEFAULT_POWER_KW: f64 = 3.0;

/// Operator name used when a record names neither brand nor operator.
pub const DEFAULT_OPERATOR: &str = "Public";

/// Power rating as published by a directory: numeric or free text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PowerField {
    Number(f64),
    Text(String),
}

/// A directory record before normalization. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStationRecord {
    pub id: Option<String>,
    /// `(lat, lng)` in decimal degrees.
    pub coordinates: Option<(f64, f64)>,
    pub power: Option<PowerField>,
    /// Commercial brand shown to drivers.
    pub brand: Option<String>,
    /// Company operating the site.
    pub site_operator: Option<String>,
}

/// A usable charging station.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationCandidate {
    pub id: String,
    pub location: GeoPoint,
    pub power_kw: f64,
    pub operator_name: String,
}

/// A station together with its position along the route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedCandidate {
    #[serde(flatten)]
    pub station: StationCandidate,
    #[serde(flatten)]
    pub projection: RouteProjection,
}

impl ProjectedCandidate {
    pub fn arc_length_km(&self) -> f64 {
        self.projection.arc_length_km
    }

    pub fn perpendicular_distance_km(&self) -> f64 {
        self.projection.perpendicular_distance_km
    }

    /// Route order: arc length, then distance to the route, then id.
    pub fn route_order(&self, other: &Self) -> Ordering {
        self.arc_length_km()
            .total_cmp(&other.arc_length_km())
            .then_with(|| {
                self.perpendicular_distance_km()
                    .total_cmp(&other.perpendicular_distance_km())
            })
            .then_with(|| self.station.id.cmp(&other.station.id))
    }
}

/// Optional policy applied after projection.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    /// Candidates farther than this from the route are dropped.
    pub corridor_width_km: f64,
    /// Candidates weaker than this are dropped.
    pub min_power_kw: f64,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            corridor_width_km: DEFAULT_CORRIDOR_WIDTH_KM,
            min_power_kw: DEFAULT_POWER_KW,
        }
    }
}

/// Converts raw records into candidates.
///
/// Records without a valid coordinate pair are dropped. Missing ids are
/// synthesized from the record's position in the input; a repeated id
/// keeps its first record.
pub fn normalize<I>(records: I) -> Vec<StationCandidate>
where
    I: IntoIterator<Item = RawStationRecord>,
{
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    let mut without_location = 0usize;
    let mut duplicates = 0usize;

    for (index, record) in records.into_iter().enumerate() {
        let Some(location) = record
            .coordinates
            .and_then(|(lat, lng)| GeoPoint::validated(lat, lng).ok())
        else {
            without_location += 1;
            continue;
        };

        let id = non_blank(record.id).unwrap_or_else(|| format!("station-{index}"));
        if !seen.insert(id.clone()) {
            duplicates += 1;
            continue;
        }

        let operator_name = non_blank(record.brand)
            .or_else(|| non_blank(record.site_operator))
            .unwrap_or_else(|| DEFAULT_OPERATOR.to_string());

        candidates.push(StationCandidate {
            id,
            location,
            power_kw: power_kw(record.power.as_ref()),
            operator_name,
        });
    }

    debug!(
        kept = candidates.len(),
        without_location, duplicates, "normalized station records"
    );
    candidates
}

/// Projects every candidate onto the route, preserving input order.
pub fn project_candidates(route: &Route, candidates: Vec<StationCandidate>) -> Vec<ProjectedCandidate> {
    candidates
        .into_par_iter()
        .map(|station| {
            let projection = route.project(station.location);
            ProjectedCandidate {
                station,
                projection,
            }
        })
        .collect()
}

/// Drops candidates outside the corridor width or below the power floor.
pub fn filter(candidates: Vec<ProjectedCandidate>, policy: &CandidateFilter) -> Vec<ProjectedCandidate> {
    let before = candidates.len();
    let kept: Vec<_> = candidates
        .into_iter()
        .filter(|c| {
            c.perpendicular_distance_km() <= policy.corridor_width_km
                && c.station.power_kw >= policy.min_power_kw
        })
        .collect();
    debug!(before, after = kept.len(), "filtered candidates");
    kept
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn power_kw(field: Option<&PowerField>) -> f64 {
    let value = match field {
        Some(PowerField::Number(n)) => Some(*n),
        Some(PowerField::Text(text)) => leading_number(text),
        None => None,
    };
    value
        .filter(|kw| kw.is_finite() && *kw > 0.0)
        .unwrap_or(DEFAULT_POWER_KW)
}

/// Parses the leading decimal number of a string (`"22 kW"` -> 22).
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let fraction_start = end + 1;
        let mut fraction_end = fraction_start;
        while fraction_end < bytes.len() && bytes[fraction_end].is_ascii_digit() {
            fraction_end += 1;
        }
        digits += fraction_end - fraction_start;
        if digits > 0 {
            end = fraction_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, lat: f64, lng: f64) -> RawStationRecord {
        RawStationRecord {
            id: Some(id.to_string()),
            coordinates: Some((lat, lng)),
            ..RawStationRecord::default()
        }
    }

    #[test]
    fn test_drops_records_without_coordinates() {
        let records = vec![
            record("a", 45.0, 3.0),
            RawStationRecord {
                id: Some("b".into()),
                ..RawStationRecord::default()
            },
            record("c", 95.0, 3.0),
        ];
        let candidates = normalize(records);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "a");
    }

    #[test]
    fn test_power_defaults_and_parsing() {
        let with_power = |power| RawStationRecord {
            power,
            ..record("x", 45.0, 3.0)
        };
        let cases = [
            (None, 3.0),
            (Some(PowerField::Number(50.0)), 50.0),
            (Some(PowerField::Number(0.0)), 3.0),
            (Some(PowerField::Number(-7.0)), 3.0),
            (Some(PowerField::Text("22".into())), 22.0),
            (Some(PowerField::Text(" 7.4 kW".into())), 7.4),
            (Some(PowerField::Text("n/a".into())), 3.0),
            (Some(PowerField::Text("".into())), 3.0),
        ];
        for (power, expected) in cases {
            let candidates = normalize(vec![with_power(power.clone())]);
            assert_eq!(candidates[0].power_kw, expected, "power {:?}", power);
        }
    }

    #[test]
    fn test_operator_name_precedence() {
        let base = record("x", 45.0, 3.0);
        let named = |brand: Option<&str>, site_operator: Option<&str>| RawStationRecord {
            brand: brand.map(str::to_string),
            site_operator: site_operator.map(str::to_string),
            ..base.clone()
        };

        assert_eq!(normalize(vec![named(Some("Ionity"), Some("Allego"))])[0].operator_name, "Ionity");
        assert_eq!(normalize(vec![named(Some("  "), Some("Allego"))])[0].operator_name, "Allego");
        assert_eq!(normalize(vec![named(None, None)])[0].operator_name, DEFAULT_OPERATOR);
    }

    #[test]
    fn test_synthesized_and_duplicate_ids() {
        let records = vec![
            RawStationRecord {
                id: None,
                ..record("", 45.0, 3.0)
            },
            record("dup", 45.1, 3.0),
            record("dup", 45.2, 3.0),
            record(" ", 45.3, 3.0),
        ];
        let ids: Vec<_> = normalize(records).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["station-0", "dup", "station-3"]);
    }

    #[test]
    fn test_project_and_filter() {
        let route = Route::new(vec![GeoPoint::new(45.0, 3.0), GeoPoint::new(45.0, 4.0)]).unwrap();
        let mut near = record("near", 45.05, 3.5);
        near.power = Some(PowerField::Number(50.0));
        let mut far = record("far", 45.5, 3.5);
        far.power = Some(PowerField::Number(50.0));
        let weak = record("weak", 45.01, 3.2);

        let projected = project_candidates(&route, normalize(vec![near, far, weak]));
        assert_eq!(projected.len(), 3);
        assert_eq!(projected[0].station.id, "near");
        assert!(projected[0].arc_length_km() > 38.0 && projected[0].arc_length_km() < 41.0);

        let policy = CandidateFilter {
            corridor_width_km: 20.0,
            min_power_kw: 22.0,
        };
        let kept = filter(projected, &policy);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].station.id, "near");
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("150"), Some(150.0));
        assert_eq!(leading_number("3.7kW"), Some(3.7));
        assert_eq!(leading_number(".5"), Some(0.5));
        assert_eq!(leading_number("1e2x"), Some(100.0));
        assert_eq!(leading_number("1e"), Some(1.0));
        assert_eq!(leading_number("-"), None);
        assert_eq!(leading_number("kW"), None);
    }
}
