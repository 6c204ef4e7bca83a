//! Search corridor around a route.
//!
//! The corridor is only a geographic filter for the station directory, so
//! it must enclose everything within the requested width of the route but
//! may be larger. It is the union of one capsule per route segment, each
//! capsule being the hull of two polygonal disks built in their vertex's own
//! planar frame. The union is then reduced to a vertex budget with steps
//! that only ever grow the polygon.

use geo::{
    BooleanOps, Contains, ConvexHull, Intersects, Line, LineString, MultiPoint, MultiPolygon, Point, Polygon,
    SimplifyIdx, Triangle,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::haversine::{LocalFrame, haversine_km};
use crate::point::GeoPoint;
use crate::route::Route;

pub const DEFAULT_CORRIDOR_WIDTH_KM: f64 = 20.0;
pub const DEFAULT_MAX_VERTICES: usize = 50;
pub const DEFAULT_ARC_SEGMENTS: usize = 16;

/// Route simplification tolerance as a fraction of the corridor width.
const SIMPLIFY_FRACTION: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct CorridorOptions {
    /// Half-width of the corridor on each side of the route.
    pub width_km: f64,
    /// Maximum number of distinct ring vertices (the closing vertex is extra).
    pub max_vertices: usize,
    /// Sides of the polygon approximating the disk at each route vertex.
    pub arc_segments: usize,
}

impl Default for CorridorOptions {
    fn default() -> Self {
        Self {
            width_km: DEFAULT_CORRIDOR_WIDTH_KM,
            max_vertices: DEFAULT_MAX_VERTICES,
            arc_segments: DEFAULT_ARC_SEGMENTS,
        }
    }
}

/// Geographic filter sent to the station directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Corridor {
    /// Closed ring, first vertex repeated as last.
    Polygon { ring: Vec<GeoPoint> },
    #[serde(rename_all = "camelCase")]
    Circle { center: GeoPoint, radius_km: f64 },
}

impl Corridor {
    pub fn ring(&self) -> Option<&[GeoPoint]> {
        match self {
            Corridor::Polygon { ring } => Some(ring),
            Corridor::Circle { .. } => None,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        match self {
            Corridor::Polygon { ring } => {
                let exterior: Vec<(f64, f64)> = ring.iter().map(|p| (p.lng, p.lat)).collect();
                Polygon::new(exterior.into(), vec![]).contains(&Point::new(point.lng, point.lat))
            }
            Corridor::Circle { center, radius_km } => haversine_km(*center, point) <= *radius_km,
        }
    }

    /// Well-known text of a polygon corridor (`POLYGON((lng lat, ...))`).
    pub fn to_wkt(&self) -> Option<String> {
        let ring = self.ring()?;
        let coords = ring
            .iter()
            .map(|p| format!("{:.6} {:.6}", p.lng, p.lat))
            .collect::<Vec<_>>()
            .join(",");
        Some(format!("POLYGON(({}))", coords))
    }
}

/// Builds a polygon enclosing every point within `width_km` of the route.
///
/// Returns `None` when no valid ring can be formed (fewer than three
/// vertices, or a non-positive width); callers treat that as a search that
/// finds nothing.
pub fn build_corridor(route: &Route, options: &CorridorOptions) -> Option<Corridor> {
    if !(options.width_km.is_finite() && options.width_km > 0.0) {
        debug!(width_km = options.width_km, "corridor width is not positive");
        return None;
    }

    let frame = LocalFrame::new(route.center());
    let (anchors, slack_km) = simplified_anchors(route, &frame, options.width_km * SIMPLIFY_FRACTION);

    // Circumscribe the disk so the polygonal approximation never undercuts it.
    let sides = options.arc_segments.max(3);
    let radius_km = (options.width_km + slack_km) / (std::f64::consts::PI / sides as f64).cos();
    let disks: Vec<Vec<(f64, f64)>> = anchors.iter().map(|p| disk(*p, radius_km, sides)).collect();

    let capsules: Vec<MultiPolygon<f64>> = disks
        .windows(2)
        .map(|pair| {
            let hull: MultiPoint<f64> = pair[0].iter().chain(&pair[1]).map(|&(x, y)| Point::new(x, y)).collect();
            MultiPolygon::new(vec![hull.convex_hull()])
        })
        .collect();
    let buffer = union_all(capsules);

    let mut ring = match buffer.0.as_slice() {
        [single] => local_ring(single.exterior(), &frame),
        parts => {
            // Overlapping capsules are always connected; fall back to the hull
            // if rounding split the union.
            debug!(parts = parts.len(), "corridor union is not a single polygon");
            let points: MultiPoint<f64> = disks.iter().flatten().map(|&(x, y)| Point::new(x, y)).collect();
            local_ring(points.convex_hull().exterior(), &frame)
        }
    };
    if ring.len() < 3 {
        debug!(vertices = ring.len(), "degenerate corridor ring");
        return None;
    }
    cap_vertices(&mut ring, options.max_vertices);

    let mut ring: Vec<GeoPoint> = ring.into_iter().map(|p| frame.to_geo(p)).collect();
    ring.push(ring[0]);
    debug!(
        anchors = anchors.len(),
        vertices = ring.len() - 1,
        width_km = options.width_km,
        "built corridor"
    );

    Some(Corridor::Polygon { ring })
}

/// Builds a circle around the route's bounding-box centre that reaches every
/// route vertex plus `width_km`.
pub fn build_circle_corridor(route: &Route, width_km: f64) -> Option<Corridor> {
    if !(width_km.is_finite() && width_km > 0.0) {
        return None;
    }
    let center = route.center();
    let reach = route
        .points()
        .iter()
        .map(|p| haversine_km(center, *p))
        .fold(0.0, f64::max);

    Some(Corridor::Circle {
        center,
        radius_km: reach + width_km,
    })
}

/// Route vertices kept by Douglas-Peucker at `tolerance_km`, and how far the
/// dropped vertices may really lie from the kept polyline.
///
/// The tolerance is measured in the route-wide frame, which understates
/// east-west distances south of its centre by `cos(lat) / cos(centre lat)`.
fn simplified_anchors(route: &Route, frame: &LocalFrame, tolerance_km: f64) -> (Vec<GeoPoint>, f64) {
    let points = route.points();
    let line: LineString<f64> = points.iter().map(|p| frame.to_local(*p)).collect::<Vec<_>>().into();
    let kept = line.simplify_idx(&tolerance_km);
    if kept.len() == points.len() {
        return (points.to_vec(), 0.0);
    }

    let center_cos = frame.origin().lat.to_radians().cos().max(1e-9);
    let stretch = points
        .iter()
        .map(|p| p.lat.to_radians().cos() / center_cos)
        .fold(1.0, f64::max);

    (kept.into_iter().map(|i| points[i]).collect(), tolerance_km * stretch)
}

/// Regular polygon around `center` in its own frame, as `(lng, lat)`.
fn disk(center: GeoPoint, radius_km: f64, sides: usize) -> Vec<(f64, f64)> {
    let frame = LocalFrame::new(center);
    let step = std::f64::consts::TAU / sides as f64;
    (0..sides)
        .map(|k| {
            let angle = step * k as f64;
            let p = frame.to_geo((radius_km * angle.cos(), radius_km * angle.sin()));
            (p.lng, p.lat)
        })
        .collect()
}

fn union_all(mut parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    while parts.len() > 1 {
        parts = parts
            .par_chunks(2)
            .map(|pair| pair[1..].iter().fold(pair[0].clone(), |acc, next| acc.union(next)))
            .collect();
    }
    parts.pop().unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

/// Counter-clockwise ring in the corridor frame, without the closing vertex.
fn local_ring(exterior: &LineString<f64>, frame: &LocalFrame) -> Vec<(f64, f64)> {
    let mut ring: Vec<(f64, f64)> = exterior
        .coords()
        .map(|c| frame.to_local(GeoPoint::new(c.y, c.x)))
        .collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring.dedup();
    if signed_area(&ring) < 0.0 {
        ring.reverse();
    }
    ring
}

/// A step that removes one vertex from the ring and grows the polygon.
#[derive(Debug, Clone, Copy)]
enum Reduction {
    /// Drop a reflex (or flat) vertex, cutting across the notch.
    Cut(usize),
    /// Replace edge `i -> i+1` by the apex where its neighbouring edges meet.
    Extend(usize, (f64, f64)),
}

/// Removes vertices until at most `max_vertices` remain.
///
/// Cheapest step first, by added area. A step is only taken when the ring
/// stays simple, so the polygon only grows and keeps enclosing the buffer.
fn cap_vertices(ring: &mut Vec<(f64, f64)>, max_vertices: usize) {
    let max_vertices = max_vertices.max(3);

    while ring.len() > max_vertices {
        let mut steps = reductions(ring);
        steps.sort_by(|a, b| a.0.total_cmp(&b.0));

        let Some(step) = steps.into_iter().map(|(_, step)| step).find(|step| keeps_simple(ring, *step)) else {
            debug!(vertices = ring.len(), max_vertices, "corridor ring cannot be reduced further");
            break;
        };

        let n = ring.len();
        match step {
            Reduction::Cut(i) => {
                ring.remove(i);
            }
            Reduction::Extend(i, apex) => {
                ring[i] = apex;
                ring.remove((i + 1) % n);
            }
        }
    }
}

fn reductions(ring: &[(f64, f64)]) -> Vec<(f64, Reduction)> {
    let n = ring.len();
    let mut steps = Vec::with_capacity(2 * n);

    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let next = ring[(i + 2) % n];

        if cross(sub(a, prev), sub(b, a)) <= 0.0 {
            steps.push((triangle_area(prev, a, b), Reduction::Cut(i)));
        }

        let Some(apex) = line_intersection(prev, a, next, b) else {
            continue;
        };
        // The apex must lie past `a` and past `b` along their incoming edges,
        // on the outer side of `a -> b`.
        let beyond_a = dot(sub(apex, a), sub(a, prev));
        let beyond_b = dot(sub(apex, b), sub(b, next));
        if beyond_a < 0.0 || beyond_b < 0.0 || cross(sub(b, a), sub(apex, a)) > 0.0 {
            continue;
        }
        steps.push((triangle_area(a, apex, b), Reduction::Extend(i, apex)));
    }

    steps
}

/// True when applying `step` leaves the ring without self-intersections.
///
/// New edges meet the edges incident to the changed vertices only at those
/// vertices, so every other edge must stay clear of them, and no other
/// vertex may end up inside the added triangle.
fn keeps_simple(ring: &[(f64, f64)], step: Reduction) -> bool {
    let n = ring.len();
    let (new_edges, added, changed) = match step {
        Reduction::Cut(i) => {
            let (p, q) = ((i + n - 1) % n, (i + 1) % n);
            (
                vec![Line::new(ring[p], ring[q])],
                Triangle::new(ring[p].into(), ring[i].into(), ring[q].into()),
                vec![p, i, q],
            )
        }
        Reduction::Extend(i, apex) => {
            let b = (i + 1) % n;
            (
                vec![Line::new(ring[i], apex), Line::new(apex, ring[b])],
                Triangle::new(ring[i].into(), apex.into(), ring[b].into()),
                vec![i, b],
            )
        }
    };

    (0..n).all(|j| {
        let k = (j + 1) % n;
        let incident = changed.contains(&j) || changed.contains(&k);
        let edge = Line::new(ring[j], ring[k]);
        (incident || !new_edges.iter().any(|new_edge| new_edge.intersects(&edge)))
            && (changed.contains(&j) || !added.contains(&Point::from(ring[j])))
    })
}

fn sub(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    (a.0 - b.0, a.1 - b.1)
}

fn dot(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.0 + a.1 * b.1
}

fn cross(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.1 - a.1 * b.0
}

fn triangle_area(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    cross(sub(b, a), sub(c, a)).abs() / 2.0
}

fn signed_area(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    (0..n).map(|i| cross(ring[i], ring[(i + 1) % n])).sum::<f64>() / 2.0
}

/// Intersection of the infinite lines through `p1, p2` and `p3, p4`.
fn line_intersection(
    p1: (f64, f64),
    p2: (f64, f64),
    p3: (f64, f64),
    p4: (f64, f64),
) -> Option<(f64, f64)> {
    let d1 = sub(p2, p1);
    let d2 = sub(p4, p3);
    let denom = cross(d1, d2);
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = cross(sub(p3, p1), d2) / denom;
    Some((p1.0 + t * d1.0, p1.1 + t * d1.1))
}
