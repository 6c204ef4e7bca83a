//! Decoded route with arc-length bookkeeping and point projection.

use geo::{Closest, ClosestPoint, Line, Point};
use serde::Serialize;

use crate::error::PlanError;
use crate::haversine::{LocalFrame, haversine_km};
use crate::point::GeoPoint;
use crate::polyline::Polyline;

/// An immutable route of at least two points, in travel order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    points: Vec<GeoPoint>,
    /// Arc length at each vertex; `cumulative_km[0] == 0`.
    #[serde(skip)]
    cumulative_km: Vec<f64>,
}

/// Where a point lands on a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteProjection {
    /// Distance travelled along the route to the closest point.
    pub arc_length_km: f64,
    /// Distance from the point to that closest point.
    pub perpendicular_distance_km: f64,
}

impl Route {
    pub fn new(points: Vec<GeoPoint>) -> Result<Self, PlanError> {
        if points.len() < 2 {
            return Err(PlanError::DegenerateRoute {
                points: points.len(),
            });
        }

        let mut cumulative_km = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative_km.push(total);
        for pair in points.windows(2) {
            total += haversine_km(pair[0], pair[1]);
            cumulative_km.push(total);
        }

        Ok(Self {
            points,
            cumulative_km,
        })
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn cumulative_km(&self) -> &[f64] {
        &self.cumulative_km
    }

    pub fn total_length_km(&self) -> f64 {
        self.cumulative_km.last().copied().unwrap_or(0.0)
    }

    /// South-west and north-east corners of the route's bounding box.
    pub fn bounding_box(&self) -> (GeoPoint, GeoPoint) {
        let first = self.points[0];
        let (mut south, mut west, mut north, mut east) = (first.lat, first.lng, first.lat, first.lng);
        for point in &self.points[1..] {
            south = south.min(point.lat);
            north = north.max(point.lat);
            west = west.min(point.lng);
            east = east.max(point.lng);
        }
        (GeoPoint::new(south, west), GeoPoint::new(north, east))
    }

    /// Centre of the bounding box.
    pub fn center(&self) -> GeoPoint {
        let (south_west, north_east) = self.bounding_box();
        GeoPoint::new(
            (south_west.lat + north_east.lat) / 2.0,
            (south_west.lng + north_east.lng) / 2.0,
        )
    }

    /// Projects a point onto the closest position along the route.
    ///
    /// Each segment is treated as a straight line in a planar frame centred
    /// on its start vertex. When two segments are equally close the earlier
    /// one wins, so a point near a hairpin reports the first pass.
    pub fn project(&self, point: GeoPoint) -> RouteProjection {
        let mut best: Option<RouteProjection> = None;

        for (index, pair) in self.points.windows(2).enumerate() {
            let (start, end) = (pair[0], pair[1]);
            let frame = LocalFrame::new(start);
            let segment = Line::new(frame.to_local(start), frame.to_local(end));
            let closest = match segment.closest_point(&Point::from(frame.to_local(point))) {
                Closest::SinglePoint(p) | Closest::Intersection(p) => frame.to_geo(p.x_y()),
                Closest::Indeterminate => start,
            };
            let distance = haversine_km(point, closest);

            if best.is_none_or(|b| distance < b.perpendicular_distance_km) {
                best = Some(RouteProjection {
                    arc_length_km: self.cumulative_km[index] + haversine_km(start, closest),
                    perpendicular_distance_km: distance,
                });
            }
        }

        // Route::new guarantees at least one segment.
        let mut projection = best.unwrap_or(RouteProjection {
            arc_length_km: 0.0,
            perpendicular_distance_km: haversine_km(point, self.points[0]),
        });
        projection.arc_length_km = projection.arc_length_km.clamp(0.0, self.total_length_km());
        projection
    }
}

impl TryFrom<Polyline> for Route {
    type Error = PlanError;

    fn try_from(polyline: Polyline) -> Result<Self, Self::Error> {
        Route::new(polyline.into_points())
    }
}
