//! Encoded polyline codec.
//!
//! Route providers ship geometry in the compact "encoded polyline" format:
//! each coordinate is scaled by `10^precision`, delta-encoded against the
//! previous point, zig-zag encoded and written as 5-bit groups offset by 63.
//!
//! The precision is not part of the encoding. Google-style producers use 5
//! decimal digits, OSRM's `polyline6` uses 6. Decoding with the wrong value
//! yields coordinates off by a factor of ten without any error, so callers
//! must carry the producer's precision alongside the string.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::point::GeoPoint;

/// Precision used by the Google polyline algorithm.
pub const DEFAULT_PRECISION: u32 = 5;

/// Precision of OSRM `geometries=polyline6`.
pub const POLYLINE6_PRECISION: u32 = 6;

/// Smallest byte of the encoding alphabet (`'?'`).
const ALPHABET_START: u8 = 63;

/// Largest byte of the encoding alphabet (`'~'`).
const ALPHABET_END: u8 = 126;

/// Continuation flag of a 5-bit group.
const CONTINUATION: u64 = 0x20;

/// Largest shift that still fits a 5-bit group into the accumulator.
const MAX_SHIFT: u32 = 55;

/// Bound on scaled coordinates so that zig-zag deltas fit in the 60 bits
/// [`decode`] accepts.
const MAX_SCALED: f64 = (1u64 << 58) as f64;

/// A decoded polyline: coordinates in travel order.
///
/// Unlike [`crate::route::Route`] this may hold fewer than two points
/// (an empty input decodes to an empty polyline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Encodes the points back into the compact string form.
    pub fn encode(&self, precision: u32) -> Result<String, PlanError> {
        encode(&self.points, precision)
    }
}

/// Decodes an encoded polyline at the given precision.
///
/// An empty string yields an empty polyline. Truncated or otherwise
/// inconsistent input is rejected with [`PlanError::MalformedPolyline`]
/// rather than silently cut short.
pub fn decode(encoded: &str, precision: u32) -> Result<Polyline, PlanError> {
    let bytes = encoded.as_bytes();
    let factor = scale(precision);

    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::with_capacity(bytes.len() / 4);

    while index < bytes.len() {
        lat = accumulate(lat, next_delta(bytes, &mut index)?, index)?;
        if index >= bytes.len() {
            return Err(PlanError::MalformedPolyline {
                offset: index,
                reason: "latitude without longitude",
            });
        }
        lng = accumulate(lng, next_delta(bytes, &mut index)?, index)?;

        points.push(GeoPoint::new(lat as f64 / factor, lng as f64 / factor));
    }

    Ok(Polyline::new(points))
}

/// Same as [`decode`], treating a missing input as empty.
pub fn decode_optional(encoded: Option<&str>, precision: u32) -> Result<Polyline, PlanError> {
    decode(encoded.unwrap_or_default(), precision)
}

/// Encodes points at the given precision.
///
/// Points must be valid coordinates, and the precision small enough that
/// every scaled coordinate stays within the encodable range.
pub fn encode(points: &[GeoPoint], precision: u32) -> Result<String, PlanError> {
    let factor = scale(precision);
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        if !point.is_valid() {
            return Err(PlanError::InvalidCoordinate {
                lat: point.lat,
                lng: point.lng,
            });
        }
        let lat = scaled(point.lat, factor, precision)?;
        let lng = scaled(point.lng, factor, precision)?;
        push_value(lat - prev_lat, &mut out);
        push_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    Ok(out)
}

fn scale(precision: u32) -> f64 {
    10f64.powi(precision as i32)
}

fn scaled(value: f64, factor: f64, precision: u32) -> Result<i64, PlanError> {
    let value = (value * factor).round();
    if !(value.abs() < MAX_SCALED) {
        return Err(PlanError::InvalidParameter {
            name: "precision",
            value: f64::from(precision),
        });
    }
    Ok(value as i64)
}

fn accumulate(total: i64, delta: i64, offset: usize) -> Result<i64, PlanError> {
    total.checked_add(delta).ok_or(PlanError::MalformedPolyline {
        offset,
        reason: "coordinate overflow",
    })
}

/// Reads one zig-zag varint starting at `index` and advances past it.
fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, PlanError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(PlanError::MalformedPolyline {
                offset: *index,
                reason: "truncated varint",
            });
        };
        if !(ALPHABET_START..=ALPHABET_END).contains(&byte) {
            return Err(PlanError::MalformedPolyline {
                offset: *index,
                reason: "byte outside encoding alphabet",
            });
        }
        if shift > MAX_SHIFT {
            return Err(PlanError::MalformedPolyline {
                offset: *index,
                reason: "varint too long",
            });
        }
        *index += 1;

        let chunk = u64::from(byte - ALPHABET_START);
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < CONTINUATION {
            break;
        }
    }

    let value = (result >> 1) as i64;
    Ok(if result & 1 == 1 { !value } else { value })
}

fn push_value(delta: i64, out: &mut String) {
    let mut value = (if delta < 0 { !(delta << 1) } else { delta << 1 }) as u64;
    while value >= CONTINUATION {
        out.push(char::from((CONTINUATION | (value & 0x1f)) as u8 + ALPHABET_START));
        value >>= 5;
    }
    out.push(char::from(value as u8 + ALPHABET_START));
}
