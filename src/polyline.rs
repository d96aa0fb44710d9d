//! Encoded polyline codec and the decoded route geometry type.
//!
//! Directions services hand back paths in the compact polyline format
//! (signed deltas, zig-zag encoded, 5-bit groups offset by 63, factor 1e5).
//! Decoding happens once at the boundary; everything downstream works with
//! [`Polyline`] coordinates.

use serde::{Deserialize, Serialize};

use crate::itinerary::Coordinate;

const PRECISION: f64 = 100_000.0;

/// Valid coordinates never need more than seven 5-bit groups per value.
const MAX_SHIFT: u32 = 30;

/// A route geometry as decoded coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinate>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self { points }
    }

    /// Decodes an encoded polyline. Malformed input yields an empty polyline.
    pub fn from_encoded(encoded: &str) -> Self {
        Self::new(decode(encoded))
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn encode(&self) -> String {
        encode(&self.points)
    }
}

/// Decodes an encoded polyline string into coordinates.
///
/// Returns an empty vector for empty or malformed input (characters outside
/// the encoding alphabet, a truncated value, or a latitude with no matching
/// longitude).
pub fn decode(encoded: &str) -> Vec<Coordinate> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let Some(dlat) = next_value(bytes, &mut index) else {
            return Vec::new();
        };
        let Some(dlng) = next_value(bytes, &mut index) else {
            return Vec::new();
        };
        lat += dlat;
        lng += dlng;
        points.push(Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    points
}

/// Reads one zig-zag encoded delta starting at `index`.
fn next_value(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes.get(*index)?;
        *index += 1;
        if !(63..=126).contains(&byte) {
            return None;
        }
        let chunk = i64::from(byte - 63);
        if shift > MAX_SHIFT {
            return None;
        }
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Some(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

/// Encodes coordinates into the polyline format.
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lng * PRECISION).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn push_value(out: &mut String, delta: i64) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= 0x20 {
        out.push(char::from((0x20 | (value & 0x1f)) as u8 + 63));
        value >>= 5;
    }
    out.push(char::from(value as u8 + 63));
}
