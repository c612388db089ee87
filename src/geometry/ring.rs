//! Ring primitives: containment, closure and validation.

use serde::{Deserialize, Serialize};

/// Minimum number of positions of a valid closed ring
pub const MIN_RING_POSITIONS: usize = 4;

/// A planar position (`x` = longitude, `y` = latitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Builds a coordinate from WGS84 latitude/longitude.
    pub fn from_lat_lon(latitude: f64, longitude: f64) -> Self {
        Self {
            x: longitude,
            y: latitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl TryFrom<Vec<f64>> for Coord {
    type Error = String;

    // GeoJSON positions may carry a third (altitude) member, which is ignored.
    fn try_from(position: Vec<f64>) -> Result<Self, Self::Error> {
        match position.as_slice() {
            [x, y, ..] => Ok(Self::new(*x, *y)),
            _ => Err(format!(
                "position needs at least 2 members, got {}",
                position.len()
            )),
        }
    }
}

impl From<Coord> for [f64; 2] {
    fn from(c: Coord) -> Self {
        [c.x, c.y]
    }
}

/// Ray-casting containment test.
///
/// Casts a horizontal ray from `point` towards +x and counts the ring edges
/// it crosses; an odd count means inside. Points exactly on an edge may
/// resolve either way.
pub fn contains_point(ring: &[Coord], point: Coord) -> bool {
    let mut inside = false;
    let Some(mut j) = ring.len().checked_sub(1) else {
        return false;
    };

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);

        let intersects = ((yi > point.y) != (yj > point.y))
            && (point.x < (xj - xi) * (point.y - yi) / (yj - yi) + xi);
        if intersects {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Closes `ring` in place.
///
/// Returns `true` if the first and last positions already coincided.
/// Otherwise the first position is appended and `false` is returned.
/// An empty ring is left untouched and reported as not closed.
pub fn close_ring(ring: &mut Vec<Coord>) -> bool {
    let (first, last) = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return false,
    };

    if first == last && ring.len() > 1 {
        return true;
    }

    ring.push(first);
    false
}

/// Returns whether `ring` is usable by [`contains_point`]: at least
/// [`MIN_RING_POSITIONS`] finite positions, first equal to last.
pub fn validate_ring(ring: &[Coord]) -> bool {
    ring.len() >= MIN_RING_POSITIONS
        && ring.iter().all(Coord::is_finite)
        && ring.first() == ring.last()
}
