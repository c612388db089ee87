//! Polygon and MultiPolygon geometries in GeoJSON layout.

use serde::{Deserialize, Serialize};

use super::errors::{GeometryError, GeometryResult};
use super::ring::{close_ring, validate_ring, Coord, MIN_RING_POSITIONS};

/// Region geometry.
///
/// Serialized exactly like a GeoJSON geometry object:
/// `{"type": "Polygon", "coordinates": [[[x, y], ...], ...]}`.
/// The first ring of every polygon is its exterior ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
}

impl Geometry {
    /// Closes every ring that is not already closed.
    ///
    /// Returns the number of rings that had to be closed.
    pub fn close_rings(&mut self) -> usize {
        let mut closed = 0;
        for polygon in self.polygons_mut() {
            for ring in polygon.iter_mut() {
                if !ring.is_empty() && !close_ring(ring) {
                    closed += 1;
                }
            }
        }
        closed
    }

    /// Checks the geometry without modifying it.
    ///
    /// A Polygon is valid when all of its rings are valid. A MultiPolygon is
    /// valid when the exterior ring of every member is valid; members are
    /// checked independently and the first failure is reported.
    pub fn validate(&self) -> GeometryResult<()> {
        match self {
            Geometry::Polygon(rings) => check_rings(0, rings, rings.len()),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .enumerate()
                .try_for_each(|(idx, rings)| check_rings(idx, rings, 1)),
        }
    }

    /// Closes rings, then drops what cannot be used for containment.
    ///
    /// Only exterior rings take part in lookup. A polygon whose exterior ring
    /// is unusable is dropped (a Polygon is emptied, MultiPolygon members go
    /// one by one); an unusable hole is removed and its polygon kept. The
    /// returned diagnostics list every rejection.
    pub fn normalize(&mut self) -> Vec<GeometryError> {
        self.close_rings();

        let mut rejected = Vec::new();
        match self {
            Geometry::Polygon(rings) => {
                if !keep_polygon(0, rings, &mut rejected) {
                    rings.clear();
                }
            }
            Geometry::MultiPolygon(polygons) => {
                let mut idx = 0;
                polygons.retain_mut(|rings| {
                    let keep = keep_polygon(idx, rings, &mut rejected);
                    idx += 1;
                    keep
                });
            }
        }
        rejected
    }

    /// Exterior rings in declaration order.
    pub fn exterior_rings(&self) -> Vec<&[Coord]> {
        match self {
            Geometry::Polygon(rings) => rings.first().map(Vec::as_slice).into_iter().collect(),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .filter_map(|rings| rings.first().map(Vec::as_slice))
                .collect(),
        }
    }

    /// Whether no usable exterior ring remains.
    pub fn is_empty(&self) -> bool {
        self.exterior_rings().is_empty()
    }

    fn polygons_mut(&mut self) -> Vec<&mut Vec<Vec<Coord>>> {
        match self {
            Geometry::Polygon(rings) => vec![rings],
            Geometry::MultiPolygon(polygons) => polygons.iter_mut().collect(),
        }
    }
}

/// Checks the exterior ring and strips unusable holes.
///
/// Returns false when the exterior ring itself is unusable.
fn keep_polygon(polygon: usize, rings: &mut Vec<Vec<Coord>>, rejected: &mut Vec<GeometryError>) -> bool {
    if let Err(e) = check_rings(polygon, rings, 1) {
        rejected.push(e);
        return false;
    }

    let mut ring_idx = 0;
    rings.retain(|ring| {
        let keep = match check_ring(polygon, ring_idx, ring) {
            Ok(()) => true,
            Err(_) if ring_idx == 0 => true,
            Err(e) => {
                rejected.push(e);
                false
            }
        };
        ring_idx += 1;
        keep
    });
    true
}

/// Validates the first `count` rings of one polygon.
fn check_rings(polygon: usize, rings: &[Vec<Coord>], count: usize) -> GeometryResult<()> {
    if rings.is_empty() {
        return Err(GeometryError::MissingExterior { polygon });
    }

    rings
        .iter()
        .take(count)
        .enumerate()
        .try_for_each(|(ring_idx, ring)| check_ring(polygon, ring_idx, ring))
}

fn check_ring(polygon: usize, ring_idx: usize, ring: &[Coord]) -> GeometryResult<()> {
    if validate_ring(ring) {
        return Ok(());
    }
    if !ring.iter().all(Coord::is_finite) {
        return Err(GeometryError::NonFinite {
            polygon,
            ring: ring_idx,
        });
    }
    if ring.len() < MIN_RING_POSITIONS || ring.first() != ring.last() {
        return Err(GeometryError::RingTooShort {
            polygon,
            ring: ring_idx,
            len: ring.len(),
        });
    }
    Ok(())
}
