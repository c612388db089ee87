//! Region Resolution Tests
//!
//! Tests for:
//! - Ray-cast containment does not depend on which vertex a ring starts at
//! - Unclosed rings are closed before lookup
//! - Overlapping regions resolve to the first one in bulletin order
//! - Regions with unusable geometry keep their position but match nothing
//! - Unusable holes are dropped without losing the exterior ring

use couloir::bulletin::{HazardRegion, RegionIndex, Resolution};
use couloir::geometry::{contains_point, Coord, Geometry};

// =============================================================================
// Test Utilities
// =============================================================================

/// Concave "L" shape, closed.
fn l_shape() -> Vec<Coord> {
    vec![
        Coord::new(0.0, 0.0),
        Coord::new(6.0, 0.0),
        Coord::new(6.0, 2.0),
        Coord::new(2.0, 2.0),
        Coord::new(2.0, 6.0),
        Coord::new(0.0, 6.0),
        Coord::new(0.0, 0.0),
    ]
}

/// Same ring, starting at vertex `start`.
fn rotated(ring: &[Coord], start: usize) -> Vec<Coord> {
    let open = &ring[..ring.len() - 1];
    let mut out: Vec<Coord> = open[start..].iter().chain(&open[..start]).copied().collect();
    out.push(out[0]);
    out
}

fn square(x0: f64, y0: f64, size: f64) -> Geometry {
    Geometry::Polygon(vec![vec![
        Coord::new(x0, y0),
        Coord::new(x0 + size, y0),
        Coord::new(x0 + size, y0 + size),
        Coord::new(x0, y0 + size),
        Coord::new(x0, y0),
    ]])
}

fn named(name: &str, geometry: Geometry) -> HazardRegion {
    HazardRegion {
        name: Some(name.to_string()),
        ..HazardRegion::new(geometry)
    }
}

// =============================================================================
// Containment
// =============================================================================

#[test]
fn test_containment_is_rotation_invariant() {
    let ring = l_shape();
    let samples = [
        (Coord::new(1.0, 1.0), true),
        (Coord::new(5.0, 1.0), true),
        (Coord::new(1.0, 5.0), true),
        (Coord::new(4.0, 4.0), false),
        (Coord::new(7.0, 1.0), false),
        (Coord::new(-1.0, 3.0), false),
    ];

    for start in 0..ring.len() - 1 {
        let ring = rotated(&l_shape(), start);
        for (point, expected) in samples {
            assert_eq!(
                contains_point(&ring, point),
                expected,
                "rotation {} changed the answer for {:?}",
                start,
                point
            );
        }
    }
}

#[test]
fn test_unclosed_ring_is_closed_on_build() {
    let mut open = l_shape();
    open.pop();
    let index = RegionIndex::build(vec![named("open", Geometry::Polygon(vec![open]))]);

    assert!(index.rejected().is_empty());
    assert_eq!(index.resolve(Coord::new(1.0, 1.0)).index(), Some(0));
}

// =============================================================================
// First Match
// =============================================================================

#[test]
fn test_overlapping_regions_first_match_wins() {
    let index = RegionIndex::build(vec![
        named("west", square(0.0, 0.0, 10.0)),
        named("overlap", square(5.0, 0.0, 10.0)),
        named("east", square(10.0, 0.0, 10.0)),
    ]);

    // Inside all three in the shared strip: lowest index
    match index.resolve(Coord::new(7.0, 5.0)) {
        Resolution::Found { index, region } => {
            assert_eq!(index, 0);
            assert_eq!(region.name.as_deref(), Some("west"));
        }
        Resolution::NotFound => panic!("point in the overlap must resolve"),
    }

    assert_eq!(index.resolve(Coord::new(12.0, 5.0)).index(), Some(1));
    assert_eq!(index.resolve(Coord::new(17.0, 5.0)).index(), Some(2));
    assert_eq!(index.resolve(Coord::new(25.0, 5.0)), Resolution::NotFound);
}

#[test]
fn test_multipolygon_members_searched_in_order() {
    let Geometry::Polygon(a) = square(0.0, 0.0, 1.0) else { unreachable!() };
    let Geometry::Polygon(b) = square(10.0, 10.0, 1.0) else { unreachable!() };
    let index = RegionIndex::build(vec![named("islands", Geometry::MultiPolygon(vec![a, b]))]);

    assert_eq!(index.resolve(Coord::new(0.5, 0.5)).index(), Some(0));
    assert_eq!(index.resolve(Coord::new(10.5, 10.5)).index(), Some(0));
    assert!(index.resolve(Coord::new(5.0, 5.0)).region().is_none());
}

#[test]
fn test_rejected_region_keeps_order_and_matches_nothing() {
    let degenerate = Geometry::Polygon(vec![vec![Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)]]);
    let index = RegionIndex::build(vec![
        named("broken", degenerate),
        named("valid", square(0.0, 0.0, 10.0)),
    ]);

    assert_eq!(index.len(), 2);
    assert_eq!(index.rejected().len(), 1);
    assert_eq!(index.rejected()[0].0, 0);
    assert_eq!(index.resolve(Coord::new(0.5, 0.5)).index(), Some(1));
}

#[test]
fn test_short_hole_does_not_empty_region() {
    let Geometry::Polygon(mut rings) = square(0.0, 0.0, 10.0) else { unreachable!() };
    rings.push(vec![Coord::new(2.0, 2.0), Coord::new(3.0, 3.0), Coord::new(2.0, 2.0)]);
    let index = RegionIndex::build(vec![named("holed", Geometry::Polygon(rings))]);

    // The hole is reported but the exterior still covers the region.
    assert_eq!(index.rejected().len(), 1);
    assert_eq!(index.rejected()[0].0, 0);
    assert_eq!(index.resolve(Coord::new(5.0, 5.0)).index(), Some(0));
    assert_eq!(index.resolve(Coord::new(2.5, 2.5)).index(), Some(0));
}

#[test]
fn test_empty_index_covers_nothing() {
    let index = RegionIndex::empty();
    assert!(index.is_empty());
    assert_eq!(index.resolve(Coord::new(7.0, 46.0)), Resolution::NotFound);
}
