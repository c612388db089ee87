//! First-match region lookup.

use crate::geometry::{contains_point, Coord, GeometryError};
use crate::observability::{log_event_with_fields, Event};

use super::region::HazardRegion;

/// Outcome of a region lookup.
///
/// `NotFound` is the expected answer for points outside the bulletin's
/// coverage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Found {
        /// Position of the region in bulletin order
        index: usize,
        region: &'a HazardRegion,
    },
    NotFound,
}

impl<'a> Resolution<'a> {
    pub fn region(&self) -> Option<&'a HazardRegion> {
        match self {
            Resolution::Found { region, .. } => Some(region),
            Resolution::NotFound => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Resolution::Found { index, .. } => Some(*index),
            Resolution::NotFound => None,
        }
    }
}

/// Regions of one bulletin, in feature order.
///
/// Overlapping regions are allowed; lookup returns the lowest index.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    regions: Vec<HazardRegion>,
    rejected: Vec<(usize, GeometryError)>,
}

impl RegionIndex {
    /// Builds the index in one pass.
    ///
    /// Geometries are normalized (rings closed, unusable polygons dropped).
    /// A region whose geometry is entirely rejected stays in place so the
    /// ordering of the others is preserved; it simply matches nothing.
    pub fn build(regions: Vec<HazardRegion>) -> Self {
        let mut regions = regions;
        let mut rejected = Vec::new();

        for (idx, region) in regions.iter_mut().enumerate() {
            for error in region.geometry.normalize() {
                let idx_str = idx.to_string();
                let reason = error.to_string();
                log_event_with_fields(
                    Event::GeometryRejected,
                    &[("region", idx_str.as_str()), ("reason", reason.as_str())],
                );
                rejected.push((idx, error));
            }
        }

        Self { regions, rejected }
    }

    /// An index that covers nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Finds the first region whose exterior ring contains `point`.
    ///
    /// Only exterior rings are tested; holes are ignored.
    pub fn resolve(&self, point: Coord) -> Resolution<'_> {
        for (index, region) in self.regions.iter().enumerate() {
            let hit = region
                .geometry
                .exterior_rings()
                .into_iter()
                .any(|ring| contains_point(ring, point));
            if hit {
                return Resolution::Found { index, region };
            }
        }
        Resolution::NotFound
    }

    pub fn regions(&self) -> &[HazardRegion] {
        &self.regions
    }

    pub fn get(&self, index: usize) -> Option<&HazardRegion> {
        self.regions.get(index)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Geometry rejections found while building, by region index.
    pub fn rejected(&self) -> &[(usize, GeometryError)] {
        &self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Coord> {
        vec![
            Coord::new(x0, y0),
            Coord::new(x0 + size, y0),
            Coord::new(x0 + size, y0 + size),
            Coord::new(x0, y0 + size),
        ]
    }

    fn region(ring: Vec<Coord>, name: &str) -> HazardRegion {
        HazardRegion {
            name: Some(name.to_string()),
            ..HazardRegion::new(Geometry::Polygon(vec![ring]))
        }
    }

    #[test]
    fn test_build_closes_open_rings() {
        let index = RegionIndex::build(vec![region(square(0.0, 0.0, 1.0), "a")]);
        assert!(index.rejected().is_empty());
        let rings = index.regions()[0].geometry.exterior_rings();
        assert_eq!(rings[0].len(), 5);
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let index = RegionIndex::build(vec![
            region(square(0.0, 0.0, 10.0), "big"),
            region(square(2.0, 2.0, 2.0), "small"),
        ]);
        let hit = index.resolve(Coord::new(3.0, 3.0));
        assert_eq!(hit.index(), Some(0));
        assert_eq!(hit.region().unwrap().name.as_deref(), Some("big"));
    }

    #[test]
    fn test_resolve_not_found() {
        let index = RegionIndex::build(vec![region(square(0.0, 0.0, 1.0), "a")]);
        assert_eq!(index.resolve(Coord::new(5.0, 5.0)), Resolution::NotFound);
        assert_eq!(RegionIndex::empty().resolve(Coord::new(0.5, 0.5)), Resolution::NotFound);
    }

    #[test]
    fn test_multipolygon_member_match() {
        let geometry = Geometry::MultiPolygon(vec![
            vec![square(0.0, 0.0, 1.0)],
            vec![square(10.0, 10.0, 1.0)],
        ]);
        let index = RegionIndex::build(vec![HazardRegion::new(geometry)]);
        assert_eq!(index.resolve(Coord::new(10.5, 10.5)).index(), Some(0));
    }

    #[test]
    fn test_rejected_region_keeps_ordering() {
        let broken = region(vec![Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)], "broken");
        let index = RegionIndex::build(vec![broken, region(square(0.0, 0.0, 1.0), "ok")]);

        assert_eq!(index.rejected().len(), 1);
        assert_eq!(index.rejected()[0].0, 0);
        assert_eq!(index.resolve(Coord::new(0.5, 0.5)).index(), Some(1));
    }
}
