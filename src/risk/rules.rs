//! Downgrade rules applied to a region's published rating.

use serde::{Deserialize, Serialize};

use crate::bulletin::{HazardRegion, Resolution};
use crate::terrain::Aspect;

use super::rating::{ClassificationResult, Rationale, RatingLabel};

/// The terrain attributes of a couloir the rules look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointTerrain {
    pub aspect: Aspect,
    pub elevation_max: i32,
}

/// Classifies a couloir against the region it resolved to.
///
/// `None` means the couloir lies outside every bulletin region; that is a
/// normal outcome rated `NaN`, not an error. Missing aspect or elevation
/// data on the region disables the corresponding rule.
pub fn classify(point: &PointTerrain, region: Option<&HazardRegion>) -> ClassificationResult {
    let Some(region) = region else {
        return ClassificationResult::out_of_coverage();
    };

    let modifier_suffix = region
        .modifier
        .map(|m| m.suffix())
        .unwrap_or_default()
        .to_string();

    // Nothing to downgrade from: undefined or already at the bottom
    let base = match region.base_rating {
        Some(level) if level.value() > 0 => level,
        other => {
            return ClassificationResult {
                rating: RatingLabel::from(other),
                modifier_suffix,
                rationale: Rationale::Unchanged,
            }
        }
    };

    let (rating, rationale) = if region.valid_aspects.is_specific()
        && !region.valid_aspects.covers(point.aspect)
    {
        (base.decremented(), Rationale::FavorableAspect)
    } else if region.elevation.tops_out_below(point.elevation_max) {
        (base.decremented(), Rationale::FavorableElevation)
    } else {
        (base, Rationale::Unchanged)
    };

    ClassificationResult {
        rating: RatingLabel::Level(rating),
        modifier_suffix,
        rationale,
    }
}

/// [`classify`] on the outcome of a region lookup.
pub fn classify_resolution(point: &PointTerrain, resolution: &Resolution<'_>) -> ClassificationResult {
    classify(point, resolution.region())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::risk::{DangerLevel, RatingModifier};
    use crate::terrain::{AspectSet, ElevationBand};

    fn region(base: Option<u8>, aspects: AspectSet, upper: Option<i32>) -> HazardRegion {
        HazardRegion {
            base_rating: base.and_then(DangerLevel::new),
            modifier: Some(RatingModifier::Plus),
            valid_aspects: aspects,
            elevation: ElevationBand::new(upper, None),
            ..HazardRegion::new(Geometry::Polygon(vec![]))
        }
    }

    fn north_facing() -> AspectSet {
        AspectSet::only([Aspect::N, Aspect::NE, Aspect::NW])
    }

    fn point(aspect: Aspect, elevation_max: i32) -> PointTerrain {
        PointTerrain {
            aspect,
            elevation_max,
        }
    }

    #[test]
    fn test_out_of_coverage() {
        let result = classify(&point(Aspect::N, 2500), None);
        assert_eq!(result.rating, RatingLabel::NaN);
        assert_eq!(result.rationale.message(), "out of bulletin coverage");
    }

    #[test]
    fn test_aspect_rule_wins_over_elevation_rule() {
        // Both conditions are favorable, still only one step down
        let r = region(Some(3), north_facing(), Some(2000));
        let result = classify(&point(Aspect::S, 1500), Some(&r));
        assert_eq!(result.rating.level().unwrap().value(), 2);
        assert_eq!(result.rationale, Rationale::FavorableAspect);
    }

    #[test]
    fn test_elevation_rule_applies_without_aspects() {
        let r = region(Some(3), AspectSet::Unspecified, Some(2000));
        let result = classify(&point(Aspect::S, 1800), Some(&r));
        assert_eq!(result.rating.level().unwrap().value(), 2);
        assert_eq!(result.rationale, Rationale::FavorableElevation);
    }

    #[test]
    fn test_missing_elevation_bound_never_downgrades() {
        let r = region(Some(3), north_facing(), None);
        let result = classify(&point(Aspect::N, 100), Some(&r));
        assert_eq!(result.rating.level().unwrap().value(), 3);
        assert_eq!(result.rationale, Rationale::Unchanged);
    }

    #[test]
    fn test_undefined_base_is_unchanged() {
        let r = region(None, north_facing(), Some(2000));
        let result = classify(&point(Aspect::S, 1000), Some(&r));
        assert_eq!(result.rating, RatingLabel::NaN);
        assert_eq!(result.rationale, Rationale::Unchanged);
    }

    #[test]
    fn test_zero_base_is_unchanged() {
        let r = region(Some(0), north_facing(), Some(2000));
        let result = classify(&point(Aspect::S, 1000), Some(&r));
        assert_eq!(result.rating.level().unwrap().value(), 0);
        assert_eq!(result.rationale, Rationale::Unchanged);
    }

    #[test]
    fn test_downgrade_from_one_reaches_zero() {
        let r = region(Some(1), north_facing(), None);
        let result = classify(&point(Aspect::E, 3000), Some(&r));
        assert_eq!(result.rating.level().unwrap().value(), 0);
    }

    #[test]
    fn test_modifier_carried_from_region() {
        let r = region(Some(3), north_facing(), None);
        let result = classify(&point(Aspect::S, 3000), Some(&r));
        assert_eq!(result.modifier_suffix, "+");
        assert_eq!(result.display_rating(), "2+");
    }
}
