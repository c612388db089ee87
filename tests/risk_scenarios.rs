//! Risk Classification Scenarios
//!
//! End to end: region lookup by couloir coordinates, then the downgrade
//! rules against the region's rating.
//!
//! The region used throughout is rated 3+, dangerous on N, NE and NW, with
//! a hazard threshold at 2000 m.

use couloir::bulletin::{BulletinHandle, HazardRegion, RegionIndex};
use couloir::geometry::{Coord, Geometry};
use couloir::risk::{
    classify_resolution, DangerLevel, PointTerrain, Rationale, RatingLabel, RatingModifier,
};
use couloir::session::classify_point_data;
use couloir::store::PointData;
use couloir::terrain::{Aspect, AspectSet, ElevationBand};

// =============================================================================
// Test Utilities
// =============================================================================

const LON: f64 = 7.05;
const LAT: f64 = 46.0;

fn region() -> HazardRegion {
    let d = 0.1;
    HazardRegion {
        name: Some("Bas-Valais".to_string()),
        base_rating: DangerLevel::new(3),
        modifier: Some(RatingModifier::Plus),
        valid_aspects: AspectSet::only([Aspect::N, Aspect::NE, Aspect::NW]),
        elevation: ElevationBand::new(Some(2000), None),
        ..HazardRegion::new(Geometry::Polygon(vec![vec![
            Coord::new(LON - d, LAT - d),
            Coord::new(LON + d, LAT - d),
            Coord::new(LON + d, LAT + d),
            Coord::new(LON - d, LAT + d),
            Coord::new(LON - d, LAT - d),
        ]]))
    }
}

fn couloir(aspect: Aspect, elevation_max: i32, latitude: f64, longitude: f64) -> PointData {
    PointData {
        name: "test couloir".to_string(),
        latitude,
        longitude,
        aspect,
        elevation_max,
        elevation_min: None,
        slope_angle: 42.0,
        ski_grade: String::new(),
        ski_exposure_grade: String::new(),
        comment: String::new(),
        reference_link: String::new(),
        owner: "AK".to_string(),
    }
}

fn level(value: u8) -> RatingLabel {
    RatingLabel::Level(DangerLevel::new(value).unwrap())
}

// =============================================================================
// Scenarios
// =============================================================================

/// Aspect outside the dangerous set: one level down, suffix kept.
#[test]
fn test_scenario_a_favorable_aspect() {
    let index = RegionIndex::build(vec![region()]);
    let (result, region_idx) = classify_point_data(&couloir(Aspect::S, 2500, LAT, LON), &index);

    assert_eq!(region_idx, Some(0));
    assert_eq!(result.rating, level(2));
    assert_eq!(result.modifier_suffix, "+");
    assert_eq!(result.rationale, Rationale::FavorableAspect);
    assert_eq!(result.rationale.message(), "favorable aspect reduces danger");
    assert_eq!(result.display_rating(), "2+");
}

/// Dangerous aspect but tops out below the threshold.
#[test]
fn test_scenario_b_favorable_elevation() {
    let index = RegionIndex::build(vec![region()]);
    let (result, _) = classify_point_data(&couloir(Aspect::N, 1800, LAT, LON), &index);

    assert_eq!(result.rating, level(2));
    assert_eq!(result.rationale, Rationale::FavorableElevation);
}

#[test]
fn test_scenario_c_no_rule_fires() {
    let index = RegionIndex::build(vec![region()]);
    let (result, _) = classify_point_data(&couloir(Aspect::N, 2500, LAT, LON), &index);

    assert_eq!(result.rating, level(3));
    assert_eq!(result.rationale, Rationale::Unchanged);
    assert_eq!(result.display_rating(), "3+");
    assert_eq!(result.color(), "#FF9900");
}

#[test]
fn test_scenario_d_out_of_coverage() {
    let index = RegionIndex::build(vec![region()]);
    let (result, region_idx) = classify_point_data(&couloir(Aspect::N, 2500, 45.0, 6.0), &index);

    assert_eq!(region_idx, None);
    assert_eq!(result.rating, RatingLabel::NaN);
    assert_eq!(result.rationale, Rationale::OutOfCoverage);
    assert_eq!(result.display_rating(), "NaN");
    assert_eq!(result.color(), "gray");
}

// =============================================================================
// Rule Interplay
// =============================================================================

/// Both favorable: still only one level down.
#[test]
fn test_rules_never_compound() {
    let index = RegionIndex::build(vec![region()]);
    let terrain = PointTerrain {
        aspect: Aspect::S,
        elevation_max: 1500,
    };
    let result = classify_resolution(&terrain, &index.resolve(Coord::new(LON, LAT)));

    assert_eq!(result.rating, level(2));
    assert_eq!(result.rationale, Rationale::FavorableAspect);
}

#[test]
fn test_elevation_rule_without_aspects() {
    let unspecified = HazardRegion {
        valid_aspects: AspectSet::Unspecified,
        ..region()
    };
    let index = RegionIndex::build(vec![unspecified]);
    let (result, _) = classify_point_data(&couloir(Aspect::S, 1800, LAT, LON), &index);

    assert_eq!(result.rating, level(2));
    assert_eq!(result.rationale, Rationale::FavorableElevation);
}

#[test]
fn test_level_one_never_drops_below_zero() {
    let low = HazardRegion {
        base_rating: DangerLevel::new(1),
        modifier: None,
        ..region()
    };
    let index = RegionIndex::build(vec![low]);
    let (result, _) = classify_point_data(&couloir(Aspect::S, 2500, LAT, LON), &index);

    assert_eq!(result.rating, level(0));
    assert_eq!(result.display_rating(), "0");
    assert_eq!(result.color(), "#009933");
}

#[test]
fn test_undefined_rating_stays_nan_inside_region() {
    let unrated = HazardRegion {
        base_rating: None,
        ..region()
    };
    let index = RegionIndex::build(vec![unrated]);
    let (result, region_idx) = classify_point_data(&couloir(Aspect::S, 2500, LAT, LON), &index);

    assert_eq!(region_idx, Some(0));
    assert_eq!(result.rating, RatingLabel::NaN);
    assert_eq!(result.rationale, Rationale::Unchanged);
}

// =============================================================================
// Snapshot Replacement
// =============================================================================

#[test]
fn test_held_snapshot_survives_replacement() {
    let handle = BulletinHandle::new(RegionIndex::build(vec![region()]));
    let held = handle.snapshot();

    let generation = handle.replace(RegionIndex::empty());
    assert_eq!(generation, 1);

    // The old snapshot is still complete; new readers see the empty one.
    assert_eq!(held.len(), 1);
    assert!(held.resolve(Coord::new(LON, LAT)).region().is_some());
    assert!(handle.snapshot().resolve(Coord::new(LON, LAT)).region().is_none());
}
