//! CAAML GeoJSON bulletin adapter
//!
//! Maps an already-fetched bulletin FeatureCollection to [`HazardRegion`]s.
//! Every property is optional: missing or unparsable values degrade to
//! "undefined" / "unspecified" instead of failing the whole document.
//!
//! Field mapping per feature:
//!
//! | region field    | bulletin property                                  |
//! |-----------------|----------------------------------------------------|
//! | `base_rating`   | `dangerRatings[0].mainValue`                       |
//! | `modifier`      | `dangerRatings[0].customData.CH.subdivision`       |
//! | `valid_aspects` | `avalancheProblems[0].aspects`                     |
//! | `upper_bound`   | `avalancheProblems[0].elevation.lowerBound`        |
//! | `lower_bound`   | `avalancheProblems[0].elevation.upperBound`        |
//! | narrative       | problem comment, snowpack, tendency, weather       |
//!
//! The problem's `lowerBound` is the altitude above which the rating holds,
//! which is the hazard threshold the elevation rule compares against.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::geometry::Geometry;
use crate::observability::{log_event_with_fields, Event};
use crate::risk::{DangerLevel, RatingModifier};
use crate::terrain::{Aspect, AspectSet, ElevationBand};

use super::errors::{BulletinError, BulletinResult};
use super::region::{HazardRegion, Narrative};

const NARRATIVE_DEFAULT: &str = "-";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Value,
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FeatureProperties {
    danger_ratings: Vec<RawDangerRating>,
    avalanche_problems: Vec<RawProblem>,
    snowpack_structure: Option<RawComment>,
    tendency: Vec<RawComment>,
    weather_forecast: Option<RawComment>,
    regions: Vec<RawRegionRef>,
    fill: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDangerRating {
    main_value: Option<String>,
    custom_data: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProblem {
    aspects: Vec<String>,
    elevation: Option<RawElevation>,
    comment: Option<String>,
    problem_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawElevation {
    lower_bound: Value,
    upper_bound: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawComment {
    comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRegionRef {
    name: Option<String>,
}

/// Parses a bulletin document into regions, in feature order.
pub fn parse_feature_collection(json: &str) -> BulletinResult<Vec<HazardRegion>> {
    let collection: FeatureCollection = serde_json::from_str(json)?;

    if let Some(kind) = collection.kind.as_deref() {
        if kind != "FeatureCollection" {
            return Err(BulletinError::NotFeatureCollection(kind.to_string()));
        }
    }

    let regions: Vec<HazardRegion> = collection
        .features
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| region_from_feature(idx, feature))
        .collect();

    let count = regions.len().to_string();
    log_event_with_fields(Event::BulletinLoaded, &[("regions", count.as_str())]);
    Ok(regions)
}

/// Reads and parses a bulletin file.
pub fn load_bulletin_file(path: &Path) -> BulletinResult<Vec<HazardRegion>> {
    let content = std::fs::read_to_string(path).map_err(|source| BulletinError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_feature_collection(&content)
}

fn region_from_feature(idx: usize, feature: Feature) -> HazardRegion {
    let geometry = match serde_json::from_value::<Geometry>(feature.geometry) {
        Ok(geometry) => geometry,
        Err(e) => {
            let idx_str = idx.to_string();
            let reason = e.to_string();
            log_event_with_fields(
                Event::GeometryRejected,
                &[("region", idx_str.as_str()), ("reason", reason.as_str())],
            );
            Geometry::Polygon(Vec::new())
        }
    };

    let props = feature.properties;
    let rating = props.danger_ratings.into_iter().next().unwrap_or_default();
    let problem = props.avalanche_problems.into_iter().next().unwrap_or_default();

    let base_rating = rating.main_value.as_deref().and_then(DangerLevel::from_main_value);
    let modifier = rating
        .custom_data
        .pointer("/CH/subdivision")
        .and_then(Value::as_str)
        .and_then(RatingModifier::from_subdivision);

    let aspects: Vec<Aspect> = problem
        .aspects
        .iter()
        .filter_map(|a| a.parse().ok())
        .collect();
    let valid_aspects = if aspects.is_empty() {
        AspectSet::Unspecified
    } else {
        AspectSet::only(aspects)
    };

    let elevation = problem
        .elevation
        .map(|e| ElevationBand::new(parse_bound(&e.lower_bound), parse_bound(&e.upper_bound)))
        .unwrap_or_default();

    let names: Vec<String> = props.regions.into_iter().filter_map(|r| r.name).collect();

    HazardRegion {
        name: (!names.is_empty()).then(|| names.join(", ")),
        geometry,
        base_rating,
        modifier,
        valid_aspects,
        elevation,
        narrative: Narrative {
            problem_type: problem
                .comment
                .or(problem.problem_type)
                .unwrap_or_else(|| NARRATIVE_DEFAULT.to_string()),
            situation: comment_or_default(props.snowpack_structure),
            trend: comment_or_default(props.tendency.into_iter().next()),
            weather: comment_or_default(props.weather_forecast),
        },
        fill_color: props.fill,
    }
}

fn comment_or_default(comment: Option<RawComment>) -> String {
    comment
        .and_then(|c| c.comment)
        .unwrap_or_else(|| NARRATIVE_DEFAULT.to_string())
}

/// Numeric bound in meters; named bounds such as `"treeline"` are absent.
fn parse_bound(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f.round() as i32),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i32),
        _ => None,
    }
}
