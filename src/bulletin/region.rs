//! Hazard region model.

use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;
use crate::risk::{DangerLevel, RatingModifier};
use crate::terrain::{AspectSet, ElevationBand};

/// Free-text bulletin fields, passed through untouched
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Narrative {
    pub problem_type: String,
    pub situation: String,
    pub trend: String,
    pub weather: String,
}

/// One zone of a bulletin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardRegion {
    /// Region name(s) as published, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub geometry: Geometry,

    /// `None` when the bulletin gives no usable rating
    pub base_rating: Option<DangerLevel>,

    #[serde(default)]
    pub modifier: Option<RatingModifier>,

    #[serde(default)]
    pub valid_aspects: AspectSet,

    #[serde(default)]
    pub elevation: ElevationBand,

    #[serde(default)]
    pub narrative: Narrative,

    /// Map fill colour published with the region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
}

impl HazardRegion {
    /// A region with the given geometry and no rating information.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            name: None,
            geometry,
            base_rating: None,
            modifier: None,
            valid_aspects: AspectSet::Unspecified,
            elevation: ElevationBand::unbounded(),
            narrative: Narrative::default(),
            fill_color: None,
        }
    }
}
