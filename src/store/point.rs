//! Couloir point records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::Coord;
use crate::risk::PointTerrain;
use crate::terrain::Aspect;

use super::errors::{StoreError, StoreResult};

/// Store-assigned point identifier. Never reused within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(pub u64);

impl PointId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PointId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(PointId)
    }
}

/// Point attributes, everything but the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointData {
    pub name: String,
    /// WGS84 degrees
    pub latitude: f64,
    pub longitude: f64,
    pub aspect: Aspect,
    /// Meters
    pub elevation_max: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_min: Option<i32>,
    /// Degrees
    pub slope_angle: f64,
    #[serde(default)]
    pub ski_grade: String,
    #[serde(default)]
    pub ski_exposure_grade: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub reference_link: String,
    /// Username of the contributor
    #[serde(default)]
    pub owner: String,
}

impl PointData {
    /// Type and shape checks only. Plausibility (for instance an
    /// `elevation_min` above `elevation_max`) is not checked.
    pub fn validate(&self) -> StoreResult<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(StoreError::invalid_record(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(StoreError::invalid_record(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        if !self.slope_angle.is_finite() {
            return Err(StoreError::invalid_record("slope angle is not a number"));
        }
        Ok(())
    }

    pub fn coord(&self) -> Coord {
        Coord::from_lat_lon(self.latitude, self.longitude)
    }

    pub fn terrain(&self) -> PointTerrain {
        PointTerrain {
            aspect: self.aspect,
            elevation_max: self.elevation_max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    #[serde(flatten)]
    pub data: PointData,
}

impl Point {
    pub fn new(id: PointId, data: PointData) -> Self {
        Self { id, data }
    }
}
