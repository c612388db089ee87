//! In-memory classification of every known point.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bulletin::RegionIndex;
use crate::risk::{classify_resolution, ClassificationResult};
use crate::store::{Point, PointData, PointId};

/// A point with its rating against one bulletin snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedPoint {
    pub point: Point,
    pub classification: ClassificationResult,
    /// Bulletin-order position of the containing region
    pub region: Option<usize>,
    /// Name of the containing region, when the bulletin provides one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
    /// Display colour for the computed rating
    pub color: &'static str,
}

/// Resolves and classifies `data` against `index`.
pub fn classify_point_data(data: &PointData, index: &RegionIndex) -> (ClassificationResult, Option<usize>) {
    let resolution = index.resolve(data.coord());
    (classify_resolution(&data.terrain(), &resolution), resolution.index())
}

impl ClassifiedPoint {
    pub fn classify(point: Point, index: &RegionIndex) -> Self {
        let (classification, region) = classify_point_data(&point.data, index);
        let region_name = region
            .and_then(|idx| index.get(idx))
            .and_then(|r| r.name.clone());
        let color = classification.color();
        Self {
            point,
            classification,
            region,
            region_name,
            color,
        }
    }
}

/// Derived state only: every entry can be rebuilt from the store and the
/// current bulletin snapshot.
#[derive(Debug, Default)]
pub struct ClassifiedView {
    entries: BTreeMap<PointId, ClassifiedPoint>,
    /// Bulletin generation the entries were classified against
    generation: u64,
}

impl ClassifiedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PointId) -> Option<&ClassifiedPoint> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedPoint> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<PointId> {
        self.entries.keys().copied().collect()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn upsert(&mut self, point: Point, index: &RegionIndex) {
        self.entries
            .insert(point.id, ClassifiedPoint::classify(point, index));
    }

    pub fn remove(&mut self, id: PointId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drops everything and classifies `points` from scratch.
    pub fn replace_all(&mut self, points: Vec<Point>, index: &RegionIndex, generation: u64) {
        self.entries = points
            .into_iter()
            .map(|point| (point.id, ClassifiedPoint::classify(point, index)))
            .collect();
        self.generation = generation;
    }

    /// Reclassifies every entry against a new snapshot.
    pub fn reclassify(&mut self, index: &RegionIndex, generation: u64) {
        let points: Vec<Point> = std::mem::take(&mut self.entries)
            .into_values()
            .map(|entry| entry.point)
            .collect();
        self.replace_all(points, index, generation);
    }
}
