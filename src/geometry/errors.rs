//! Geometry validation diagnostics.
//!
//! These never escape as failures of classification: a region whose
//! geometry is rejected simply never contains any point.

use thiserror::Error;

/// Result type for geometry validation
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Reasons a ring or polygon is rejected at validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Ring has fewer positions than a closed triangle needs
    #[error("ring {ring} of polygon {polygon} has {len} positions, at least 4 required")]
    RingTooShort {
        polygon: usize,
        ring: usize,
        len: usize,
    },

    /// Ring contains NaN or infinite coordinates
    #[error("ring {ring} of polygon {polygon} has non-finite coordinates")]
    NonFinite { polygon: usize, ring: usize },

    /// Polygon has no exterior ring at all
    #[error("polygon {polygon} has no exterior ring")]
    MissingExterior { polygon: usize },
}
