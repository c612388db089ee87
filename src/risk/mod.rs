//! Risk rule engine
//!
//! Turns a bulletin region's published rating into a rating for one couloir.
//! Classification is a pure function of the point and the region it resolved
//! to; nothing is cached or stored here.
//!
//! # Rules
//!
//! At most one downgrade step applies, first match wins:
//!
//! 1. Aspect: the region names hazardous aspects and the couloir faces
//!    another one
//! 2. Elevation: the couloir tops out below the region's hazard threshold
//!
//! The region's modifier suffix is carried over unchanged.

mod rating;
mod rules;

pub use rating::{ClassificationResult, DangerLevel, Rationale, RatingLabel, RatingModifier};
pub use rules::{classify, classify_resolution, PointTerrain};
