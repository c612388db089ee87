//! Bulletin regions
//!
//! A bulletin is an ordered list of hazard regions. The list is indexed once
//! per fetch and replaced as a whole on refresh; regions are never mutated
//! in place.
//!
//! - [`RegionIndex`]: first-match point lookup in bulletin order
//! - [`BulletinHandle`]: atomically swappable snapshot of the current index
//! - [`loader`]: maps an already-fetched CAAML GeoJSON document to regions

mod errors;
mod index;
pub mod loader;
mod region;
mod snapshot;

pub use errors::{BulletinError, BulletinResult};
pub use index::{RegionIndex, Resolution};
pub use region::{HazardRegion, Narrative};
pub use snapshot::BulletinHandle;
