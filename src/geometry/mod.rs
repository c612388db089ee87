//! Geometry kernel
//!
//! Planar point-in-ring containment and polygon normalization for bulletin
//! regions. Coordinates are GeoJSON positions: `x` is longitude, `y` is
//! latitude, both in WGS84 degrees.
//!
//! # Invariants
//!
//! - A ring fed to [`contains_point`] has at least 4 positions and is closed
//! - Vertices on the ray are resolved with the half-open test
//!   `(yi > y) != (yj > y)`, so a vertex shared by two edges is counted once
//! - Malformed rings are rejected by validation, never by panicking

mod errors;
mod ring;
mod shape;

pub use errors::{GeometryError, GeometryResult};
pub use ring::{close_ring, contains_point, validate_ring, Coord, MIN_RING_POSITIONS};
pub use shape::Geometry;
