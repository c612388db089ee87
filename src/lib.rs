//! couloir - avalanche risk classification for ski couloirs
//!
//! Couloirs are stored locally, located inside the hazard regions of an
//! avalanche bulletin and rated from the region's danger level and the
//! couloir's own terrain. Several instances may share one data directory
//! and keep each other current through the change bus.

pub mod auth;
pub mod bulletin;
pub mod bus;
pub mod cli;
pub mod config;
pub mod geometry;
pub mod observability;
pub mod risk;
pub mod session;
pub mod store;
pub mod terrain;
