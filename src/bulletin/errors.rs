//! Bulletin loading errors.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for bulletin loading
pub type BulletinResult<T> = Result<T, BulletinError>;

/// Errors raised while turning a bulletin document into regions.
///
/// Region lookup and classification never fail; these only concern the
/// document as a whole.
#[derive(Debug, Error)]
pub enum BulletinError {
    #[error("failed to read bulletin {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bulletin is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bulletin is not a FeatureCollection (type: {0})")]
    NotFeatureCollection(String),
}
