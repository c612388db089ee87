//! Schema versioning for the store directory.
//!
//! `meta.json` records the schema version and the collections created so
//! far. Version 1 introduced `points`, version 2 added `users`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};

/// Highest schema version this build understands.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Points,
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Points => "points",
            Collection::Users => "users",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "points" => Some(Collection::Points),
            "users" => Some(Collection::Users),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationAction {
    CreateCollection(Collection),
}

/// Persisted store metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub schema_version: u32,
    #[serde(default)]
    pub collections: Vec<Collection>,
}

impl StoreMeta {
    /// Reads `meta.json`; a missing file is a store at version 0.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(StoreError::io_error("Failed to read store metadata", e)),
        };
        serde_json::from_str(&content).map_err(|e| {
            StoreError::unavailable(format!("Unreadable store metadata: {}", e))
                .with_details(path.display().to_string())
        })
    }

    /// Writes `meta.json` through a temporary file and rename.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| StoreError::operation_failed(format!("Failed to encode metadata: {}", e)))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| StoreError::io_error("Failed to write store metadata", e))?;
        fs::rename(&tmp, path)
            .map_err(|e| StoreError::io_error("Failed to install store metadata", e))
    }

    pub fn has(&self, collection: Collection) -> bool {
        self.collections.contains(&collection)
    }

    /// Applies actions and stamps `target`. Re-applying is a no-op.
    pub fn apply(&mut self, actions: &[MigrationAction], target: u32) {
        for action in actions {
            match action {
                MigrationAction::CreateCollection(collection) => {
                    if !self.has(*collection) {
                        self.collections.push(*collection);
                    }
                }
            }
        }
        self.collections.sort();
        self.schema_version = self.schema_version.max(target);
    }
}

/// Actions that bring a store at `current` up to `target`.
///
/// Empty when no upgrade is needed. Existing data is never touched: every
/// action only creates what is missing.
pub fn migrate(current: u32, target: u32) -> Vec<MigrationAction> {
    (current.saturating_add(1)..=target)
        .filter_map(|version| match version {
            1 => Some(MigrationAction::CreateCollection(Collection::Points)),
            2 => Some(MigrationAction::CreateCollection(Collection::Users)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_store_creates_all_collections() {
        assert_eq!(
            migrate(0, 2),
            vec![
                MigrationAction::CreateCollection(Collection::Points),
                MigrationAction::CreateCollection(Collection::Users),
            ]
        );
    }

    #[test]
    fn test_partial_and_noop_migrations() {
        assert_eq!(migrate(1, 2), vec![MigrationAction::CreateCollection(Collection::Users)]);
        assert!(migrate(2, 2).is_empty());
        assert!(migrate(2, 1).is_empty());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut meta = StoreMeta::default();
        let actions = migrate(0, 2);
        meta.apply(&actions, 2);
        let once = meta.clone();
        meta.apply(&actions, 2);
        assert_eq!(meta, once);
        assert_eq!(meta.collections, vec![Collection::Points, Collection::Users]);
    }

    #[test]
    fn test_meta_roundtrip_through_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("meta.json");

        assert_eq!(StoreMeta::load(&path).unwrap().schema_version, 0);

        let mut meta = StoreMeta::default();
        meta.apply(&migrate(0, 1), 1);
        meta.save(&path).unwrap();

        let loaded = StoreMeta::load(&path).unwrap();
        assert_eq!(loaded.schema_version, 1);
        assert!(loaded.has(Collection::Points));
        assert!(!loaded.has(Collection::Users));
    }
}
