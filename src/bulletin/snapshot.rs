//! Atomically replaceable bulletin snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::observability::{log_event_with_fields, Event};

use super::index::RegionIndex;
use super::region::HazardRegion;

/// Holder of the current [`RegionIndex`].
///
/// Readers take an `Arc` to the whole index; a refresh swaps the pointer in
/// one assignment. A classification that already holds a snapshot keeps
/// using it until it drops the `Arc`, so it can never observe a half
/// replaced region list.
#[derive(Debug)]
pub struct BulletinHandle {
    current: RwLock<Arc<RegionIndex>>,
    generation: AtomicU64,
}

impl Default for BulletinHandle {
    fn default() -> Self {
        Self::new(RegionIndex::empty())
    }
}

impl BulletinHandle {
    pub fn new(index: RegionIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
            generation: AtomicU64::new(0),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<RegionIndex> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            // The guarded value is a single pointer; it is never half-written.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Installs a prebuilt index. Returns the new generation number.
    pub fn replace(&self, index: RegionIndex) -> u64 {
        let index = Arc::new(index);
        let regions = index.len().to_string();
        match self.current.write() {
            Ok(mut guard) => *guard = index,
            Err(poisoned) => *poisoned.into_inner() = index,
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation_str = generation.to_string();
        log_event_with_fields(
            Event::BulletinReplaced,
            &[("generation", generation_str.as_str()), ("regions", regions.as_str())],
        );
        generation
    }

    /// Builds an index from `regions` and installs it.
    pub fn replace_regions(&self, regions: Vec<HazardRegion>) -> u64 {
        self.replace(RegionIndex::build(regions))
    }

    /// Number of replacements since creation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
