//! Point Store
//!
//! Durable collection of couloir points plus the user-credential
//! collection, shared by every context that opens the same data directory.
//!
//! # Design Principles
//!
//! - Append-only record file, checksum-verified on every read
//! - Latest record per key wins; tombstones and clear markers are records too
//! - Every transaction catches up with other connections first
//! - Identifiers come from a high-water mark and are never reused
//! - Schema upgrades wait for (or report) older open connections
//!
//! All operations are async; file work runs on the blocking thread pool.

mod checksum;
mod engine;
mod errors;
mod lock;
pub mod migration;
mod point;
mod reader;
mod record;
mod seed;
mod writer;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::auth::User;

pub use engine::{StoreEngine, META_FILE, RECORDS_FILE};
pub use errors::{Severity, StoreError, StoreErrorCode, StoreResult};
pub use migration::{migrate, Collection, MigrationAction, LATEST_SCHEMA_VERSION};
pub use point::{Point, PointData, PointId};
pub use seed::reference_couloirs;

/// Subdirectory of the data directory holding the store files
pub const STORE_DIR: &str = "store";

/// Handle to one open store connection.
///
/// Clones share the connection. After [`PointStore::close`] every
/// operation fails with `COULOIR_STORE_UNAVAILABLE`.
#[derive(Clone)]
pub struct PointStore {
    dir: PathBuf,
    engine: Arc<Mutex<Option<StoreEngine>>>,
}

impl PointStore {
    /// Opens `<data_dir>/store` at `schema_version`.
    ///
    /// Fails fast with `COULOIR_STORE_BLOCKED` when an upgrade is needed and
    /// another connection is still open.
    pub async fn open(data_dir: &Path, schema_version: u32) -> StoreResult<Self> {
        Self::open_with(data_dir, schema_version, None).await
    }

    /// Like [`PointStore::open`], but reports a blocked upgrade through
    /// `on_blocked` and then waits for the other connections to close.
    pub async fn open_waiting<F>(data_dir: &Path, schema_version: u32, on_blocked: F) -> StoreResult<Self>
    where
        F: FnOnce(&StoreError) + Send + 'static,
    {
        Self::open_with(data_dir, schema_version, Some(Box::new(on_blocked))).await
    }

    async fn open_with(
        data_dir: &Path,
        schema_version: u32,
        on_blocked: Option<engine::BlockedCallback>,
    ) -> StoreResult<Self> {
        let dir = data_dir.join(STORE_DIR);
        let open_dir = dir.clone();
        let engine = tokio::task::spawn_blocking(move || {
            StoreEngine::open(&open_dir, schema_version, on_blocked)
        })
        .await
        .map_err(|e| StoreError::unavailable(format!("store open task failed: {}", e)))??;

        Ok(Self {
            dir,
            engine: Arc::new(Mutex::new(Some(engine))),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Runs `f` on the engine on the blocking pool.
    async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreEngine) -> StoreResult<T> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || {
            let mut guard = engine
                .lock()
                .map_err(|_| StoreError::unavailable("store connection poisoned"))?;
            let engine = guard
                .as_mut()
                .ok_or_else(|| StoreError::unavailable("store connection is closed"))?;
            f(engine)
        })
        .await
        .map_err(|e| StoreError::unavailable(format!("store task failed: {}", e)))?
    }

    /// Releases the connection. Idempotent.
    pub async fn close(&self) {
        let engine = Arc::clone(&self.engine);
        let _ = tokio::task::spawn_blocking(move || {
            if let Ok(mut guard) = engine.lock() {
                guard.take();
            }
        })
        .await;
    }

    pub async fn is_open(&self) -> bool {
        self.run(|_| Ok(())).await.is_ok()
    }

    pub async fn schema_version(&self) -> StoreResult<u32> {
        self.run(|engine| Ok(engine.schema_version())).await
    }

    // ==================
    // Points
    // ==================

    /// Stores a new point and returns its generated id
    pub async fn create(&self, data: PointData) -> StoreResult<PointId> {
        self.run(move |engine| engine.create(data)).await
    }

    pub async fn read(&self, id: PointId) -> StoreResult<Option<Point>> {
        self.run(move |engine| engine.read(id)).await
    }

    /// All points. Callers must not rely on the order.
    pub async fn list(&self) -> StoreResult<Vec<Point>> {
        self.run(|engine| engine.list()).await
    }

    /// Replaces an existing point; `COULOIR_STORE_NOT_FOUND` if absent
    pub async fn update(&self, point: Point) -> StoreResult<()> {
        self.run(move |engine| engine.update(point)).await
    }

    /// Idempotent delete. Returns whether the point existed.
    pub async fn delete(&self, id: PointId) -> StoreResult<bool> {
        self.run(move |engine| engine.delete(id)).await
    }

    pub async fn count(&self) -> StoreResult<usize> {
        self.run(|engine| engine.count()).await
    }

    /// Clears every point, optionally reinserting the reference couloirs.
    pub async fn reset(&self, reseed: bool) -> StoreResult<usize> {
        self.run(move |engine| engine.reset(reseed)).await
    }

    pub async fn seed_if_empty(&self) -> StoreResult<usize> {
        self.run(|engine| engine.seed_if_empty()).await
    }

    // ==================
    // Users
    // ==================

    pub async fn put_user(&self, user: User) -> StoreResult<()> {
        self.run(move |engine| engine.put_user(user)).await
    }

    pub async fn get_user(&self, username: &str) -> StoreResult<Option<User>> {
        let username = username.to_string();
        self.run(move |engine| engine.get_user(&username)).await
    }

    pub async fn set_default_users(&self, users: Vec<User>) -> StoreResult<usize> {
        self.run(move |engine| engine.set_default_users(&users)).await
    }

    /// The matching user, or `None` for unknown users and wrong hashes alike
    pub async fn verify_credentials(&self, username: &str, password_hash: &str) -> StoreResult<Option<User>> {
        let username = username.to_string();
        let password_hash = password_hash.to_string();
        self.run(move |engine| engine.verify_credentials(&username, &password_hash))
            .await
    }

    pub async fn update_username(&self, old: &str, new: &str) -> StoreResult<User> {
        let old = old.to_string();
        let new = new.to_string();
        self.run(move |engine| engine.update_username(&old, &new)).await
    }

    pub async fn update_password(&self, username: &str, password_hash: &str) -> StoreResult<()> {
        let username = username.to_string();
        let password_hash = password_hash.to_string();
        self.run(move |engine| engine.update_password(&username, &password_hash))
            .await
    }
}
