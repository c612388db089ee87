//! Synchronous store engine behind one connection.
//!
//! Each connection keeps an in-memory materialization of the record file
//! and the byte offset it has applied up to. Every transaction takes the
//! store lock and first applies whatever other connections appended since,
//! so a reader or writer never observes an older dataset than the last one
//! it saw.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::crypto::constant_time_str_eq;
use crate::auth::User;
use crate::observability::{log_event, log_event_with_fields, Event};

use super::errors::{StoreError, StoreResult};
use super::lock::{ConnectionLock, TransactionLock, UpgradeAttempt};
use super::migration::{migrate, Collection, StoreMeta, LATEST_SCHEMA_VERSION};
use super::point::{Point, PointData, PointId};
use super::reader::RecordReader;
use super::record::{RecordKind, StoreRecord};
use super::seed::reference_couloirs;
use super::writer::RecordWriter;

pub const META_FILE: &str = "meta.json";
pub const RECORDS_FILE: &str = "records.dat";
pub const STORE_LOCK_FILE: &str = "store.lock";
pub const CONNECTIONS_LOCK_FILE: &str = "connections.lock";

/// Called once when opening has to wait for other connections.
pub type BlockedCallback = Box<dyn FnOnce(&StoreError) + Send>;

/// Materialized collections plus the replay position.
#[derive(Default)]
struct StoreState {
    offset: u64,
    points: BTreeMap<PointId, Point>,
    users: BTreeMap<String, User>,
    /// Highest point id ever recorded, deleted or not
    high_water: u64,
}

impl StoreState {
    /// Applies records appended after `offset`.
    ///
    /// Stops before a record that runs past the end of the file and returns
    /// its offset. Every append completes under the exclusive lock, so such
    /// a record is left over from a failed writer and never in progress.
    fn catch_up(&mut self, records_path: &Path) -> StoreResult<Option<u64>> {
        let len = match fs::metadata(records_path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(StoreError::io_error("Failed to stat record file", e)),
        };
        if len < self.offset {
            // Replaced underneath us: rebuild from scratch.
            *self = StoreState::default();
        }
        if len == self.offset {
            return Ok(None);
        }

        let mut reader = RecordReader::open_at(records_path, self.offset)?;
        loop {
            let offset = reader.current_offset();
            let record = match reader.read_next() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(_) if reader.at_incomplete_tail() => {
                    self.offset = offset;
                    return Ok(Some(offset));
                }
                Err(e) => {
                    if e.is_fatal() {
                        let msg = e.to_string();
                        log_event_with_fields(Event::StoreCorruption, &[("error", msg.as_str())]);
                    }
                    return Err(e);
                }
            };
            self.apply(record, offset)?;
        }
        self.offset = reader.current_offset();
        Ok(None)
    }

    fn apply(&mut self, record: StoreRecord, offset: u64) -> StoreResult<()> {
        let collection = match Collection::from_name(&record.collection) {
            Some(collection) => collection,
            None => return Ok(()),
        };

        match (collection, record.kind) {
            (Collection::Points, RecordKind::Put) => {
                let point: Point = serde_json::from_slice(&record.body).map_err(|e| {
                    StoreError::corruption_at_offset(offset, format!("Undecodable point: {}", e))
                })?;
                self.high_water = self.high_water.max(point.id.value());
                self.points.insert(point.id, point);
            }
            (Collection::Points, RecordKind::Tombstone) => {
                let id: PointId = record.key.parse().map_err(|_| {
                    StoreError::corruption_at_offset(offset, format!("Bad point key: {}", record.key))
                })?;
                self.high_water = self.high_water.max(id.value());
                self.points.remove(&id);
            }
            (Collection::Points, RecordKind::Clear) => self.points.clear(),
            (Collection::Users, RecordKind::Put) => {
                let user: User = serde_json::from_slice(&record.body).map_err(|e| {
                    StoreError::corruption_at_offset(offset, format!("Undecodable user: {}", e))
                })?;
                self.users.insert(record.key, user);
            }
            (Collection::Users, RecordKind::Tombstone) => {
                self.users.remove(&record.key);
            }
            (Collection::Users, RecordKind::Clear) => self.users.clear(),
        }
        Ok(())
    }
}

fn encode<T: serde::Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| StoreError::operation_failed(format!("Failed to encode record: {}", e)))
}

pub struct StoreEngine {
    dir: PathBuf,
    records_path: PathBuf,
    meta: StoreMeta,
    tx_lock: TransactionLock,
    writer: RecordWriter,
    state: StoreState,
    _connection: ConnectionLock,
}

impl StoreEngine {
    /// Opens a connection at schema version `target`, upgrading if needed.
    ///
    /// Without `on_blocked` an upgrade contended by another open connection
    /// fails with `COULOIR_STORE_BLOCKED`. With it, the callback receives
    /// that error and the open waits until the other connections close.
    pub fn open(dir: &Path, target: u32, on_blocked: Option<BlockedCallback>) -> StoreResult<Self> {
        if target == 0 || target > LATEST_SCHEMA_VERSION {
            return Err(StoreError::unavailable(format!(
                "Unsupported schema version {} (latest is {})",
                target, LATEST_SCHEMA_VERSION
            )));
        }

        fs::create_dir_all(dir).map_err(|e| {
            StoreError::unavailable(format!("Failed to create store directory: {}", e))
                .with_details(dir.display().to_string())
        })?;

        let meta_path = dir.join(META_FILE);
        let connection = ConnectionLock::open(&dir.join(CONNECTIONS_LOCK_FILE))?;
        let persisted = StoreMeta::load(&meta_path)?;
        check_not_newer(&persisted, target)?;

        if persisted.schema_version < target {
            if let UpgradeAttempt::Contended = connection.try_upgrade()? {
                let blocked = StoreError::blocked(persisted.schema_version, target);
                let persisted_str = persisted.schema_version.to_string();
                let target_str = target.to_string();
                log_event_with_fields(
                    Event::StoreBlocked,
                    &[("persisted", persisted_str.as_str()), ("target", target_str.as_str())],
                );
                match on_blocked {
                    Some(callback) => {
                        callback(&blocked);
                        connection.upgrade()?;
                    }
                    None => return Err(blocked),
                }
            }

            // Another connection may have upgraded while we waited.
            let mut meta = StoreMeta::load(&meta_path)?;
            check_not_newer(&meta, target)?;
            let from = meta.schema_version;
            let actions = migrate(from, target);
            if !actions.is_empty() {
                meta.apply(&actions, target);
                meta.save(&meta_path)?;
                let from_str = from.to_string();
                let target_str = target.to_string();
                log_event_with_fields(
                    Event::StoreUpgraded,
                    &[("from", from_str.as_str()), ("to", target_str.as_str())],
                );
            }
            connection.downgrade()?;
        } else {
            connection.share()?;
        }

        let meta = StoreMeta::load(&meta_path)?;
        check_not_newer(&meta, target)?;

        let records_path = dir.join(RECORDS_FILE);
        let mut engine = Self {
            dir: dir.to_path_buf(),
            tx_lock: TransactionLock::open(&dir.join(STORE_LOCK_FILE))?,
            writer: RecordWriter::open(&records_path)?,
            records_path,
            meta,
            state: StoreState::default(),
            _connection: connection,
        };

        {
            let _guard = engine.tx_lock.write()?;
            Self::catch_up_and_repair(&mut engine.state, &mut engine.writer, &engine.records_path)?;
        }

        let version = engine.meta.schema_version.to_string();
        let dir_str = engine.dir.display().to_string();
        log_event_with_fields(
            Event::StoreOpened,
            &[("dir", dir_str.as_str()), ("schema_version", version.as_str())],
        );
        Ok(engine)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn schema_version(&self) -> u32 {
        self.meta.schema_version
    }

    fn require(&self, collection: Collection) -> StoreResult<()> {
        if self.meta.has(collection) {
            Ok(())
        } else {
            Err(StoreError::unavailable(format!(
                "Collection {} does not exist at schema version {}",
                collection.as_str(),
                self.meta.schema_version
            )))
        }
    }

    /// Runs `f` against an up-to-date state under the shared lock.
    fn read_tx<T>(
        &mut self,
        collection: Collection,
        f: impl FnOnce(&StoreState) -> T,
    ) -> StoreResult<T> {
        self.require(collection)?;
        let _guard = self.tx_lock.read()?;
        self.state.catch_up(&self.records_path)?;
        Ok(f(&self.state))
    }

    /// Catches up, then cuts off an incomplete trailing record.
    ///
    /// Must run under the exclusive lock.
    fn catch_up_and_repair(
        state: &mut StoreState,
        writer: &mut RecordWriter,
        records_path: &Path,
    ) -> StoreResult<()> {
        if let Some(offset) = state.catch_up(records_path)? {
            let len = fs::metadata(records_path)
                .map_err(|e| StoreError::io_error("Failed to stat record file", e))?
                .len();
            writer.truncate(offset)?;
            let offset_str = offset.to_string();
            let dropped = (len - offset).to_string();
            log_event_with_fields(
                Event::StoreTailTruncated,
                &[("byte_offset", offset_str.as_str()), ("bytes", dropped.as_str())],
            );
        }
        Ok(())
    }

    /// Runs `f` under the exclusive lock; `f` decides which records to append.
    fn write_tx<T>(
        &mut self,
        collection: Collection,
        f: impl FnOnce(&StoreState) -> StoreResult<(Vec<StoreRecord>, T)>,
    ) -> StoreResult<T> {
        self.require(collection)?;
        let _guard = self.tx_lock.write()?;
        Self::catch_up_and_repair(&mut self.state, &mut self.writer, &self.records_path)?;
        let (records, out) = f(&self.state)?;
        self.writer.append_batch(&records)?;
        self.state.catch_up(&self.records_path)?;
        Ok(out)
    }

    // ==================
    // Points
    // ==================

    pub fn create(&mut self, data: PointData) -> StoreResult<PointId> {
        data.validate()?;
        let id = self.write_tx(Collection::Points, |state| {
            let id = PointId(state.high_water + 1);
            let record = StoreRecord::put(
                Collection::Points.as_str(),
                id.to_string(),
                encode(&Point::new(id, data))?,
            );
            Ok((vec![record], id))
        })?;

        let id_str = id.to_string();
        log_event_with_fields(Event::PointCreated, &[("id", id_str.as_str())]);
        Ok(id)
    }

    pub fn read(&mut self, id: PointId) -> StoreResult<Option<Point>> {
        self.read_tx(Collection::Points, |state| state.points.get(&id).cloned())
    }

    pub fn list(&mut self) -> StoreResult<Vec<Point>> {
        self.read_tx(Collection::Points, |state| state.points.values().cloned().collect())
    }

    pub fn count(&mut self) -> StoreResult<usize> {
        self.read_tx(Collection::Points, |state| state.points.len())
    }

    pub fn update(&mut self, point: Point) -> StoreResult<()> {
        point.data.validate()?;
        let id = point.id;
        self.write_tx(Collection::Points, |state| {
            if !state.points.contains_key(&id) {
                return Err(StoreError::not_found(Collection::Points.as_str(), id));
            }
            let record = StoreRecord::put(Collection::Points.as_str(), id.to_string(), encode(&point)?);
            Ok((vec![record], ()))
        })?;

        let id_str = id.to_string();
        log_event_with_fields(Event::PointUpdated, &[("id", id_str.as_str())]);
        Ok(())
    }

    /// Deletes `id`. Returns whether it existed; absence is not an error.
    pub fn delete(&mut self, id: PointId) -> StoreResult<bool> {
        let existed = self.write_tx(Collection::Points, |state| {
            if state.points.contains_key(&id) {
                Ok((vec![StoreRecord::tombstone(Collection::Points.as_str(), id.to_string())], true))
            } else {
                Ok((Vec::new(), false))
            }
        })?;

        if existed {
            let id_str = id.to_string();
            log_event_with_fields(Event::PointDeleted, &[("id", id_str.as_str())]);
        }
        Ok(existed)
    }

    /// Clears all points, then optionally reinserts the reference couloirs.
    ///
    /// Ids keep counting from the high-water mark. Returns the number of
    /// points inserted.
    pub fn reset(&mut self, reseed: bool) -> StoreResult<usize> {
        let seed = if reseed { reference_couloirs() } else { Vec::new() };
        let inserted = self.write_tx(Collection::Points, |state| {
            let mut records = vec![StoreRecord::clear(Collection::Points.as_str())];
            records.extend(seed_records(state.high_water, seed)?);
            let inserted = records.len() - 1;
            Ok((records, inserted))
        })?;

        let inserted_str = inserted.to_string();
        log_event_with_fields(Event::StoreReset, &[("seeded", inserted_str.as_str())]);
        Ok(inserted)
    }

    /// Inserts the reference couloirs only when there are no points.
    pub fn seed_if_empty(&mut self) -> StoreResult<usize> {
        let inserted = self.write_tx(Collection::Points, |state| {
            if !state.points.is_empty() {
                return Ok((Vec::new(), 0));
            }
            let records = seed_records(state.high_water, reference_couloirs())?;
            let inserted = records.len();
            Ok((records, inserted))
        })?;

        if inserted > 0 {
            let inserted_str = inserted.to_string();
            log_event_with_fields(Event::StoreSeeded, &[("points", inserted_str.as_str())]);
        }
        Ok(inserted)
    }

    // ==================
    // Users
    // ==================

    pub fn put_user(&mut self, user: User) -> StoreResult<()> {
        if user.username.is_empty() {
            return Err(StoreError::invalid_record("username must not be empty"));
        }
        self.write_tx(Collection::Users, |_| {
            let record = StoreRecord::put(Collection::Users.as_str(), user.username.clone(), encode(&user)?);
            Ok((vec![record], ()))
        })
    }

    pub fn get_user(&mut self, username: &str) -> StoreResult<Option<User>> {
        self.read_tx(Collection::Users, |state| state.users.get(username).cloned())
    }

    /// Inserts the users whose username is not taken yet.
    pub fn set_default_users(&mut self, users: &[User]) -> StoreResult<usize> {
        let inserted = self.write_tx(Collection::Users, |state| {
            let mut records = Vec::new();
            for user in users {
                if user.username.is_empty() || state.users.contains_key(&user.username) {
                    continue;
                }
                records.push(StoreRecord::put(
                    Collection::Users.as_str(),
                    user.username.clone(),
                    encode(user)?,
                ));
            }
            let inserted = records.len();
            Ok((records, inserted))
        })?;

        if inserted > 0 {
            let inserted_str = inserted.to_string();
            log_event_with_fields(Event::UsersSeeded, &[("users", inserted_str.as_str())]);
        }
        Ok(inserted)
    }

    pub fn verify_credentials(&mut self, username: &str, password_hash: &str) -> StoreResult<Option<User>> {
        self.read_tx(Collection::Users, |state| {
            state
                .users
                .get(username)
                .filter(|user| constant_time_str_eq(&user.password_hash, password_hash))
                .cloned()
        })
    }

    /// Renames a user. Fails if `old` is absent or `new` is taken.
    pub fn update_username(&mut self, old: &str, new: &str) -> StoreResult<User> {
        if new.is_empty() {
            return Err(StoreError::invalid_record("username must not be empty"));
        }
        self.write_tx(Collection::Users, |state| {
            let existing = state
                .users
                .get(old)
                .ok_or_else(|| StoreError::not_found(Collection::Users.as_str(), old))?;
            if old == new {
                return Ok((Vec::new(), existing.clone()));
            }
            if state.users.contains_key(new) {
                return Err(StoreError::operation_failed("username already taken")
                    .with_details(new.to_string()));
            }
            let renamed = User {
                username: new.to_string(),
                ..existing.clone()
            };
            let records = vec![
                StoreRecord::put(Collection::Users.as_str(), new.to_string(), encode(&renamed)?),
                StoreRecord::tombstone(Collection::Users.as_str(), old.to_string()),
            ];
            Ok((records, renamed))
        })
    }

    pub fn update_password(&mut self, username: &str, password_hash: &str) -> StoreResult<()> {
        self.write_tx(Collection::Users, |state| {
            let existing = state
                .users
                .get(username)
                .ok_or_else(|| StoreError::not_found(Collection::Users.as_str(), username))?;
            let updated = User {
                password_hash: password_hash.to_string(),
                ..existing.clone()
            };
            let record = StoreRecord::put(Collection::Users.as_str(), username.to_string(), encode(&updated)?);
            Ok((vec![record], ()))
        })
    }
}

impl Drop for StoreEngine {
    fn drop(&mut self) {
        log_event(Event::StoreClosed);
    }
}

fn check_not_newer(meta: &StoreMeta, target: u32) -> StoreResult<()> {
    if meta.schema_version > target {
        return Err(StoreError::unavailable(format!(
            "Store is at schema version {}, newer than requested {}",
            meta.schema_version, target
        )));
    }
    Ok(())
}

fn seed_records(high_water: u64, seed: Vec<PointData>) -> StoreResult<Vec<StoreRecord>> {
    seed.into_iter()
        .zip(high_water + 1..)
        .map(|(data, id)| {
            let id = PointId(id);
            Ok(StoreRecord::put(
                Collection::Points.as_str(),
                id.to_string(),
                encode(&Point::new(id, data))?,
            ))
        })
        .collect()
}
