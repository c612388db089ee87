//! Advisory file locks shared by every connection to one store directory.
//!
//! `store.lock` serializes transactions: shared for reads, exclusive for
//! writes. `connections.lock` is held shared by every open connection for
//! its whole lifetime; a schema upgrade needs it exclusively.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use fs2::FileExt;

use super::errors::{StoreError, StoreResult};

fn open_lock_file(path: &Path) -> StoreResult<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|e| StoreError::unavailable(format!("open lock {}: {}", path.display(), e)))
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == fs2::lock_contended_error().kind()
}

/// Transaction lock file, locked per operation.
pub struct TransactionLock {
    file: File,
}

/// Held while a transaction runs; unlocks on drop.
pub struct TransactionGuard<'a> {
    file: &'a File,
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl TransactionLock {
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self {
            file: open_lock_file(path)?,
        })
    }

    pub fn read(&self) -> StoreResult<TransactionGuard<'_>> {
        self.file
            .lock_shared()
            .map_err(|e| StoreError::io_error("acquire shared store lock", e))?;
        Ok(TransactionGuard { file: &self.file })
    }

    pub fn write(&self) -> StoreResult<TransactionGuard<'_>> {
        self.file
            .lock_exclusive()
            .map_err(|e| StoreError::io_error("acquire exclusive store lock", e))?;
        Ok(TransactionGuard { file: &self.file })
    }
}

/// Result of trying to take the connection lock exclusively.
pub enum UpgradeAttempt {
    Acquired,
    Contended,
}

/// Connection registration, released when dropped.
pub struct ConnectionLock {
    file: File,
}

impl Drop for ConnectionLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl ConnectionLock {
    /// Opens the lock file without locking it.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self {
            file: open_lock_file(path)?,
        })
    }

    /// Registers as a plain connection. Waits out a running upgrade.
    pub fn share(&self) -> StoreResult<()> {
        self.file
            .lock_shared()
            .map_err(|e| StoreError::unavailable(format!("register connection: {}", e)))
    }

    /// Takes the lock exclusively if no other connection is open.
    pub fn try_upgrade(&self) -> StoreResult<UpgradeAttempt> {
        match self.file.try_lock_exclusive() {
            Ok(()) => Ok(UpgradeAttempt::Acquired),
            Err(e) if is_contended(&e) => Ok(UpgradeAttempt::Contended),
            Err(e) => Err(StoreError::unavailable(format!("acquire upgrade lock: {}", e))),
        }
    }

    /// Waits until every other connection has closed.
    pub fn upgrade(&self) -> StoreResult<()> {
        self.file
            .lock_exclusive()
            .map_err(|e| StoreError::unavailable(format!("acquire upgrade lock: {}", e)))
    }

    /// Drops back from exclusive to shared once the upgrade is done.
    pub fn downgrade(&self) -> StoreResult<()> {
        self.file
            .unlock()
            .map_err(|e| StoreError::unavailable(format!("release upgrade lock: {}", e)))?;
        self.share()
    }
}
