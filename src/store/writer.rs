//! Append-only record writer
//!
//! Every append is fsynced before it is acknowledged. Records are never
//! rewritten in place; the only change to existing bytes is cutting off an
//! incomplete tail.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};
use super::record::StoreRecord;

pub struct RecordWriter {
    path: PathBuf,
    file: File,
}

impl RecordWriter {
    /// Opens or creates the record file for appending.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                StoreError::io_error(format!("Failed to open record file: {}", path.display()), e)
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record with fsync.
    ///
    /// Returns the byte offset the record was written at.
    pub fn append(&mut self, record: &StoreRecord) -> StoreResult<u64> {
        self.append_batch(std::slice::from_ref(record))
    }

    /// Appends a batch of records with one write and one fsync.
    ///
    /// Returns the byte offset the batch starts at. Other connections may
    /// have appended since the last call, so the offset is taken from the
    /// file itself. On failure the file is cut back to that offset, so a
    /// batch is either fully present or absent.
    pub fn append_batch(&mut self, records: &[StoreRecord]) -> StoreResult<u64> {
        let offset = self.len()?;
        if records.is_empty() {
            return Ok(offset);
        }

        let mut serialized = Vec::new();
        for record in records {
            serialized.extend_from_slice(&record.serialize());
        }

        let written = self
            .file
            .write_all(&serialized)
            .map_err(|e| StoreError::io_error(format!("Failed to write {} records", records.len()), e))
            .and_then(|()| {
                self.file
                    .sync_all()
                    .map_err(|e| StoreError::io_error("fsync failed after writing records", e))
            });

        if let Err(e) = written {
            // A failed rollback leaves a torn tail for the next writer to cut.
            let _ = self.file.set_len(offset);
            return Err(e);
        }
        Ok(offset)
    }

    /// Cuts the file back to `len` bytes.
    pub fn truncate(&mut self, len: u64) -> StoreResult<()> {
        self.file
            .set_len(len)
            .and_then(|()| self.file.sync_all())
            .map_err(|e| StoreError::io_error(format!("Failed to truncate record file to {} bytes", len), e))
    }

    fn len(&self) -> StoreResult<u64> {
        Ok(self
            .file
            .metadata()
            .map_err(|e| StoreError::io_error("Failed to read record file metadata", e))?
            .len())
    }
}

#[cfg(test)]
mod tests {
    use super::super::reader::RecordReader;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_offsets_follow_other_writers() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.dat");

        let mut a = RecordWriter::open(&path).unwrap();
        let mut b = RecordWriter::open(&path).unwrap();

        let first = StoreRecord::put("points", "1", b"{}".to_vec());
        let len = first.serialize().len() as u64;

        assert_eq!(a.append(&first).unwrap(), 0);
        assert_eq!(b.append(&first).unwrap(), len);
        assert_eq!(a.append(&first).unwrap(), 2 * len);
        assert_eq!(std::fs::metadata(a.path()).unwrap().len(), 3 * len);
    }

    #[test]
    fn test_batch_is_one_contiguous_append() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.dat");
        let mut writer = RecordWriter::open(&path).unwrap();

        let batch = vec![
            StoreRecord::clear("points"),
            StoreRecord::put("points", "7", b"{}".to_vec()),
            StoreRecord::put("points", "8", b"{}".to_vec()),
        ];
        let total: usize = batch.iter().map(|r| r.serialize().len()).sum();

        assert_eq!(writer.append_batch(&batch).unwrap(), 0);
        assert_eq!(writer.append_batch(&[]).unwrap(), total as u64);

        let mut reader = RecordReader::open_at(&path, 0).unwrap();
        for expected in &batch {
            assert_eq!(&reader.read_next().unwrap().unwrap(), expected);
        }
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_truncate_cuts_tail() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.dat");
        let mut writer = RecordWriter::open(&path).unwrap();

        let first = writer.append(&StoreRecord::tombstone("points", "1")).unwrap();
        let second = writer.append(&StoreRecord::tombstone("points", "2")).unwrap();
        assert_eq!(first, 0);

        writer.truncate(second).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), second);
        // Appends continue at the new end.
        assert_eq!(writer.append(&StoreRecord::tombstone("points", "3")).unwrap(), second);
    }
}
