//! Sequential record reader with corruption detection
//!
//! Every record read is checksum-verified. A torn or corrupted record is
//! reported as `COULOIR_DATA_CORRUPTION` at its byte offset. A record cut
//! short by the end of the file is additionally flagged as an incomplete
//! tail, which a writer may cut off.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::errors::{StoreError, StoreResult};
use super::record::{StoreRecord, MIN_RECORD_SIZE};

pub struct RecordReader {
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
    incomplete_tail: bool,
}

impl RecordReader {
    /// Opens the record file positioned at `offset`.
    pub fn open_at(path: &Path, offset: u64) -> StoreResult<Self> {
        let file = File::open(path).map_err(|e| {
            StoreError::io_error(format!("Failed to open record file: {}", path.display()), e)
        })?;
        let file_size = file
            .metadata()
            .map_err(|e| StoreError::io_error("Failed to read record file metadata", e))?
            .len();

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(offset)).map_err(|e| {
            StoreError::io_error(format!("Failed to seek to offset {}", offset), e)
        })?;

        Ok(Self {
            reader,
            current_offset: offset,
            file_size,
            incomplete_tail: false,
        })
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Whether the last error was a record running past the end of the file.
    pub fn at_incomplete_tail(&self) -> bool {
        self.incomplete_tail
    }

    /// Reads the next record, `Ok(None)` at end of file.
    pub fn read_next(&mut self) -> StoreResult<Option<StoreRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_SIZE as u64 {
            self.incomplete_tail = true;
            return Err(StoreError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated record file: {} bytes remaining, minimum record size is {}",
                    remaining, MIN_RECORD_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StoreError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record length: {}", e),
            )
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 || record_length > remaining {
            self.incomplete_tail = record_length >= MIN_RECORD_SIZE as u64;
            return Err(StoreError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Invalid record length {} with {} bytes remaining",
                    record_length, remaining
                ),
            ));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StoreError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record body: {}", e),
            )
        })?;

        let (record, consumed) = StoreRecord::deserialize(&record_buf)
            .map_err(|e| StoreError::corruption_at_offset(self.current_offset, e.to_string()))?;
        self.current_offset += consumed as u64;

        Ok(Some(record))
    }
}
