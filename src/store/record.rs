//! Store record format
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole record)
//! +------------------+
//! | Collection       | (length-prefixed string)
//! +------------------+
//! | Key              | (length-prefixed string)
//! +------------------+
//! | Kind             | (u8: 0 = put, 1 = tombstone, 2 = clear)
//! +------------------+
//! | Body             | (length-prefixed bytes, JSON for puts)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! The checksum covers every byte before it. Within a collection the latest
//! record for a key wins; a clear record drops everything before it.

use std::io::{self, Cursor, Read};

use super::checksum::compute_checksum;

/// len + collection + key + kind + body + checksum, with empty strings
pub const MIN_RECORD_SIZE: usize = 4 + 4 + 4 + 1 + 4 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Put = 0,
    Tombstone = 1,
    Clear = 2,
}

impl RecordKind {
    fn from_u8(value: u8) -> io::Result<Self> {
        match value {
            0 => Ok(RecordKind::Put),
            1 => Ok(RecordKind::Tombstone),
            2 => Ok(RecordKind::Clear),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown record kind: {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRecord {
    pub collection: String,
    pub key: String,
    pub kind: RecordKind,
    pub body: Vec<u8>,
}

impl StoreRecord {
    pub fn put(collection: &str, key: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            collection: collection.to_string(),
            key: key.into(),
            kind: RecordKind::Put,
            body,
        }
    }

    pub fn tombstone(collection: &str, key: impl Into<String>) -> Self {
        Self {
            collection: collection.to_string(),
            key: key.into(),
            kind: RecordKind::Tombstone,
            body: Vec::new(),
        }
    }

    pub fn clear(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            key: String::new(),
            kind: RecordKind::Clear,
            body: Vec::new(),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&(self.collection.len() as u32).to_le_bytes());
        body.extend_from_slice(self.collection.as_bytes());
        body.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        body.extend_from_slice(self.key.as_bytes());
        body.push(self.kind as u8);
        body.extend_from_slice(&(self.body.len() as u32).to_le_bytes());
        body.extend_from_slice(&self.body);

        let record_length = (4 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);
        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());
        record
    }

    /// Deserializes one record, verifying its checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Record too short",
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }
        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed = compute_checksum(&data[..checksum_offset]);
        if computed != stored {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed, stored
                ),
            ));
        }

        let mut cursor = Cursor::new(&data[4..checksum_offset]);
        let collection = read_string(&mut cursor)?;
        let key = read_string(&mut cursor)?;
        let mut kind = [0u8; 1];
        cursor.read_exact(&mut kind)?;
        let kind = RecordKind::from_u8(kind[0])?;
        let body = read_bytes(&mut cursor)?;

        Ok((
            Self {
                collection,
                key,
                kind,
                body,
            },
            record_length,
        ))
    }
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let mut buf = vec![0u8; u32::from_le_bytes(len_buf) as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    String::from_utf8(read_bytes(reader)?)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e)))
}
