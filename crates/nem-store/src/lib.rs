// Copyright 2024 Nemos Contributors.
// This file is part of nemos.

// nemos is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// nemos is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with nemos.  If not, see <http://www.gnu.org/licenses/>.

//! The append-only block log: newline-delimited JSON `BlockRecord`s,
//! one per line, with in-memory hash/height indices keyed by byte
//! offset. Single writer (the state engine); readers (sync) open their
//! own file handle so they never contend with the writer's cursor.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use nem_core::{Block, BlockRecord, Hash};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt block record at byte offset {offset}: {source}")]
    CorruptRecord {
        offset: u64,
        source: serde_json::Error,
    },
    #[error("failed to encode block record: {0}")]
    Encode(serde_json::Error),
    #[error("hash {0} is not present in the block log")]
    UnknownHash(Hash),
}

pub struct BlockLog {
    path: PathBuf,
    file: File,
    hash_index: HashMap<Hash, u64>,
    height_index: HashMap<u64, u64>,
}

impl BlockLog {
    /// Opens (creating if absent) the log at `path` in append+read mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;
        Ok(BlockLog {
            path,
            file,
            hash_index: HashMap::new(),
            height_index: HashMap::new(),
        })
    }

    /// Scans the log from byte 0, rebuilding the hash/height indices,
    /// and returns every record in order. A record that fails to
    /// decode is fatal — the log is assumed trusted, so a corrupt tail
    /// must never be silently skipped past valid records. Trailing
    /// empty lines are treated as end-of-log, not corruption.
    pub fn replay(&mut self) -> Result<Vec<BlockRecord>, StoreError> {
        self.hash_index.clear();
        self.height_index.clear();

        let entries = read_records_from(&self.path, 0)?;
        let mut records = Vec::with_capacity(entries.len());
        for (offset, record) in entries {
            self.hash_index.insert(record.hash, offset);
            self.height_index.insert(record.value.header.number, offset);
            records.push(record);
        }
        Ok(records)
    }

    /// Appends `record`, returning the byte offset it was written at.
    /// Writes are record-at-a-time with no intra-record buffering, so a
    /// crash can truncate at most the trailing partial record.
    pub fn append(&mut self, record: &BlockRecord) -> Result<u64, StoreError> {
        let mut encoded = serde_json::to_vec(record).map_err(StoreError::Encode)?;
        encoded.push(b'\n');

        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&encoded)?;
        self.file.flush()?;

        self.hash_index.insert(record.hash, offset);
        self.height_index.insert(record.value.header.number, offset);
        Ok(offset)
    }

    pub fn hash_index(&self) -> &HashMap<Hash, u64> {
        &self.hash_index
    }

    pub fn height_index(&self) -> &HashMap<u64, u64> {
        &self.height_index
    }

    /// Blocks strictly after `from_hash`. If `from_hash` is the empty
    /// sentinel, returns the entire log. Opens an independent read
    /// handle, never disturbing the writer's append cursor.
    pub fn read_after(&self, from_hash: Hash) -> Result<Vec<Block>, StoreError> {
        if from_hash.is_empty() {
            let entries = read_records_from(&self.path, 0)?;
            return Ok(entries.into_iter().map(|(_, r)| r.value).collect());
        }

        let start_offset = *self
            .hash_index
            .get(&from_hash)
            .ok_or(StoreError::UnknownHash(from_hash))?;

        let entries = read_records_from(&self.path, start_offset)?;
        Ok(entries
            .into_iter()
            .skip(1) // the record at `from_hash` itself, not "after" it
            .map(|(_, r)| r.value)
            .collect())
    }
}

/// Reads `(offset, record)` pairs starting at `start_offset`, using a
/// fresh file handle so callers never share a cursor with the writer.
fn read_records_from(path: &Path, start_offset: u64) -> Result<Vec<(u64, BlockRecord)>, StoreError> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(start_offset))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    let mut entries = Vec::new();
    let mut offset = start_offset;
    for line in buf.split(|&b| b == b'\n') {
        if line.is_empty() {
            break;
        }
        let record: BlockRecord =
            serde_json::from_slice(line).map_err(|source| StoreError::CorruptRecord { offset, source })?;
        offset += line.len() as u64 + 1;
        entries.push((offset - line.len() as u64 - 1, record));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nem_core::{Address, BlockRecord};

    fn sample_record(number: u64, parent: Hash) -> BlockRecord {
        let block = Block::new(parent, number, number as u32, 1_700_000_000 + number, Address::ZERO, vec![]);
        BlockRecord::new(block.hash(), block)
    }

    #[test]
    fn append_then_replay_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.db");

        let mut log = BlockLog::open(&path).unwrap();
        let genesis_block = sample_record(0, Hash::ZERO);
        log.append(&genesis_block).unwrap();
        let next_block = sample_record(1, genesis_block.hash);
        log.append(&next_block).unwrap();

        let mut reopened = BlockLog::open(&path).unwrap();
        let records = reopened.replay().unwrap();
        assert_eq!(records, vec![genesis_block, next_block]);
    }

    #[test]
    fn read_after_returns_strictly_later_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.db");

        let mut log = BlockLog::open(&path).unwrap();
        let r0 = sample_record(0, Hash::ZERO);
        log.append(&r0).unwrap();
        let r1 = sample_record(1, r0.hash);
        log.append(&r1).unwrap();
        let r2 = sample_record(2, r1.hash);
        log.append(&r2).unwrap();

        let after_genesis = log.read_after(r0.hash).unwrap();
        assert_eq!(after_genesis, vec![r1.value.clone(), r2.value.clone()]);

        let everything = log.read_after(Hash::ZERO).unwrap();
        assert_eq!(everything, vec![r0.value, r1.value, r2.value]);
    }

    #[test]
    fn unknown_hash_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.db");
        let log = BlockLog::open(&path).unwrap();
        assert!(matches!(
            log.read_after(Hash::sha256(b"nope")),
            Err(StoreError::UnknownHash(_))
        ));
    }

    #[test]
    fn corrupt_record_is_fatal_not_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.db");
        std::fs::write(&path, b"{not valid json}\n").unwrap();

        let mut log = BlockLog::open(&path).unwrap();
        assert!(matches!(log.replay(), Err(StoreError::CorruptRecord { .. })));
    }
}
