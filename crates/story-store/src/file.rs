use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use story_types::Address;
use tracing::{debug, warn};

use crate::account::Account;
use crate::error::{StoreError, StoreResult};
use crate::traits::AccountStore;

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Account store backed by an append-only commit log.
///
/// Every committed batch becomes exactly one record:
///
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized Vec<(Address, Account)>)]
/// ```
///
/// Opening the store replays the log front-to-back into an in-memory index.
/// A final record that fails its CRC, or is cut short by a crash, is dropped
/// as a whole and truncated away, so a batch is either fully replayed or not
/// at all. A bad record with data after it is reported as
/// [`StoreError::Corrupt`] and the file is left untouched.
pub struct FileAccountStore {
    path: PathBuf,
    inner: RwLock<FileState>,
}

struct FileState {
    file: File,
    /// Length of the log up to the last good record.
    offset: u64,
    accounts: BTreeMap<Address, Account>,
}

impl FileAccountStore {
    /// Open (or create) the log at `path` and replay it.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;
        let Replay {
            accounts,
            good_end: offset,
            records,
            tail,
        } = replay(&raw);

        match tail {
            Tail::Clean => {}
            Tail::Torn => {
                warn!(
                    path = %path.display(),
                    good = offset,
                    total = raw.len(),
                    "discarding torn tail of account log"
                );
                file.set_len(offset)?;
            }
            Tail::Corrupt => return Err(StoreError::Corrupt { offset }),
        }
        debug!(records, accounts = accounts.len(), "account log replayed");

        Ok(Self {
            path: path.to_path_buf(),
            inner: RwLock::new(FileState {
                file,
                offset,
                accounts,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// How replay ended.
#[derive(Debug, PartialEq, Eq)]
enum Tail {
    /// Every byte belonged to a good record.
    Clean,
    /// The first bad record runs to end of file: a write cut short.
    Torn,
    /// A bad record is followed by more data.
    Corrupt,
}

struct Replay {
    accounts: BTreeMap<Address, Account>,
    /// End offset of the last good record.
    good_end: u64,
    records: usize,
    tail: Tail,
}

fn replay(raw: &[u8]) -> Replay {
    let mut accounts = BTreeMap::new();
    let mut offset = 0usize;
    let mut records = 0usize;

    let tail = loop {
        if offset == raw.len() {
            break Tail::Clean;
        }
        if offset + HEADER_SIZE > raw.len() {
            warn!(offset, "partial account log header; stopping replay");
            break Tail::Torn;
        }
        let length = u32::from_le_bytes([
            raw[offset],
            raw[offset + 1],
            raw[offset + 2],
            raw[offset + 3],
        ]) as usize;
        let expected_crc = u32::from_le_bytes([
            raw[offset + 4],
            raw[offset + 5],
            raw[offset + 6],
            raw[offset + 7],
        ]);

        let start = offset + HEADER_SIZE;
        let end = start.saturating_add(length);
        let bad = if end >= raw.len() { Tail::Torn } else { Tail::Corrupt };
        if length == 0 || end > raw.len() {
            warn!(offset, length, "truncated account log record; stopping replay");
            break bad;
        }
        let payload = &raw[start..end];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch in account log; stopping replay"
            );
            break bad;
        }
        match bincode::deserialize::<Vec<(Address, Account)>>(payload) {
            Ok(batch) => {
                for (address, account) in batch {
                    accounts.insert(address, account);
                }
            }
            Err(e) => {
                warn!(offset, error = %e, "undecodable account log record; stopping replay");
                break bad;
            }
        }
        offset = end;
        records += 1;
    };

    Replay {
        accounts,
        good_end: offset as u64,
        records,
        tail,
    }
}

impl AccountStore for FileAccountStore {
    fn get(&self, address: &Address) -> StoreResult<Option<Account>> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.accounts.get(address).cloned())
    }

    fn scan(&self) -> StoreResult<Vec<(Address, Account)>> {
        let state = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state
            .accounts
            .iter()
            .map(|(a, acc)| (*a, acc.clone()))
            .collect())
    }

    fn commit(&self, writes: &[(Address, Account)]) -> StoreResult<()> {
        if writes.is_empty() {
            return Ok(());
        }
        let payload =
            bincode::serialize(writes).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .map_err(|_| StoreError::Serialization("batch too large".into()))?;
        let crc = crc32fast::hash(&payload);

        let mut record = Vec::with_capacity(HEADER_SIZE + payload.len());
        record.extend_from_slice(&length.to_le_bytes());
        record.extend_from_slice(&crc.to_le_bytes());
        record.extend_from_slice(&payload);

        let mut state = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let written = state
            .file
            .write_all(&record)
            .and_then(|()| state.file.sync_data());
        if let Err(e) = written {
            // Cut any partial record so later appends stay readable.
            let offset = state.offset;
            if let Err(trunc) = state.file.set_len(offset) {
                warn!(error = %trunc, "failed to truncate partial account log record");
            }
            return Err(e.into());
        }

        state.offset += record.len() as u64;
        for (address, account) in writes {
            state.accounts.insert(*address, account.clone());
        }
        debug!(entries = writes.len(), offset = state.offset, "account batch committed");
        Ok(())
    }
}

impl std::fmt::Debug for FileAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAccountStore")
            .field("path", &self.path)
            .finish()
    }
}
