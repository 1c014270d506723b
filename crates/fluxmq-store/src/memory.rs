//! In-memory reference implementations of the storage backends.
//!
//! Both stores are lock-free on the hot path (`DashMap`) and keep operation
//! counters, so tests can assert backend traffic (ledger counts for
//! idempotency, read counts for coalescing) without wrapping the stores in
//! mocks. They also serve embedded single-process deployments where schema
//! durability across restarts is not required.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::debug;

use crate::error::{LedgerError, MetadataError};
use crate::ledger::{LedgerCreateOptions, LedgerHandle, LedgerMode, LedgerStore};
use crate::metadata::{MetadataStore, VersionedValue};

/// One ledger: its entries, seal state and creation metadata.
#[derive(Debug)]
struct LedgerState {
    entries: Vec<Bytes>,
    sealed: bool,
    metadata: Vec<(String, String)>,
    created_at: DateTime<Utc>,
}

/// Diagnostic snapshot of a stored ledger.
#[derive(Debug, Clone)]
pub struct LedgerInfo {
    pub entry_count: usize,
    pub sealed: bool,
    pub metadata: Vec<(String, String)>,
    pub created_at: DateTime<Utc>,
}

/// In-memory [`LedgerStore`].
///
/// Ledger ids are assigned from a process-local monotonic counter. Appends
/// through read handles and appends to sealed ledgers are rejected the same
/// way a replicated store would reject them, so engine code exercised against
/// this store sees the full contract.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    ledgers: DashMap<i64, LedgerState>,
    next_ledger_id: AtomicI64,
    ledgers_created: AtomicU64,
    entries_appended: AtomicU64,
    entries_read: AtomicU64,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ledgers ever created.
    pub fn ledgers_created(&self) -> u64 {
        self.ledgers_created.load(Ordering::Relaxed)
    }

    /// Number of entries ever appended.
    pub fn entries_appended(&self) -> u64 {
        self.entries_appended.load(Ordering::Relaxed)
    }

    /// Number of single-entry reads ever served.
    pub fn entries_read(&self) -> u64 {
        self.entries_read.load(Ordering::Relaxed)
    }

    /// Diagnostic view of one ledger, if it exists.
    pub fn ledger_info(&self, ledger_id: i64) -> Option<LedgerInfo> {
        self.ledgers.get(&ledger_id).map(|state| LedgerInfo {
            entry_count: state.entries.len(),
            sealed: state.sealed,
            metadata: state.metadata.clone(),
            created_at: state.created_at,
        })
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn create(&self, options: LedgerCreateOptions) -> Result<LedgerHandle, LedgerError> {
        let ledger_id = self.next_ledger_id.fetch_add(1, Ordering::Relaxed);
        self.ledgers.insert(
            ledger_id,
            LedgerState {
                entries: Vec::new(),
                sealed: false,
                metadata: options.metadata,
                created_at: Utc::now(),
            },
        );
        self.ledgers_created.fetch_add(1, Ordering::Relaxed);
        debug!("created ledger {}", ledger_id);
        Ok(LedgerHandle::new(ledger_id, LedgerMode::Write))
    }

    async fn open(&self, ledger_id: i64) -> Result<LedgerHandle, LedgerError> {
        if !self.ledgers.contains_key(&ledger_id) {
            return Err(LedgerError::NotFound(ledger_id));
        }
        Ok(LedgerHandle::new(ledger_id, LedgerMode::Read))
    }

    async fn append(&self, handle: &LedgerHandle, payload: Bytes) -> Result<i64, LedgerError> {
        if handle.mode() != LedgerMode::Write {
            return Err(LedgerError::NotWritable(handle.id()));
        }
        let mut state = self
            .ledgers
            .get_mut(&handle.id())
            .ok_or(LedgerError::NotFound(handle.id()))?;
        if state.sealed {
            return Err(LedgerError::NotWritable(handle.id()));
        }
        state.entries.push(payload);
        self.entries_appended.fetch_add(1, Ordering::Relaxed);
        Ok((state.entries.len() - 1) as i64)
    }

    async fn read_entry(&self, handle: &LedgerHandle, entry_id: i64) -> Result<Bytes, LedgerError> {
        let state = self
            .ledgers
            .get(&handle.id())
            .ok_or(LedgerError::NotFound(handle.id()))?;
        let payload = usize::try_from(entry_id)
            .ok()
            .and_then(|idx| state.entries.get(idx))
            .cloned()
            .ok_or(LedgerError::EntryNotFound {
                ledger_id: handle.id(),
                entry_id,
            })?;
        self.entries_read.fetch_add(1, Ordering::Relaxed);
        Ok(payload)
    }

    async fn close(&self, handle: &LedgerHandle) -> Result<(), LedgerError> {
        if handle.mode() == LedgerMode::Read {
            return Ok(());
        }
        let mut state = self
            .ledgers
            .get_mut(&handle.id())
            .ok_or(LedgerError::NotFound(handle.id()))?;
        if !state.sealed {
            state.sealed = true;
            debug!("sealed ledger {}", handle.id());
        }
        Ok(())
    }
}

/// One metadata node: contents plus the CAS version.
#[derive(Debug)]
struct NodeState {
    data: Bytes,
    version: i64,
}

/// In-memory [`MetadataStore`].
///
/// Node versions start at 0 on creation and advance by one on every
/// compare-and-set, mirroring the semantics of versioned coordination
/// stores.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    nodes: DashMap<String, NodeState>,
    node_gets: AtomicU64,
    node_writes: AtomicU64,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of point reads ever served.
    pub fn node_gets(&self) -> u64 {
        self.node_gets.load(Ordering::Relaxed)
    }

    /// Number of successful creates and compare-and-sets.
    pub fn node_writes(&self) -> u64 {
        self.node_writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, path: &str) -> Result<Option<VersionedValue>, MetadataError> {
        self.node_gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.nodes.get(path).map(|node| VersionedValue {
            data: node.data.clone(),
            node_version: node.version,
        }))
    }

    async fn create(&self, path: &str, data: Bytes) -> Result<(), MetadataError> {
        match self.nodes.entry(path.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(MetadataError::AlreadyExists(path.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(NodeState { data, version: 0 });
                self.node_writes.fetch_add(1, Ordering::Relaxed);
                debug!("created metadata node {}", path);
                Ok(())
            }
        }
    }

    async fn compare_and_set(
        &self,
        path: &str,
        data: Bytes,
        expected_version: i64,
    ) -> Result<(), MetadataError> {
        let mut node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| MetadataError::NotFound(path.to_string()))?;
        if node.version != expected_version {
            return Err(MetadataError::BadVersion {
                path: path.to_string(),
                expected: expected_version,
                actual: node.version,
            });
        }
        node.data = data;
        node.version += 1;
        self.node_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn ensure_path(&self, path: &str) -> Result<(), MetadataError> {
        if let dashmap::mapref::entry::Entry::Vacant(slot) = self.nodes.entry(path.to_string()) {
            slot.insert(NodeState {
                data: Bytes::new(),
                version: 0,
            });
            self.node_writes.fetch_add(1, Ordering::Relaxed);
            debug!("created metadata path {}", path);
        }
        Ok(())
    }
}
