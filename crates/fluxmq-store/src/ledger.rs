//! Append-only ledger store abstraction.
//!
//! A ledger is a numbered, append-only sequence of opaque entries. The schema
//! registry uses ledgers as one-entry containers: each write creates a
//! ledger, appends a single entry and seals it; each read opens the ledger,
//! reads one entry and closes it again.

use async_trait::async_trait;
use bytes::Bytes;
use fluxmq_commons::DigestType;

use crate::error::LedgerError;

/// Result type for ledger store operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Whether a handle was obtained by creating or by opening a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Handle from [`LedgerStore::create`]; appends are allowed until close.
    Write,
    /// Handle from [`LedgerStore::open`]; read-only.
    Read,
}

/// An opened ledger. Handles are plain values; the store validates them on
/// every call, so a stale handle fails the operation rather than the process.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    id: i64,
    mode: LedgerMode,
}

impl LedgerHandle {
    /// Creates a handle. Intended for [`LedgerStore`] implementations.
    pub fn new(id: i64, mode: LedgerMode) -> Self {
        Self { id, mode }
    }

    /// The store-assigned ledger id.
    #[inline]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// How this handle was obtained.
    #[inline]
    pub fn mode(&self) -> LedgerMode {
        self.mode
    }
}

/// Settings for a new ledger: replication quorums, entry digest, password and
/// diagnostic metadata tags.
#[derive(Debug, Clone)]
pub struct LedgerCreateOptions {
    pub ensemble_size: u32,
    pub write_quorum: u32,
    pub ack_quorum: u32,
    pub digest_type: DigestType,
    pub password: Bytes,
    /// Application-level tags stored in the ledger metadata, visible to
    /// offline tooling inspecting the store.
    pub metadata: Vec<(String, String)>,
}

/// An append-only entry store.
///
/// Implementations must be thread-safe (`Send + Sync`); the engine shares one
/// store across all in-flight operations as an `Arc<dyn LedgerStore>`.
/// Entries are immutable once appended and survive process restarts for
/// durable implementations. A sealed (closed) ledger never accepts further
/// appends.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Creates a new ledger and returns a write handle for it.
    ///
    /// The returned handle is the only way to append to the ledger. Fails
    /// with [`LedgerError::Io`] when the quorum cannot be assembled.
    async fn create(&self, options: LedgerCreateOptions) -> Result<LedgerHandle>;

    /// Opens an existing ledger for reading.
    ///
    /// Fails with [`LedgerError::NotFound`] when the ledger does not exist.
    async fn open(&self, ledger_id: i64) -> Result<LedgerHandle>;

    /// Appends one entry and returns its assigned entry id.
    ///
    /// The entry is durable across the ack quorum before this returns. Fails
    /// with [`LedgerError::NotWritable`] on read handles and sealed ledgers.
    async fn append(&self, handle: &LedgerHandle, payload: Bytes) -> Result<i64>;

    /// Reads exactly one entry.
    ///
    /// Fails with [`LedgerError::EntryNotFound`] when `entry_id` is past the
    /// last appended entry.
    async fn read_entry(&self, handle: &LedgerHandle, entry_id: i64) -> Result<Bytes>;

    /// Closes the handle. Closing a write handle seals the ledger; closing a
    /// read handle releases it. Idempotent: closing twice is not an error,
    /// and a failed close does not invalidate prior appends or reads.
    async fn close(&self, handle: &LedgerHandle) -> Result<()>;
}
