//! Error types for the storage backends.
//!
//! Both enums are `Clone` with owned `String` payloads: results cross task
//! boundaries and are fanned out to multiple waiters by the layers above.

use thiserror::Error;

/// Errors raised by a [`crate::LedgerStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The referenced ledger does not exist in the store.
    #[error("ledger not found: {0}")]
    NotFound(i64),

    /// The referenced entry does not exist within the ledger.
    #[error("entry {entry_id} not found in ledger {ledger_id}")]
    EntryNotFound { ledger_id: i64, entry_id: i64 },

    /// Append attempted on a sealed ledger or through a read handle.
    #[error("ledger {0} is not open for writing")]
    NotWritable(i64),

    /// I/O or quorum failure in the underlying store.
    #[error("ledger I/O error: {0}")]
    Io(String),

    /// Internal lock poisoned by a panicking thread.
    #[error("ledger store lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Errors raised by a [`crate::MetadataStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The node does not exist.
    #[error("metadata node not found: {0}")]
    NotFound(String),

    /// Creation lost a race against another creator.
    #[error("metadata node already exists: {0}")]
    AlreadyExists(String),

    /// Compare-and-set observed a stale node version.
    #[error("stale node version for {path}: expected {expected}, actual {actual}")]
    BadVersion {
        path: String,
        expected: i64,
        actual: i64,
    },

    /// I/O failure in the underlying store, after its own retries.
    #[error("metadata I/O error: {0}")]
    Io(String),

    /// Internal lock poisoned by a panicking thread.
    #[error("metadata store lock poisoned: {0}")]
    LockPoisoned(String),
}
