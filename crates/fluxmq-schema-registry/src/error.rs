//! Error type of the schema registry storage engine.

use fluxmq_commons::InvalidVersionBytes;
use fluxmq_store::{LedgerError, MetadataError};
use thiserror::Error;

/// Result type for schema registry operations.
pub type Result<T> = std::result::Result<T, SchemaRegistryError>;

/// Errors surfaced by the schema registry storage engine.
///
/// Locator races (`AlreadyExists` / `BadVersion` underneath
/// [`SchemaRegistryError::Metadata`]) never reach callers: the write path
/// consumes them and retries from the locator read. Everything else is
/// terminal at the engine level; the caller decides whether to retry.
///
/// The type is `Clone` because a coalesced latest-read delivers the same
/// terminal outcome to every piggy-backed waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaRegistryError {
    /// Ledger store failure: quorum loss, missing ledger or missing entry.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Metadata store failure, after the store's own retry policy.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Stored bytes cannot be parsed; corruption or an unknown format.
    #[error("failed to decode stored schema record: {0}")]
    Decode(String),

    /// A version blob shorter than the 8-byte wire form.
    #[error(transparent)]
    InvalidVersionBytes(#[from] InvalidVersionBytes),

    /// An operation needed the ledger client before `start` was called.
    #[error("schema storage is not started")]
    NotStarted,

    /// Invariant violation inside the engine.
    #[error("internal schema storage error: {0}")]
    Internal(String),
}

impl SchemaRegistryError {
    pub(crate) fn decode(err: prost::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}
