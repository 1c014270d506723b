//! Versioned keyed metadata store abstraction.
//!
//! Nodes are addressed by slash-separated string paths and carry opaque
//! bytes plus an integer node version that advances on every write. The node
//! version is the compare-and-set token: an update only succeeds when the
//! caller's expected version matches the store's current one, which is what
//! gives the schema registry linearizable per-key mutation.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::MetadataError;

/// Result type for metadata store operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Node contents paired with the node version they were read at.
///
/// Implementations that cache reads must keep the pair consistent: the
/// returned version is the version of exactly these bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    pub data: Bytes,
    pub node_version: i64,
}

/// A versioned keyed store with optimistic concurrency control.
///
/// The schema registry needs only point reads, racy-create, compare-and-set
/// update and idempotent path creation; list and delete are intentionally
/// absent from this trait.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Reads a node. Returns `None` when the node does not exist.
    async fn get(&self, path: &str) -> Result<Option<VersionedValue>>;

    /// Creates a node with version 0.
    ///
    /// Fails with [`MetadataError::AlreadyExists`] when another creator won
    /// the race; callers treat that as a retry signal, not a failure.
    async fn create(&self, path: &str, data: Bytes) -> Result<()>;

    /// Replaces a node's contents iff its current version equals
    /// `expected_version`, bumping the version by one.
    ///
    /// Fails with [`MetadataError::BadVersion`] when the token is stale;
    /// callers treat that as a retry signal.
    async fn compare_and_set(
        &self,
        path: &str,
        data: Bytes,
        expected_version: i64,
    ) -> Result<()>;

    /// Ensures a path exists, creating an empty node when absent. Tolerates
    /// concurrent creation; never fails with `AlreadyExists`.
    async fn ensure_path(&self, path: &str) -> Result<()>;
}
