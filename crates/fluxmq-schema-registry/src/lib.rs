//! # fluxmq-schema-registry
//!
//! Versioned, append-only schema registry storage engine for the FluxMQ
//! broker. Producers and consumers of a topic register opaque schema blobs
//! plus a content hash against a schema id; each successful registration
//! yields a dense, monotonically increasing 64-bit version. Readers fetch
//! the latest version, a specific historical version, or the full history.
//!
//! The engine composes two backends from [`fluxmq_store`]:
//!
//! - an append-only **ledger store** holding one immutable entry per schema
//!   version, and
//! - a versioned **metadata store** holding one CAS-protected locator node
//!   per schema id, which is the commit point for every write.
//!
//! Concurrent writers of the same key are serialized by the locator CAS;
//! lost races retry from the locator read. Concurrent latest-reads of the
//! same key are coalesced into a single backend round-trip.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use fluxmq_schema_registry::{LedgerSchemaStorage, SchemaId, SchemaStorageConfig};
//! use fluxmq_store::{MemoryLedgerStore, MemoryMetadataStore};
//!
//! # async fn demo() -> fluxmq_schema_registry::Result<()> {
//! let storage = LedgerSchemaStorage::new(
//!     SchemaStorageConfig::default(),
//!     Arc::new(MemoryLedgerStore::new()),
//!     Arc::new(MemoryMetadataStore::new()),
//! );
//! storage.init().await?;
//! storage.start()?;
//!
//! let schema_id = SchemaId::new("public/default/orders");
//! let version = storage
//!     .put(&schema_id, Bytes::from_static(b"{}"), Bytes::from_static(b"\xAA"))
//!     .await?;
//! assert_eq!(version.get(), 0);
//!
//! let latest = storage.get_latest(&schema_id).await?.unwrap();
//! assert_eq!(latest.version, version);
//! # Ok(())
//! # }
//! ```

mod coalescer;
mod ledger;
mod locator;
mod storage;

pub mod error;
pub mod format;

pub use error::{Result, SchemaRegistryError};
pub use storage::LedgerSchemaStorage;

// Re-export the shared vocabulary so engine consumers need no direct
// dependency on the commons crate.
pub use fluxmq_commons::{
    SchemaId, SchemaStorageConfig, SchemaVersion, StoredSchema, VersionSelector,
};
