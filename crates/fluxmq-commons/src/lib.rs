//! # fluxmq-commons
//!
//! Shared vocabulary for FluxMQ components: type-safe identifiers, the schema
//! registry data model, configuration types and well-known constants.
//!
//! This crate deliberately stays free of I/O and runtime dependencies so that
//! every other crate in the workspace can depend on it without pulling in a
//! storage backend or an async runtime.

pub mod config;
pub mod constants;
pub mod ids;
pub mod models;

pub use config::{DigestType, LedgerConfig, SchemaStorageConfig};
pub use ids::{InvalidVersionBytes, SchemaId, SchemaVersion};
pub use models::{
    IndexEntry, LocatorEntry, Position, SchemaEntry, SchemaLocator, StoredSchema, VersionSelector,
};
