//! Type-safe identifier wrappers used across FluxMQ.

mod schema_id;
mod schema_version;

pub use schema_id::SchemaId;
pub use schema_version::{InvalidVersionBytes, SchemaVersion};
