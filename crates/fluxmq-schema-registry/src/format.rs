//! Wire format of schema registry records.
//!
//! Records are protobuf-encoded: a stable tag-length-value format where
//! absent scalar fields decode to their zero value and unknown fields are
//! skipped, so old readers tolerate new writers and vice versa. The messages
//! are declared directly with the prost derive, the same way the broker's
//! cluster RPC message types are; there is no `.proto` source and no
//! build-time code generation.
//!
//! Two records exist on disk:
//!
//! - the locator node in the metadata store ([`SchemaLocator`] payload), and
//! - the single entry of each schema ledger ([`SchemaEntry`] payload).

use bytes::Bytes;
use prost::Message;

use fluxmq_commons::{IndexEntry, Position, SchemaEntry, SchemaLocator, SchemaVersion};

use crate::error::{Result, SchemaRegistryError};

/// Protobuf message declarations, written out by hand rather than generated
/// from a `.proto` file. Field tags are part of the on-disk format and must
/// never be reassigned.
mod wire {
    use bytes::Bytes;

    /// Ledger coordinates of one stored schema entry.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct PositionInfo {
        /// Ledger the entry lives in; -1 when no entry backs the record.
        #[prost(int64, tag = "1")]
        pub ledger_id: i64,

        /// Entry within the ledger; -1 when no entry backs the record.
        #[prost(int64, tag = "2")]
        pub entry_id: i64,
    }

    /// One version of a schema history.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct IndexEntry {
        /// Version number, dense per schema id.
        #[prost(uint64, tag = "1")]
        pub version: u64,

        /// Caller-supplied content hash; empty for tombstones.
        #[prost(bytes = "bytes", tag = "2")]
        pub hash: Bytes,

        /// Where the schema entry for this version is stored.
        #[prost(message, optional, tag = "3")]
        pub position: Option<PositionInfo>,
    }

    /// Payload of a schema ledger entry.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct SchemaEntry {
        /// The registered schema bytes, opaque to the engine.
        #[prost(bytes = "bytes", tag = "1")]
        pub schema_data: Bytes,

        /// Index entries known when this entry was written, oldest first.
        #[prost(message, repeated, tag = "2")]
        pub index: Vec<IndexEntry>,
    }

    /// Payload of a locator node.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct SchemaLocator {
        /// The newest committed index entry.
        #[prost(message, optional, tag = "1")]
        pub info: Option<IndexEntry>,

        /// Every index entry from version 0 through `info`, oldest first.
        #[prost(message, repeated, tag = "2")]
        pub index: Vec<IndexEntry>,
    }
}

fn position_to_wire(position: Position) -> wire::PositionInfo {
    wire::PositionInfo {
        ledger_id: position.ledger_id,
        entry_id: position.entry_id,
    }
}

fn position_from_wire(position: Option<wire::PositionInfo>) -> Position {
    // An absent position means "no backing entry", the same thing the
    // explicit sentinel encodes.
    position.map_or(Position::NONE, |p| Position::new(p.ledger_id, p.entry_id))
}

fn index_entry_to_wire(entry: &IndexEntry) -> wire::IndexEntry {
    wire::IndexEntry {
        version: entry.version.get(),
        hash: entry.hash.clone(),
        position: Some(position_to_wire(entry.position)),
    }
}

fn index_entry_from_wire(entry: wire::IndexEntry) -> IndexEntry {
    IndexEntry {
        version: SchemaVersion::new(entry.version),
        hash: entry.hash,
        position: position_from_wire(entry.position),
    }
}

/// Encodes a locator node payload.
pub fn encode_locator(locator: &SchemaLocator) -> Bytes {
    let message = wire::SchemaLocator {
        info: Some(index_entry_to_wire(&locator.info)),
        index: locator.index.iter().map(index_entry_to_wire).collect(),
    };
    message.encode_to_vec().into()
}

/// Decodes a locator node payload.
///
/// A locator without an `info` entry cannot name its latest version and is
/// treated as corrupt.
pub fn decode_locator(bytes: &[u8]) -> Result<SchemaLocator> {
    let message = wire::SchemaLocator::decode(bytes).map_err(SchemaRegistryError::decode)?;
    let info = message
        .info
        .ok_or_else(|| SchemaRegistryError::Decode("schema locator has no info entry".into()))?;
    Ok(SchemaLocator {
        info: index_entry_from_wire(info),
        index: message.index.into_iter().map(index_entry_from_wire).collect(),
    })
}

/// Encodes a ledger entry payload.
pub fn encode_entry(entry: &SchemaEntry) -> Bytes {
    let message = wire::SchemaEntry {
        schema_data: entry.schema_data.clone(),
        index: entry.index.iter().map(index_entry_to_wire).collect(),
    };
    message.encode_to_vec().into()
}

/// Decodes a ledger entry payload.
pub fn decode_entry(bytes: &[u8]) -> Result<SchemaEntry> {
    let message = wire::SchemaEntry::decode(bytes).map_err(SchemaRegistryError::decode)?;
    Ok(SchemaEntry {
        schema_data: message.schema_data,
        index: message.index.into_iter().map(index_entry_from_wire).collect(),
    })
}
