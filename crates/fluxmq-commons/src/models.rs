//! Data model of the schema registry storage engine.
//!
//! A schema history is stored across two backends: every registered schema
//! lands in its own one-entry ledger, and a per-key locator node in the
//! versioned metadata store points at the newest entry while carrying the
//! index of all prior versions.

use bytes::Bytes;

use crate::ids::{SchemaId, SchemaVersion};

/// Identifies a single entry in the ledger store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub ledger_id: i64,
    pub entry_id: i64,
}

impl Position {
    /// Sentinel for "no backing entry". Only ever appears in the placeholder
    /// index entry written into the first schema entry of a fresh history.
    pub const NONE: Self = Self {
        ledger_id: -1,
        entry_id: -1,
    };

    /// Creates a position from a ledger id and an entry id.
    #[inline]
    pub const fn new(ledger_id: i64, entry_id: i64) -> Self {
        Self {
            ledger_id,
            entry_id,
        }
    }

    /// True when this position is the "no backing entry" sentinel.
    #[inline]
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(ledger={}, entry={})", self.ledger_id, self.entry_id)
    }
}

/// One version of a schema history: version number, caller-supplied content
/// hash and the ledger position of the schema entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub version: SchemaVersion,
    pub hash: Bytes,
    pub position: Position,
}

/// Payload of a single ledger entry: the schema bytes plus the chain of index
/// entries that were known at the moment the entry was written. The embedded
/// index serves historical lookups against locators whose inline index does
/// not reach back far enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub schema_data: Bytes,
    pub index: Vec<IndexEntry>,
}

/// Payload of a locator node. `info` always equals the most recently
/// committed index entry; `index` lists every entry from version 0 up to and
/// including `info.version`, sorted ascending with no gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLocator {
    pub info: IndexEntry,
    pub index: Vec<IndexEntry>,
}

/// A locator paired with the CAS token of the metadata node it was read from.
#[derive(Debug, Clone)]
pub struct LocatorEntry {
    pub locator: SchemaLocator,
    pub node_version: i64,
}

/// A schema as returned to callers: the raw bytes and the version they were
/// registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSchema {
    pub data: Bytes,
    pub version: SchemaVersion,
}

/// Selects which version of a schema history a read resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    /// The most recently committed version.
    Latest,
    /// One specific historical version.
    Exact(SchemaVersion),
}

impl From<SchemaVersion> for VersionSelector {
    fn from(version: SchemaVersion) -> Self {
        Self::Exact(version)
    }
}

/// Builds the ledger metadata tags attached to every schema ledger, used for
/// offline diagnostics of orphaned ledgers.
pub fn schema_ledger_metadata(schema_id: &SchemaId) -> Vec<(String, String)> {
    use crate::constants::{
        METADATA_APPLICATION, METADATA_COMPONENT, METADATA_TAG_APPLICATION,
        METADATA_TAG_COMPONENT, METADATA_TAG_SCHEMA_ID,
    };
    vec![
        (
            METADATA_TAG_APPLICATION.to_string(),
            METADATA_APPLICATION.to_string(),
        ),
        (
            METADATA_TAG_COMPONENT.to_string(),
            METADATA_COMPONENT.to_string(),
        ),
        (
            METADATA_TAG_SCHEMA_ID.to_string(),
            schema_id.as_str().to_string(),
        ),
    ]
}
