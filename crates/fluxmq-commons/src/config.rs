//! Configuration types for the schema registry storage engine.
//!
//! These are plain serde structs; loading them from the broker configuration
//! file and applying environment overrides happens in the broker binary.

use serde::{Deserialize, Serialize};

/// Checksum algorithm applied to ledger entries by the ledger store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestType {
    Crc32,
    Crc32c,
    Mac,
    Dummy,
}

/// Replication and integrity settings applied to every ledger the schema
/// registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Number of storage nodes each ledger is spread across.
    #[serde(default = "defaults::default_ensemble_size")]
    pub ensemble_size: u32,

    /// Number of copies written for each entry.
    #[serde(default = "defaults::default_write_quorum")]
    pub write_quorum: u32,

    /// Number of acknowledgements required before an append completes.
    #[serde(default = "defaults::default_ack_quorum")]
    pub ack_quorum: u32,

    /// Entry checksum algorithm.
    #[serde(default = "defaults::default_digest_type")]
    pub digest_type: DigestType,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ensemble_size: defaults::default_ensemble_size(),
            write_quorum: defaults::default_write_quorum(),
            ack_quorum: defaults::default_ack_quorum(),
            digest_type: defaults::default_digest_type(),
        }
    }
}

/// Configuration of the schema registry storage engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaStorageConfig {
    /// Root path under which one locator node per schema id is kept.
    #[serde(default = "defaults::default_schema_root")]
    pub root_path: String,

    /// Ledger creation settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl Default for SchemaStorageConfig {
    fn default() -> Self {
        Self {
            root_path: defaults::default_schema_root(),
            ledger: LedgerConfig::default(),
        }
    }
}

// Default value functions
mod defaults {
    use super::DigestType;
    use crate::constants::DEFAULT_SCHEMA_ROOT;

    pub fn default_ensemble_size() -> u32 {
        2
    }

    pub fn default_write_quorum() -> u32 {
        2
    }

    pub fn default_ack_quorum() -> u32 {
        2
    }

    pub fn default_digest_type() -> DigestType {
        DigestType::Crc32c
    }

    pub fn default_schema_root() -> String {
        DEFAULT_SCHEMA_ROOT.to_string()
    }
}
