//! Schema version numbers and their wire encoding.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bytes in the current wire encoding of a version.
const VERSION_WIRE_LEN: usize = 8;

/// Returned when a version blob is too short to carry a version number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema version blob must be at least 8 bytes, got {0}")]
pub struct InvalidVersionBytes(pub usize);

/// Dense, monotonically increasing version number of a schema within one
/// schema history.
///
/// Versions start at 0 and advance by exactly 1 on every successful
/// registration, including tombstone writes. On the wire a version is exactly
/// 8 bytes, big-endian. Brokers prior to the 8-byte format shipped versions
/// padded to 64 bytes with only the leading 8 bytes carrying the value, so
/// decoding accepts both widths.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SchemaVersion(u64);

impl SchemaVersion {
    /// Creates a version from its numeric value.
    #[inline]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Returns the numeric value of this version.
    #[inline]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the version directly following this one.
    #[inline]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Encodes this version as 8 big-endian bytes.
    pub fn to_bytes(&self) -> [u8; VERSION_WIRE_LEN] {
        self.0.to_be_bytes()
    }

    /// Decodes a version from its wire form.
    ///
    /// Accepts both the current 8-byte encoding and the legacy 64-byte
    /// encoding; in either case the leading 8 bytes are read big-endian and
    /// anything after them is ignored. Inputs shorter than 8 bytes are
    /// rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidVersionBytes> {
        if bytes.len() < VERSION_WIRE_LEN {
            return Err(InvalidVersionBytes(bytes.len()));
        }
        let mut raw = [0u8; VERSION_WIRE_LEN];
        raw.copy_from_slice(&bytes[..VERSION_WIRE_LEN]);
        Ok(Self(u64::from_be_bytes(raw)))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SchemaVersion {
    fn from(version: u64) -> Self {
        Self(version)
    }
}

impl From<SchemaVersion> for u64 {
    fn from(version: SchemaVersion) -> Self {
        version.0
    }
}
