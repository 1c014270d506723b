//! Schema identifiers.

use std::fmt;
use std::sync::Arc;

use serde::de::{Error as DeError, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key under which one schema history lives, typically the fully qualified
/// topic name of the producers and consumers sharing the schema.
///
/// The engine copies identifiers into coalescer slots, ledger metadata tags
/// and detached read tasks, so the backing string is reference-counted:
/// cloning a `SchemaId` never reallocates.
///
/// An identifier is any non-empty UTF-8 string. Slashes are allowed and
/// common (`"public/default/orders"`); the locator store treats the whole
/// identifier as one key segment under the registry root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaId(Arc<str>);

impl SchemaId {
    /// Wraps a raw identifier.
    ///
    /// # Panics
    /// Panics when `id` is empty; an empty key has no locator path.
    pub fn new(id: impl AsRef<str>) -> Self {
        let raw = id.as_ref();
        assert!(!raw.is_empty(), "schema id must not be empty");
        Self(Arc::from(raw))
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of this schema's locator node under the registry root, e.g.
    /// `"/schemas" + "orders"` becomes `"/schemas/orders"`. A trailing slash
    /// on `root` is tolerated.
    pub fn locator_path(&self, root: &str) -> String {
        format!("{}/{}", root.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SchemaId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SchemaId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(D::Error::invalid_value(
                Unexpected::Str(&raw),
                &"a non-empty schema id",
            ));
        }
        Ok(Self(raw.into()))
    }
}
