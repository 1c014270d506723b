//! Locator client: the engine's view of the versioned metadata store.
//!
//! One node per schema id lives at `<root>/<schema_id>`. The node payload is
//! the encoded [`SchemaLocator`]; the node version doubles as the CAS token
//! that serializes concurrent writers of the same key.

use std::sync::Arc;

use log::debug;

use fluxmq_commons::{LocatorEntry, SchemaId, SchemaLocator};
use fluxmq_store::MetadataStore;

use crate::error::Result;
use crate::format;

pub(crate) struct LocatorClient {
    store: Arc<dyn MetadataStore>,
    root: String,
}

impl LocatorClient {
    pub fn new(store: Arc<dyn MetadataStore>, root: impl Into<String>) -> Self {
        Self {
            store,
            root: root.into(),
        }
    }

    fn path_for(&self, schema_id: &SchemaId) -> String {
        schema_id.locator_path(&self.root)
    }

    /// Idempotently creates the root path; racing creators are fine.
    pub async fn ensure_root(&self) -> Result<()> {
        self.store.ensure_path(&self.root).await?;
        debug!("schema locator root {} present", self.root);
        Ok(())
    }

    /// Reads and decodes the locator for `schema_id`, together with the CAS
    /// token of the node it came from. `None` when the key has never been
    /// written.
    pub async fn get_locator(&self, schema_id: &SchemaId) -> Result<Option<LocatorEntry>> {
        let Some(value) = self.store.get(&self.path_for(schema_id)).await? else {
            return Ok(None);
        };
        let locator = format::decode_locator(&value.data)?;
        Ok(Some(LocatorEntry {
            locator,
            node_version: value.node_version,
        }))
    }

    /// Creates the locator node for a brand-new schema history. Surfaces
    /// `AlreadyExists` to the caller, which retries the whole write.
    pub async fn create_locator(&self, schema_id: &SchemaId, locator: &SchemaLocator) -> Result<()> {
        self.store
            .create(&self.path_for(schema_id), format::encode_locator(locator))
            .await?;
        Ok(())
    }

    /// Replaces the locator node contents iff the CAS token still matches.
    /// Surfaces `BadVersion` to the caller, which retries the whole write.
    pub async fn update_locator(
        &self,
        schema_id: &SchemaId,
        locator: &SchemaLocator,
        expected_node_version: i64,
    ) -> Result<()> {
        self.store
            .compare_and_set(
                &self.path_for(schema_id),
                format::encode_locator(locator),
                expected_node_version,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use fluxmq_commons::{IndexEntry, Position, SchemaVersion};
    use fluxmq_store::MemoryMetadataStore;

    fn single_entry_locator() -> SchemaLocator {
        let info = IndexEntry {
            version: SchemaVersion::new(0),
            hash: Bytes::from_static(b"\xAA"),
            position: Position::new(7, 0),
        };
        SchemaLocator {
            info: info.clone(),
            index: vec![info],
        }
    }

    #[tokio::test]
    async fn test_locator_roundtrip_through_store() {
        let store = Arc::new(MemoryMetadataStore::new());
        let client = LocatorClient::new(store, "/schemas");
        let schema_id = SchemaId::new("orders");

        assert!(client.get_locator(&schema_id).await.unwrap().is_none());

        let locator = single_entry_locator();
        client.create_locator(&schema_id, &locator).await.unwrap();

        let entry = client.get_locator(&schema_id).await.unwrap().unwrap();
        assert_eq!(entry.locator, locator);
        assert_eq!(entry.node_version, 0);
    }

    #[tokio::test]
    async fn test_update_bumps_node_version() {
        let store = Arc::new(MemoryMetadataStore::new());
        let client = LocatorClient::new(store, "/schemas");
        let schema_id = SchemaId::new("orders");

        let locator = single_entry_locator();
        client.create_locator(&schema_id, &locator).await.unwrap();
        client
            .update_locator(&schema_id, &locator, 0)
            .await
            .unwrap();

        let entry = client.get_locator(&schema_id).await.unwrap().unwrap();
        assert_eq!(entry.node_version, 1);
    }

    #[tokio::test]
    async fn test_keys_map_to_distinct_paths() {
        let store = Arc::new(MemoryMetadataStore::new());
        let client = LocatorClient::new(store, "/schemas");

        let locator = single_entry_locator();
        client
            .create_locator(&SchemaId::new("a"), &locator)
            .await
            .unwrap();
        client
            .create_locator(&SchemaId::new("b"), &locator)
            .await
            .unwrap();

        assert!(client
            .get_locator(&SchemaId::new("a"))
            .await
            .unwrap()
            .is_some());
        assert!(client
            .get_locator(&SchemaId::new("b"))
            .await
            .unwrap()
            .is_some());
    }
}
