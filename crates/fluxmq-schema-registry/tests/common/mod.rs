//! Shared harness for schema storage integration tests.

use std::sync::Arc;

use bytes::Bytes;
use fluxmq_schema_registry::{LedgerSchemaStorage, SchemaStorageConfig};
use fluxmq_store::{MemoryLedgerStore, MemoryMetadataStore};

/// An engine wired to instrumented in-memory stores. The raw stores stay
/// accessible so tests can assert backend traffic and manipulate nodes the
/// way an older broker would have written them.
pub struct TestStorage {
    pub storage: LedgerSchemaStorage,
    pub ledgers: Arc<MemoryLedgerStore>,
    pub metadata: Arc<MemoryMetadataStore>,
}

/// Builds an engine on empty stores, initialized and started.
pub async fn started() -> TestStorage {
    let ledgers = Arc::new(MemoryLedgerStore::new());
    let metadata = Arc::new(MemoryMetadataStore::new());
    let storage = LedgerSchemaStorage::new(
        SchemaStorageConfig::default(),
        Arc::clone(&ledgers) as Arc<dyn fluxmq_store::LedgerStore>,
        Arc::clone(&metadata) as Arc<dyn fluxmq_store::MetadataStore>,
    );
    storage.init().await.expect("init schema storage");
    storage.start().expect("start schema storage");
    TestStorage {
        storage,
        ledgers,
        metadata,
    }
}

/// Bytes shorthand for test payloads.
pub fn b(payload: &'static [u8]) -> Bytes {
    Bytes::from_static(payload)
}
