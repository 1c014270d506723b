//! Ledger client: the engine's view of the append-only entry store.
//!
//! Binds the configured replication settings and the fixed schema ledger
//! password to every call, and tags each created ledger with the owning
//! schema id so orphaned ledgers can be attributed offline.

use std::sync::Arc;

use bytes::Bytes;
use log::debug;

use fluxmq_commons::constants::SCHEMA_LEDGER_PASSWORD;
use fluxmq_commons::models::schema_ledger_metadata;
use fluxmq_commons::{LedgerConfig, SchemaId};
use fluxmq_store::{LedgerCreateOptions, LedgerHandle, LedgerStore};

use crate::error::Result;

/// Configuration-bound wrapper around the raw [`LedgerStore`].
pub(crate) struct LedgerClient {
    store: Arc<dyn LedgerStore>,
    config: LedgerConfig,
}

impl LedgerClient {
    pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Creates a new ledger for one write of `schema_id`.
    pub async fn create_for_schema(&self, schema_id: &SchemaId) -> Result<LedgerHandle> {
        let options = LedgerCreateOptions {
            ensemble_size: self.config.ensemble_size,
            write_quorum: self.config.write_quorum,
            ack_quorum: self.config.ack_quorum,
            digest_type: self.config.digest_type,
            password: Bytes::from_static(SCHEMA_LEDGER_PASSWORD),
            metadata: schema_ledger_metadata(schema_id),
        };
        let handle = self.store.create(options).await?;
        debug!("[{}] created ledger {}", schema_id, handle.id());
        Ok(handle)
    }

    /// Appends the single entry of a freshly created ledger.
    pub async fn append(&self, handle: &LedgerHandle, payload: Bytes) -> Result<i64> {
        Ok(self.store.append(handle, payload).await?)
    }

    /// Opens an existing ledger for one entry read.
    pub async fn open(&self, ledger_id: i64) -> Result<LedgerHandle> {
        Ok(self.store.open(ledger_id).await?)
    }

    /// Reads exactly one entry.
    pub async fn read_single(&self, handle: &LedgerHandle, entry_id: i64) -> Result<Bytes> {
        Ok(self.store.read_entry(handle, entry_id).await?)
    }

    /// Closes a handle. The caller decides whether a failure here matters;
    /// a failed close never invalidates a completed append or read.
    pub async fn close(&self, handle: &LedgerHandle) -> Result<()> {
        Ok(self.store.close(handle).await?)
    }
}
