//! The schema registry storage engine.
//!
//! Composes the append-only ledger store and the CAS-protected metadata
//! store into a versioned schema history per key:
//!
//! - every successful write creates one ledger, appends one entry and seals
//!   the ledger before the locator is touched;
//! - the locator node is the single commit point: a version exists exactly
//!   when the locator CAS that references it has succeeded;
//! - lost locator races (creation and update alike) restart the write from
//!   the locator read, deliberately leaking the just-written ledger. A
//!   parallel reader may already be opening that ledger, so rollback is
//!   never attempted.

use std::sync::{Arc, RwLock};

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, info, warn};

use fluxmq_commons::{
    IndexEntry, LocatorEntry, Position, SchemaEntry, SchemaId, SchemaLocator, SchemaStorageConfig,
    SchemaVersion, StoredSchema, VersionSelector,
};
use fluxmq_store::{LedgerHandle, LedgerStore, MetadataStore};

use crate::coalescer::{LatestResult, ReadCoalescer};
use crate::error::{Result, SchemaRegistryError};
use crate::format;
use crate::ledger::LedgerClient;
use crate::locator::LocatorClient;

/// Outcome of one attempt of the write path.
enum PutOutcome {
    /// The locator now references the new version.
    Committed(SchemaVersion),
    /// Another writer changed the locator first; retry from the read.
    LostRace,
}

/// How an index scan resolves a requested version.
#[derive(Debug, PartialEq, Eq)]
enum IndexLookup {
    /// The version is in this index, at the given position.
    Found(Position),
    /// The index starts after the requested version; follow the embedded
    /// index of the entry at the given position.
    Older(Position),
    /// The version is not in this history.
    Missing,
}

/// Selects the index entry for `version` from an index sorted ascending by
/// version. Inline indexes written by older brokers may not reach back to
/// version 0; for those the scan redirects to the embedded index of their
/// oldest entry.
fn select_index_entry(index: &[IndexEntry], version: SchemaVersion) -> IndexLookup {
    let Some(first) = index.first() else {
        return IndexLookup::Missing;
    };
    if version < first.version {
        return IndexLookup::Older(first.position);
    }
    for entry in index {
        if entry.version == version {
            return IndexLookup::Found(entry.position);
        }
        if entry.version > version {
            break;
        }
    }
    IndexLookup::Missing
}

/// Versioned, append-only schema storage over a ledger store and a versioned
/// metadata store.
///
/// The value is cheap to clone and safe to share: all state lives behind an
/// `Arc`. Lifecycle: [`init`](Self::init) once per deployment to create the
/// locator root, [`start`](Self::start) before serving traffic,
/// [`close`](Self::close) on shutdown.
#[derive(Clone)]
pub struct LedgerSchemaStorage {
    inner: Arc<Inner>,
}

struct Inner {
    config: SchemaStorageConfig,
    ledger_store: Arc<dyn LedgerStore>,
    locators: LocatorClient,
    /// Present between `start` and `close`.
    ledgers: RwLock<Option<Arc<LedgerClient>>>,
    latest_reads: ReadCoalescer,
}

impl LedgerSchemaStorage {
    pub fn new(
        config: SchemaStorageConfig,
        ledger_store: Arc<dyn LedgerStore>,
        metadata_store: Arc<dyn MetadataStore>,
    ) -> Self {
        let locators = LocatorClient::new(metadata_store, config.root_path.clone());
        Self {
            inner: Arc::new(Inner {
                config,
                ledger_store,
                locators,
                ledgers: RwLock::new(None),
                latest_reads: ReadCoalescer::new(),
            }),
        }
    }

    /// Idempotently ensures the locator root path exists. Concurrent
    /// bootstrap across brokers is fine.
    pub async fn init(&self) -> Result<()> {
        self.inner.locators.ensure_root().await
    }

    /// Opens the ledger client with the engine configuration. Must be called
    /// before any operation that touches the ledger store.
    pub fn start(&self) -> Result<()> {
        let client = Arc::new(LedgerClient::new(
            Arc::clone(&self.inner.ledger_store),
            self.inner.config.ledger.clone(),
        ));
        *self.inner.ledgers_slot()? = Some(client);
        info!(
            "schema storage started, locator root {}",
            self.inner.config.root_path
        );
        Ok(())
    }

    /// Releases the ledger client. Safe to call when never started, and more
    /// than once.
    pub fn close(&self) -> Result<()> {
        if self.inner.ledgers_slot()?.take().is_some() {
            info!("schema storage closed");
        }
        Ok(())
    }

    /// Registers a schema under `schema_id` and returns its version.
    ///
    /// Re-registering the bytes currently at the head of the history (same
    /// non-empty `hash`) returns the existing version without writing
    /// anything. Lost locator races are retried internally until this writer
    /// commits or observes its own content at the head.
    pub async fn put(&self, schema_id: &SchemaId, data: Bytes, hash: Bytes) -> Result<SchemaVersion> {
        loop {
            match self.inner.try_put(schema_id, &data, &hash).await? {
                PutOutcome::Committed(version) => {
                    debug!("[{}] schema stored at version {}", schema_id, version);
                    return Ok(version);
                }
                PutOutcome::LostRace => {
                    debug!("[{}] lost locator race, retrying write", schema_id);
                }
            }
        }
    }

    /// Resolves a schema by version selector.
    pub async fn get(
        &self,
        schema_id: &SchemaId,
        version: VersionSelector,
    ) -> Result<Option<StoredSchema>> {
        match version {
            VersionSelector::Latest => self.get_latest(schema_id).await,
            VersionSelector::Exact(version) => self.get_by_version(schema_id, version).await,
        }
    }

    /// Returns the newest schema of `schema_id`, or `None` when the key has
    /// never been written.
    ///
    /// Concurrent calls for the same key are coalesced into a single backend
    /// round-trip; every caller observes the same outcome.
    pub async fn get_latest(&self, schema_id: &SchemaId) -> Result<Option<StoredSchema>> {
        let inner = Arc::clone(&self.inner);
        let key = schema_id.clone();
        self.inner
            .latest_reads
            .latest(schema_id, move || {
                async move { inner.fetch_latest(&key).await }.boxed()
            })
            .await
    }

    /// Returns one specific version of `schema_id`, or `None` when either
    /// the key or the version does not exist.
    pub async fn get_by_version(
        &self,
        schema_id: &SchemaId,
        version: SchemaVersion,
    ) -> Result<Option<StoredSchema>> {
        debug!("[{}] get schema, version {}", schema_id, version);
        let Some(found) = self.inner.locators.get_locator(schema_id).await? else {
            return Ok(None);
        };
        if version > found.locator.info.version {
            return Ok(None);
        }
        let Some(entry) = self
            .inner
            .find_entry_by_version(found.locator.index, version)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(StoredSchema {
            data: entry.schema_data,
            version,
        }))
    }

    /// Returns one future per stored version, in version order. Each future
    /// performs its own single-entry ledger read when awaited; completion
    /// order is unconstrained. An unknown key yields an empty list and no
    /// backend reads.
    pub async fn get_all(
        &self,
        schema_id: &SchemaId,
    ) -> Result<Vec<BoxFuture<'static, Result<StoredSchema>>>> {
        let Some(found) = self.inner.locators.get_locator(schema_id).await? else {
            debug!("[{}] get all schemas: unknown key, empty history", schema_id);
            return Ok(Vec::new());
        };
        debug!(
            "[{}] get all schemas: {} versions",
            schema_id,
            found.locator.index.len()
        );
        let reads = found
            .locator
            .index
            .into_iter()
            .map(|entry| {
                let inner = Arc::clone(&self.inner);
                async move {
                    let schema_entry = inner.read_schema_entry(entry.position).await?;
                    Ok(StoredSchema {
                        data: schema_entry.schema_data,
                        version: entry.version,
                    })
                }
                .boxed()
            })
            .collect();
        Ok(reads)
    }

    /// Tombstones `schema_id` by writing an empty schema with an empty hash,
    /// advancing the version like any other write. Returns `None` when the
    /// key has never been written; prior versions stay readable.
    pub async fn delete(&self, schema_id: &SchemaId) -> Result<Option<SchemaVersion>> {
        match self.get_latest(schema_id).await? {
            None => Ok(None),
            Some(_) => {
                let version = self.put(schema_id, Bytes::new(), Bytes::new()).await?;
                Ok(Some(version))
            }
        }
    }

    /// Decodes a version from its wire form; accepts the current 8-byte and
    /// the legacy 64-byte encodings.
    pub fn version_from_bytes(&self, bytes: &[u8]) -> Result<SchemaVersion> {
        Ok(SchemaVersion::from_bytes(bytes)?)
    }
}

impl Inner {
    fn ledgers_slot(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, Option<Arc<LedgerClient>>>> {
        self.ledgers
            .write()
            .map_err(|_| SchemaRegistryError::Internal("ledger client lock poisoned".to_string()))
    }

    fn ledger_client(&self) -> Result<Arc<LedgerClient>> {
        self.ledgers
            .read()
            .map_err(|_| SchemaRegistryError::Internal("ledger client lock poisoned".to_string()))?
            .clone()
            .ok_or(SchemaRegistryError::NotStarted)
    }

    /// One attempt of the write path: read the locator, then either create a
    /// fresh history or append to the existing one.
    async fn try_put(&self, schema_id: &SchemaId, data: &Bytes, hash: &Bytes) -> Result<PutOutcome> {
        match self.locators.get_locator(schema_id).await? {
            Some(found) => self.append_version(schema_id, found, data, hash).await,
            None => self.create_history(schema_id, data, hash).await,
        }
    }

    /// Creates version 0 of a brand-new history. The schema entry is written
    /// with a placeholder index entry (its own position is not known until
    /// the append completes); the locator then carries the real position.
    async fn create_history(
        &self,
        schema_id: &SchemaId,
        data: &Bytes,
        hash: &Bytes,
    ) -> Result<PutOutcome> {
        let placeholder = IndexEntry {
            version: SchemaVersion::new(0),
            hash: hash.clone(),
            position: Position::NONE,
        };
        let position = self
            .store_entry(schema_id, data.clone(), vec![placeholder])
            .await?;

        let info = IndexEntry {
            version: SchemaVersion::new(0),
            hash: hash.clone(),
            position,
        };
        let locator = SchemaLocator {
            info: info.clone(),
            index: vec![info],
        };
        match self.locators.create_locator(schema_id, &locator).await {
            Ok(()) => Ok(PutOutcome::Committed(SchemaVersion::new(0))),
            Err(SchemaRegistryError::Metadata(fluxmq_store::MetadataError::AlreadyExists(_))) => {
                Ok(PutOutcome::LostRace)
            }
            Err(err) => Err(err),
        }
    }

    /// Appends the next version to an existing history, or short-circuits
    /// when the head already carries this content hash. An empty stored hash
    /// is a tombstone and never short-circuits.
    async fn append_version(
        &self,
        schema_id: &SchemaId,
        found: LocatorEntry,
        data: &Bytes,
        hash: &Bytes,
    ) -> Result<PutOutcome> {
        let locator = found.locator;
        if !locator.info.hash.is_empty() && locator.info.hash == *hash {
            debug!(
                "[{}] hash matches stored version {}, no write needed",
                schema_id, locator.info.version
            );
            return Ok(PutOutcome::Committed(locator.info.version));
        }

        let next = locator.info.version.next();
        let position = self
            .store_entry(schema_id, data.clone(), locator.index.clone())
            .await?;

        let info = IndexEntry {
            version: next,
            hash: hash.clone(),
            position,
        };
        let mut index = locator.index;
        index.push(info.clone());
        let updated = SchemaLocator { info, index };

        match self
            .locators
            .update_locator(schema_id, &updated, found.node_version)
            .await
        {
            Ok(()) => Ok(PutOutcome::Committed(next)),
            Err(SchemaRegistryError::Metadata(fluxmq_store::MetadataError::BadVersion {
                ..
            })) => Ok(PutOutcome::LostRace),
            Err(err) => Err(err),
        }
    }

    /// Writes one schema entry into a fresh ledger and seals it. The seal
    /// happens before the caller touches the locator, so a committed
    /// position always references a finalized ledger.
    async fn store_entry(
        &self,
        schema_id: &SchemaId,
        data: Bytes,
        index: Vec<IndexEntry>,
    ) -> Result<Position> {
        let client = self.ledger_client()?;
        let payload = format::encode_entry(&SchemaEntry {
            schema_data: data,
            index,
        });
        let handle = client.create_for_schema(schema_id).await?;
        let entry_id = client.append(&handle, payload).await?;
        close_quietly(&client, &handle).await;
        Ok(Position::new(handle.id(), entry_id))
    }

    /// The uncoalesced latest-read: locator, then the entry it points at.
    async fn fetch_latest(&self, schema_id: &SchemaId) -> LatestResult {
        debug!("[{}] fetching latest schema from store", schema_id);
        let Some(found) = self.locators.get_locator(schema_id).await? else {
            return Ok(None);
        };
        let entry = self.read_schema_entry(found.locator.info.position).await?;
        Ok(Some(StoredSchema {
            data: entry.schema_data,
            version: found.locator.info.version,
        }))
    }

    /// Walks the index chain until `version` resolves or is proven absent.
    /// Fresh locators resolve inline; histories written by older brokers may
    /// need one hop (rarely more) through embedded indexes.
    async fn find_entry_by_version(
        &self,
        mut index: Vec<IndexEntry>,
        version: SchemaVersion,
    ) -> Result<Option<SchemaEntry>> {
        loop {
            match select_index_entry(&index, version) {
                IndexLookup::Found(position) => {
                    return self.read_schema_entry(position).await.map(Some);
                }
                IndexLookup::Older(position) => {
                    debug!(
                        "version {} precedes the inline index, following embedded index at {}",
                        version, position
                    );
                    index = self.read_schema_entry(position).await?.index;
                }
                IndexLookup::Missing => return Ok(None),
            }
        }
    }

    /// Reads and decodes the single entry at `position`, closing the ledger
    /// on success and failure alike.
    async fn read_schema_entry(&self, position: Position) -> Result<SchemaEntry> {
        let client = self.ledger_client()?;
        debug!("reading schema entry at {}", position);
        let handle = client.open(position.ledger_id).await?;
        let read = client.read_single(&handle, position.entry_id).await;
        close_quietly(&client, &handle).await;
        format::decode_entry(&read?)
    }
}

/// Closes a ledger handle, downgrading failure to a warning: a failed close
/// must not turn a completed read or write into an error.
async fn close_quietly(client: &LedgerClient, handle: &LedgerHandle) {
    if let Err(err) = client.close(handle).await {
        warn!("failed to close ledger {}: {}", handle.id(), err);
    }
}
