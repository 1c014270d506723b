//! Well-known constants shared across FluxMQ components.

/// Default root path for schema locator nodes in the metadata store.
pub const DEFAULT_SCHEMA_ROOT: &str = "/schemas";

/// Fixed password for schema ledgers. Schema ledgers are not individually
/// protected; access control happens at the store level.
pub const SCHEMA_LEDGER_PASSWORD: &[u8] = b"";

/// Ledger metadata tag naming the owning application.
pub const METADATA_TAG_APPLICATION: &str = "application";

/// Ledger metadata tag naming the component that created the ledger.
pub const METADATA_TAG_COMPONENT: &str = "component";

/// Ledger metadata tag carrying the schema identifier the ledger belongs to.
pub const METADATA_TAG_SCHEMA_ID: &str = "schema-id";

/// Value of the application tag on ledgers created by FluxMQ.
pub const METADATA_APPLICATION: &str = "fluxmq";

/// Value of the component tag on ledgers created by the schema registry.
pub const METADATA_COMPONENT: &str = "schema-registry";
