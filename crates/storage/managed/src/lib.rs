//! Managed key-value record store.
//!
//! One item per record, keyed by partition key, carrying a `ttl` attribute that the
//! table's native expiry reaper acts on. There is no local sweep and no local lock:
//! deletion is best effort on the store's side and an item can stay readable for a
//! while after its nominal expiry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use schemashare_core::{
    generate_id, managed_retention, ttl_epoch_seconds, RecordId, RecordStore, ValidationRecord,
};
use thiserror::Error;
use tracing::debug;

#[cfg(feature = "dynamodb")]
mod dynamo;
#[cfg(feature = "dynamodb")]
pub use dynamo::DynamoTable;

pub const ATTR_PK: &str = "pk";
pub const ATTR_SCHEMA: &str = "schema";
pub const ATTR_JSON: &str = "json";
pub const ATTR_CREATED_AT: &str = "created_at";
pub const ATTR_TTL: &str = "ttl";

#[derive(Debug, Error)]
pub enum ManagedError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("remote store error: {0}")]
    Remote(String),
    #[error("corrupt item {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Connection settings, validated before any SDK or network work happens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedSettings {
    table: String,
    region: Option<String>,
}

impl ManagedSettings {
    pub fn new(table: Option<String>, region: Option<String>) -> Result<Self, ManagedError> {
        let table = table
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ManagedError::Config("table name is required".into()))?;
        let region = region
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Ok(Self { table, region })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `None` means the ambient SDK configuration chain decides.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

/// A record as laid out in the table, `ttl` included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredItem {
    pub pk: RecordId,
    pub schema: String,
    pub json: String,
    pub created_at: DateTime<Utc>,
    /// Unix epoch seconds.
    pub ttl: i64,
}

impl StoredItem {
    pub fn into_record(self) -> ValidationRecord {
        ValidationRecord {
            id: self.pk,
            schema: self.schema,
            json: self.json,
            created_at: self.created_at,
        }
    }
}

/// Minimal surface of the remote table used by [`ManagedStorage`].
#[async_trait]
pub trait TableClient: Send + Sync {
    async fn put_item(&self, item: StoredItem) -> Result<(), ManagedError>;
    async fn get_item(&self, pk: &str) -> Result<Option<StoredItem>, ManagedError>;
}

pub struct ManagedStorage {
    client: Arc<dyn TableClient>,
    retention: Duration,
}

impl ManagedStorage {
    pub fn new(client: Arc<dyn TableClient>) -> Self {
        Self {
            client,
            retention: managed_retention(),
        }
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Build a DynamoDB-backed store from validated settings.
    #[cfg(feature = "dynamodb")]
    pub async fn connect(settings: &ManagedSettings) -> Self {
        let table = DynamoTable::connect(settings).await;
        tracing::info!(table = settings.table(), region = ?settings.region(), "managed store ready");
        Self::new(Arc::new(table))
    }
}

#[async_trait]
impl RecordStore for ManagedStorage {
    type Error = ManagedError;

    async fn save(&self, schema: &str, json: &str) -> Result<RecordId, Self::Error> {
        let now = Utc::now();
        let item = StoredItem {
            pk: generate_id(),
            schema: schema.to_owned(),
            json: json.to_owned(),
            created_at: now,
            ttl: ttl_epoch_seconds(now, self.retention),
        };
        let id = item.pk.clone();
        let ttl = item.ttl;
        self.client.put_item(item).await?;
        debug!(record_id = %id, ttl, "managed save committed");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<ValidationRecord>, Self::Error> {
        let item = self.client.get_item(id).await?;
        debug!(record_id = id, hit = item.is_some(), "managed get");
        Ok(item.map(StoredItem::into_record))
    }
}
