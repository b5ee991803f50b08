//! Storage facade: one provider, chosen once at startup, behind `RecordStore`.

use std::path::PathBuf;

use async_trait::async_trait;
use schemashare_core::{RecordId, RecordStore, ValidationRecord};
use schemashare_storage_embedded::{EmbeddedError, EmbeddedStorage};
use schemashare_storage_managed::{ManagedError, ManagedSettings, ManagedStorage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_RECORDS_PATH: &str = "./data/records.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Embedded,
    Managed,
}

impl ProviderKind {
    /// Absent or unrecognized values select the embedded provider.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return ProviderKind::Embedded;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "managed" | "dynamodb" => ProviderKind::Managed,
            "embedded" | "file" | "sqlite" | "" => ProviderKind::Embedded,
            other => {
                warn!(provider = other, "unrecognized storage provider; using embedded");
                ProviderKind::Embedded
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Embedded => "embedded",
            ProviderKind::Managed => "managed",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default = "StoreConfig::default_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl StoreConfig {
    fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_RECORDS_PATH)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: None,
            path: Self::default_path(),
            table: None,
            region: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Embedded(#[from] EmbeddedError),
    #[error(transparent)]
    Managed(#[from] ManagedError),
}

pub enum Store {
    Embedded(EmbeddedStorage),
    Managed(ManagedStorage),
}

impl Store {
    /// Build the configured provider. Errors here are meant to stop the process;
    /// there is no fallback from one provider to the other.
    pub async fn open(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let kind = ProviderKind::parse(cfg.provider.as_deref());
        match kind {
            ProviderKind::Embedded => {
                info!(provider = kind.as_str(), path = %cfg.path.display(), "record store selected");
                Ok(Store::Embedded(EmbeddedStorage::new(&cfg.path)))
            }
            ProviderKind::Managed => {
                let settings = ManagedSettings::new(cfg.table.clone(), cfg.region.clone())?;
                info!(provider = kind.as_str(), table = settings.table(), "record store selected");
                Self::connect_managed(&settings).await
            }
        }
    }

    #[cfg(feature = "backend-managed")]
    async fn connect_managed(settings: &ManagedSettings) -> Result<Self, StoreError> {
        Ok(Store::Managed(ManagedStorage::connect(settings).await))
    }

    #[cfg(not(feature = "backend-managed"))]
    async fn connect_managed(_settings: &ManagedSettings) -> Result<Self, StoreError> {
        Err(ManagedError::Config("built without the backend-managed feature".into()).into())
    }

    pub fn provider(&self) -> ProviderKind {
        match self {
            Store::Embedded(_) => ProviderKind::Embedded,
            Store::Managed(_) => ProviderKind::Managed,
        }
    }
}

#[async_trait]
impl RecordStore for Store {
    type Error = StoreError;

    async fn save(&self, schema: &str, json: &str) -> Result<RecordId, Self::Error> {
        match self {
            Store::Embedded(s) => Ok(s.save(schema, json).await?),
            Store::Managed(s) => Ok(s.save(schema, json).await?),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<ValidationRecord>, Self::Error> {
        match self {
            Store::Embedded(s) => Ok(s.get(id).await?),
            Store::Managed(s) => Ok(s.get(id).await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemashare_storage_ephemeral::EphemeralTable;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn embedded_cfg(provider: Option<&str>, dir: &std::path::Path) -> StoreConfig {
        StoreConfig {
            provider: provider.map(str::to_string),
            path: dir.join("records.json"),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn provider_parsing() {
        assert_eq!(ProviderKind::parse(None), ProviderKind::Embedded);
        assert_eq!(ProviderKind::parse(Some("garbage")), ProviderKind::Embedded);
        assert_eq!(ProviderKind::parse(Some(" Managed ")), ProviderKind::Managed);
        assert_eq!(ProviderKind::parse(Some("DYNAMODB")), ProviderKind::Managed);
        assert_eq!(ProviderKind::parse(Some("embedded")), ProviderKind::Embedded);
    }

    #[tokio::test]
    async fn managed_without_table_fails_at_open() {
        let cfg = StoreConfig {
            provider: Some("managed".into()),
            region: Some("eu-west-1".into()),
            ..StoreConfig::default()
        };
        match Store::open(&cfg).await {
            Err(StoreError::Managed(ManagedError::Config(_))) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("managed store opened without a table name"),
        }
    }

    #[tokio::test]
    async fn fallback_matches_explicit_embedded() {
        for provider in [None, Some("garbage"), Some("embedded")] {
            let dir = tempdir().unwrap();
            let store = Store::open(&embedded_cfg(provider, dir.path())).await.unwrap();
            assert_eq!(store.provider(), ProviderKind::Embedded);
            let id = store.save("{\"type\":\"object\"}", "{\"a\":1}").await.unwrap();
            let rec = store.get(&id).await.unwrap().unwrap();
            assert_eq!(rec.schema, "{\"type\":\"object\"}");
            assert_eq!(rec.json, "{\"a\":1}");
            assert!(store.get("nonexistent-id").await.unwrap().is_none());
            assert!(dir.path().join("records.json").exists());
        }
    }

    #[tokio::test]
    async fn managed_variant_hides_ttl() {
        let table = Arc::new(EphemeralTable::new());
        let store = Store::Managed(ManagedStorage::new(table.clone()));
        assert_eq!(store.provider(), ProviderKind::Managed);
        let id = store.save("{}", "[]").await.unwrap();
        let rec = store.get(&id).await.unwrap().unwrap();
        let value = serde_json::to_value(&rec).unwrap();
        assert!(value.get("ttl").is_none());
        assert!(table.item(&id).is_some());
    }
}
