use chrono::Utc;
use schemashare_core::{generate_id, RecordId, RecordStore};
use schemashare_storage_embedded::EmbeddedStorage;
use schemashare_storage_ephemeral::EphemeralTable;
use schemashare_storage_managed::ManagedStorage;
use std::sync::Arc;
use tokio::runtime::Runtime;

pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build tokio runtime")
}

pub struct EmbeddedStack {
    pub storage: EmbeddedStorage,
    pub root: tempfile::TempDir,
}

impl EmbeddedStack {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create embedded bench dir");
        let storage = EmbeddedStorage::new(root.path().join("records.json"));
        Self { storage, root }
    }

    /// A store whose image file already holds `payloads`, written in one go rather than
    /// through one full rewrite per record.
    pub fn preloaded(payloads: &[(String, String)]) -> Self {
        let stack = Self::new();
        let created_at = Utc::now();
        let records: serde_json::Map<String, serde_json::Value> = payloads
            .iter()
            .map(|(schema, json)| {
                (
                    generate_id(),
                    serde_json::json!({ "schema": schema, "json": json, "created_at": created_at }),
                )
            })
            .collect();
        let image = serde_json::json!({ "version": 1, "records": records });
        std::fs::write(stack.storage.path(), image.to_string()).expect("write preloaded image");
        stack
    }
}

impl Default for EmbeddedStack {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ManagedStack {
    pub storage: ManagedStorage,
    pub table: Arc<EphemeralTable>,
}

impl ManagedStack {
    pub fn new() -> Self {
        let table = Arc::new(EphemeralTable::new());
        let storage = ManagedStorage::new(table.clone());
        Self { storage, table }
    }
}

impl Default for ManagedStack {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn save_all<S: RecordStore>(storage: &S, payloads: &[(String, String)]) -> Vec<RecordId> {
    let mut ids = Vec::with_capacity(payloads.len());
    for (schema, json) in payloads {
        ids.push(storage.save(schema, json).await.expect("storage save"));
    }
    ids
}

pub async fn get_all<S: RecordStore>(storage: &S, ids: &[RecordId]) -> usize {
    let mut hits = 0;
    for id in ids {
        if storage.get(id).await.expect("storage get").is_some() {
            hits += 1;
        }
    }
    hits
}
