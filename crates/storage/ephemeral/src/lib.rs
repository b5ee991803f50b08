//! In-memory stand-in for the managed table.
//!
//! Items are never expired on read. Expiry only happens when [`EphemeralTable::reap`]
//! runs, mirroring a background TTL reaper that fires some time after `ttl`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use schemashare_storage_managed::{ManagedError, StoredItem, TableClient};

#[derive(Default)]
pub struct EphemeralTable {
    items: RwLock<HashMap<String, StoredItem>>,
}

impl EphemeralTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw item lookup, `ttl` included.
    pub fn item(&self, pk: &str) -> Option<StoredItem> {
        self.items.read().get(pk).cloned()
    }

    /// Place an item directly, bypassing the store (backdated fixtures).
    pub fn insert(&self, item: StoredItem) {
        self.items.write().insert(item.pk.clone(), item);
    }

    /// Delete every item whose `ttl` is at or before `now`. Returns how many went.
    pub fn reap(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now.timestamp();
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|_, item| item.ttl > cutoff);
        before - items.len()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl TableClient for EphemeralTable {
    async fn put_item(&self, item: StoredItem) -> Result<(), ManagedError> {
        self.insert(item);
        Ok(())
    }

    async fn get_item(&self, pk: &str) -> Result<Option<StoredItem>, ManagedError> {
        Ok(self.item(pk))
    }
}
