use async_trait::async_trait;

use crate::model::{RecordId, ValidationRecord};

/// Storage contract shared by every provider and by the facade.
///
/// `get` reports a missing or expired record as `Ok(None)`; only faults are errors.
#[async_trait]
pub trait RecordStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a schema/document pair and return its freshly generated id.
    async fn save(&self, schema: &str, json: &str) -> Result<RecordId, Self::Error>;

    async fn get(&self, id: &str) -> Result<Option<ValidationRecord>, Self::Error>;
}
