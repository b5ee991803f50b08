use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type RecordId = String;

/// A schema/document pair as handed back to callers.
///
/// Provider bookkeeping such as the managed store's `ttl` never appears here.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationRecord {
    pub id: RecordId,
    pub schema: String,
    pub json: String,
    pub created_at: DateTime<Utc>,
}

impl ValidationRecord {
    pub fn new(id: RecordId, schema: &str, json: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            schema: schema.to_owned(),
            json: json.to_owned(),
            created_at,
        }
    }
}
