//! DynamoDB table client. The table's TTL attribute must be set to `ttl`.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{error::DisplayErrorContext, types::AttributeValue, Client};
use chrono::{DateTime, Utc};

use crate::{
    ManagedError, ManagedSettings, StoredItem, TableClient, ATTR_CREATED_AT, ATTR_JSON, ATTR_PK,
    ATTR_SCHEMA, ATTR_TTL,
};

pub struct DynamoTable {
    client: Client,
    table: String,
}

impl DynamoTable {
    pub async fn connect(settings: &ManagedSettings) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = settings.region() {
            loader = loader.region(aws_config::Region::new(region.to_owned()));
        }
        let sdk_config = loader.load().await;
        Self::from_client(Client::new(&sdk_config), settings.table())
    }

    pub fn from_client(client: Client, table: &str) -> Self {
        Self {
            client,
            table: table.to_owned(),
        }
    }
}

#[async_trait]
impl TableClient for DynamoTable {
    async fn put_item(&self, item: StoredItem) -> Result<(), ManagedError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item_to_attributes(&item)))
            .send()
            .await
            .map_err(|e| ManagedError::Remote(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn get_item(&self, pk: &str) -> Result<Option<StoredItem>, ManagedError> {
        let out = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(ATTR_PK, AttributeValue::S(pk.to_owned()))
            .send()
            .await
            .map_err(|e| ManagedError::Remote(DisplayErrorContext(&e).to_string()))?;
        match out.item() {
            Some(attrs) => item_from_attributes(pk, attrs).map(Some),
            None => Ok(None),
        }
    }
}

fn item_to_attributes(item: &StoredItem) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (ATTR_PK.to_string(), AttributeValue::S(item.pk.clone())),
        (ATTR_SCHEMA.to_string(), AttributeValue::S(item.schema.clone())),
        (ATTR_JSON.to_string(), AttributeValue::S(item.json.clone())),
        (
            ATTR_CREATED_AT.to_string(),
            AttributeValue::S(item.created_at.to_rfc3339()),
        ),
        (ATTR_TTL.to_string(), AttributeValue::N(item.ttl.to_string())),
    ])
}

fn item_from_attributes(
    key: &str,
    attrs: &HashMap<String, AttributeValue>,
) -> Result<StoredItem, ManagedError> {
    let corrupt = |reason: String| ManagedError::Corrupt {
        key: key.to_string(),
        reason,
    };
    let string_attr = |name: &str| -> Result<String, ManagedError> {
        attrs
            .get(name)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| corrupt(format!("missing string attribute '{name}'")))
    };
    let created_raw = string_attr(ATTR_CREATED_AT)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map_err(|e| corrupt(format!("bad created_at: {e}")))?
        .with_timezone(&Utc);
    let ttl = attrs
        .get(ATTR_TTL)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse::<i64>().ok())
        .ok_or_else(|| corrupt(format!("missing numeric attribute '{ATTR_TTL}'")))?;
    Ok(StoredItem {
        pk: string_attr(ATTR_PK)?,
        schema: string_attr(ATTR_SCHEMA)?,
        json: string_attr(ATTR_JSON)?,
        created_at,
        ttl,
    })
}
