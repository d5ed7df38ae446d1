use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::EviteConfig;
use crate::error::RemoteError;
use crate::models::{now_str, Evite, EviteTemplate, Guest};
use crate::store::{sort_newest_first, RemoteEviteStore};

/// Row shape of the evites table. Columns are snake_case; `updated_at` is
/// stamped on every write and never surfaces on `Evite`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EviteRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub host_name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub template: EviteTemplate,
    #[serde(default)]
    pub is_customized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_style: Option<String>,
    #[serde(default)]
    pub custom_images: Vec<String>,
    #[serde(default)]
    pub guests: Vec<Guest>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl EviteRow {
    pub fn from_evite(evite: &Evite, updated_at: String) -> Self {
        let evite = evite.clone();
        Self {
            id: evite.id,
            title: evite.title,
            host_name: evite.host_name,
            date: evite.date,
            time: evite.time,
            location: evite.location,
            description: evite.description,
            template: evite.template,
            is_customized: evite.is_customized,
            custom_style: evite.custom_style,
            custom_images: evite.custom_images,
            guests: evite.guests,
            created_at: evite.created_at,
            updated_at: Some(updated_at),
            owner_id: evite.owner_id,
        }
    }
}

impl From<EviteRow> for Evite {
    fn from(row: EviteRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            host_name: row.host_name,
            date: row.date,
            time: row.time,
            location: row.location,
            description: row.description,
            template: row.template,
            is_customized: row.is_customized,
            custom_style: row.custom_style,
            custom_images: row.custom_images,
            guests: row.guests,
            created_at: row.created_at,
            owner_id: row.owner_id,
        }
    }
}

pub fn evite_to_item(
    evite: &Evite,
    updated_at: String,
) -> Result<HashMap<String, AttributeValue>, RemoteError> {
    serde_dynamo::to_item(EviteRow::from_evite(evite, updated_at))
        .map_err(|e| RemoteError::Decode(format!("Failed to encode evite {}: {}", evite.id, e)))
}

pub fn evite_from_item(item: HashMap<String, AttributeValue>) -> Result<Evite, RemoteError> {
    let row: EviteRow = serde_dynamo::from_item(item)
        .map_err(|e| RemoteError::Decode(format!("Failed to decode evite row: {}", e)))?;
    Ok(row.into())
}

/// Decodes one Scan page. A single bad row fails the whole page so callers
/// fall back to their cache instead of treating the scan as authoritative.
fn decode_page(items: Vec<HashMap<String, AttributeValue>>) -> Result<Vec<Evite>, RemoteError> {
    items
        .into_iter()
        .map(|item| {
            evite_from_item(item).map_err(|e| {
                warn!("Evite table holds an undecodable row: {}", e);
                e
            })
        })
        .collect()
}

/// Maps SDK failures onto the remote error taxonomy. A missing table is an
/// operator problem, everything else is treated as transient.
fn remote_error<E, R>(operation: &str, err: SdkError<E, R>) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("{} failed: {}", operation, DisplayErrorContext(&err));
    if err.code() == Some("ResourceNotFoundException") {
        error!("Evites table is missing: {}", message);
        RemoteError::Configuration(message)
    } else {
        RemoteError::Transport(message)
    }
}

/// DynamoDB-backed evite store
pub struct DynamoEviteStore {
    client: Client,
    table_name: String,
}

impl DynamoEviteStore {
    pub async fn new() -> Self {
        Self::from_config(&EviteConfig::from_env()).await
    }

    pub async fn from_config(config: &EviteConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(endpoint) = &config.dynamodb_endpoint {
            info!("Using custom DynamoDB endpoint: {}", endpoint);
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Self::with_client_and_table(Client::new(&sdk_config), config.table_name.clone())
    }

    pub fn with_client_and_table(client: Client, table_name: String) -> Self {
        info!("DynamoEviteStore using table '{}'", table_name);
        Self { client, table_name }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl RemoteEviteStore for DynamoEviteStore {
    async fn get(&self, id: &str) -> Result<Option<Evite>, RemoteError> {
        debug!("GetItem evite id={} table={}", id, self.table_name);
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| remote_error("GetItem", e))?;

        match output.item {
            Some(item) => Ok(Some(evite_from_item(item)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Evite>, RemoteError> {
        let mut evites = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| remote_error("Scan", e))?;

            evites.extend(decode_page(output.items.unwrap_or_default())?);

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        sort_newest_first(&mut evites);
        debug!("Scanned {} evites from {}", evites.len(), self.table_name);
        Ok(evites)
    }

    async fn upsert(&self, evite: &Evite) -> Result<(), RemoteError> {
        let item = evite_to_item(evite, now_str())?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| remote_error("PutItem", e))?;

        debug!("Upserted evite id={} guests={}", evite.id, evite.guests.len());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<usize, RemoteError> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| remote_error("DeleteItem", e))?;

        let removed = match output.attributes {
            Some(attributes) if !attributes.is_empty() => 1,
            _ => 0,
        };
        debug!("DeleteItem evite id={} removed={}", id, removed);
        Ok(removed)
    }
}
