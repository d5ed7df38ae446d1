use std::env;

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use log::debug;

const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:8000";

/// DynamoDB-backed tests run only when USE_DYNAMODB=true.
pub fn use_dynamodb() -> bool {
    env::var("USE_DYNAMODB")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Client for DynamoDB Local with static test credentials.
pub async fn create_dynamo_client() -> Client {
    let endpoint =
        env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| DEFAULT_LOCAL_ENDPOINT.to_string());
    debug!("Creating test DynamoDB client for {}", endpoint);

    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("test", "test", None, None, "test"))
        .endpoint_url(endpoint)
        .load()
        .await;
    Client::new(&config)
}

pub async fn create_evite_table(client: &Client, table_name: &str) -> Result<(), String> {
    let id_attribute = AttributeDefinition::builder()
        .attribute_name("id")
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| e.to_string())?;
    let id_key = KeySchemaElement::builder()
        .attribute_name("id")
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| e.to_string())?;

    client
        .create_table()
        .table_name(table_name)
        .attribute_definitions(id_attribute)
        .key_schema(id_key)
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .map_err(|e| DisplayErrorContext(&e).to_string())?;

    debug!("Created test table {}", table_name);
    Ok(())
}

/// Deletes every row in the table.
pub async fn clear_dynamo_table(client: &Client, table_name: &str) -> Result<(), String> {
    let output = client
        .scan()
        .table_name(table_name)
        .send()
        .await
        .map_err(|e| DisplayErrorContext(&e).to_string())?;

    for item in output.items.unwrap_or_default() {
        let Some(AttributeValue::S(id)) = item.get("id") else {
            continue;
        };
        client
            .delete_item()
            .table_name(table_name)
            .key("id", AttributeValue::S(id.clone()))
            .send()
            .await
            .map_err(|e| DisplayErrorContext(&e).to_string())?;
    }

    Ok(())
}
