use std::collections::HashMap;
use std::env;

use aws_sdk_sns::Client as SnsClient;
use evite_shared::models::events::{RsvpEvent, RSVP_RECEIVED};
use log::{debug, info};
use tokio::sync::OnceCell;

use crate::error::{AppError, Result};

static SNS_CLIENT: OnceCell<SnsClient> = OnceCell::const_new();
static TOPIC_ARN: OnceCell<String> = OnceCell::const_new();

/// Publishes an rsvp_received event to SNS
pub async fn publish_rsvp_event(event: &RsvpEvent) -> Result<()> {
    debug!(
        "publish_rsvp_event called for evite_id={}, status={}",
        event.evite_id, event.status
    );

    // Check if we're in test mode
    if env::var("TEST_SNS").map(|v| v == "true").unwrap_or(false) {
        debug!(
            "Test mode: Skipping SNS publishing for rsvp_received event, evite_id={}",
            event.evite_id
        );
        return Ok(());
    }

    let client = SNS_CLIENT
        .get_or_init(|| async {
            let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .load()
                .await;
            SnsClient::new(&config)
        })
        .await
        .clone();

    let topic_arn = TOPIC_ARN
        .get_or_try_init(|| async {
            env::var("SNS_TOPIC_ARN").map_err(|_| {
                AppError::internal_server_error("SNS_TOPIC_ARN environment variable not set".into())
            })
        })
        .await?;

    let message = serde_json::to_string(event).map_err(|e| {
        AppError::internal_server_error(format!("Failed to serialize event payload: {}", e))
    })?;

    // Message attributes let subscribers filter by event type
    let event_type_attr = aws_sdk_sns::types::MessageAttributeValue::builder()
        .data_type("String")
        .string_value(RSVP_RECEIVED)
        .build()
        .map_err(|e| {
            AppError::internal_server_error(format!("Failed to build message attribute: {}", e))
        })?;

    let mut message_attributes = HashMap::new();
    message_attributes.insert("eventType".to_string(), event_type_attr);

    client
        .publish()
        .topic_arn(topic_arn)
        .message(message)
        .subject("RSVP Received")
        .set_message_attributes(Some(message_attributes))
        .send()
        .await
        .map_err(|e| {
            AppError::internal_server_error(format!("Failed to publish to SNS: {}", e))
        })?;

    info!(
        "Successfully published rsvp_received event for evite_id={}",
        event.evite_id
    );
    Ok(())
}
