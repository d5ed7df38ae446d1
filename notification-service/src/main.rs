use std::env;
use std::sync::Arc;

use anyhow::Context;
use aws_lambda_events::event::sns::SnsEvent;
use evite_shared::models::events::{RsvpEvent, RSVP_RECEIVED};
use evite_shared::notify::send_rsvp_notification;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log::{error, info, warn};

mod errors;

/// Where RSVP notifications are sent
struct DispatchTarget {
    client: reqwest::Client,
    endpoint: String,
    /// Fixed recipient, e.g. a shared inbox in staging. Otherwise the owner id
    /// is handed to the dispatch endpoint, which resolves it to a contact.
    recipient_override: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Notification Service Lambda");

    let endpoint = env::var("NOTIFY_ENDPOINT_URL").context("NOTIFY_ENDPOINT_URL is not set")?;
    let target = Arc::new(DispatchTarget {
        client: reqwest::Client::new(),
        endpoint,
        recipient_override: env::var("NOTIFY_RECIPIENT_OVERRIDE")
            .ok()
            .filter(|v| !v.is_empty()),
    });

    lambda_runtime::run(service_fn(|event| handler(event, target.clone()))).await?;
    Ok(())
}

async fn handler(event: LambdaEvent<SnsEvent>, target: Arc<DispatchTarget>) -> Result<(), Error> {
    for record in event.payload.records {
        let message = record.sns;

        info!("Processing SNS message: {:?}", message.message_id);

        let rsvp = match parse_rsvp_event(&message.message) {
            Some(rsvp) => rsvp,
            None => continue,
        };

        // Failures are per record; keep processing the batch
        if let Err(e) = handle_rsvp(&target, &rsvp).await {
            error!(
                "Failed to handle rsvp_received for evite_id={}: {}",
                rsvp.evite_id, e
            );
        }
    }

    Ok(())
}

/// Parses an SNS message body, skipping anything that is not an RSVP event.
fn parse_rsvp_event(body: &str) -> Option<RsvpEvent> {
    match serde_json::from_str::<RsvpEvent>(body) {
        Ok(event) if event.event_type == RSVP_RECEIVED => Some(event),
        Ok(event) => {
            warn!("Unexpected event type: {}", event.event_type);
            None
        }
        Err(e) => {
            error!("Failed to parse SNS message: {}, error: {}", body, e);
            None
        }
    }
}

fn recipient_for(target: &DispatchTarget, event: &RsvpEvent) -> Option<String> {
    target
        .recipient_override
        .clone()
        .or_else(|| event.owner_id.clone())
}

async fn handle_rsvp(
    target: &DispatchTarget,
    event: &RsvpEvent,
) -> Result<(), errors::NotificationError> {
    let to = recipient_for(target, event)
        .ok_or_else(|| errors::NotificationError::NoRecipient(event.evite_id.clone()))?;

    info!(
        "Notifying host of evite_id={} about {} ({})",
        event.evite_id, event.guest_name, event.status
    );

    send_rsvp_notification(&target.client, &target.endpoint, event, &to)
        .await
        .map_err(errors::NotificationError::SendFailed)?;

    info!("Sent RSVP notification for evite_id={}", event.evite_id);
    Ok(())
}
