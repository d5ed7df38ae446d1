use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::events::RsvpEvent;

/// Message accepted by the email/SMS dispatch endpoint.
#[derive(Debug, Serialize, Clone)]
pub struct DispatchMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct DispatchReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Posts a message to the dispatch endpoint.
pub async fn send_dispatch(
    client: &Client,
    endpoint: &str,
    message: &DispatchMessage,
) -> Result<DispatchReceipt, String> {
    info!("Dispatching notification to {}", message.to);

    let response = client
        .post(endpoint)
        .header("Accept", "application/json")
        .json(message)
        .send()
        .await
        .map_err(|e| {
            error!("Failed to reach dispatch endpoint: {}", e);
            format!("Failed to reach dispatch endpoint: {}", e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        error!(
            "Dispatch endpoint returned error status {}: {}",
            status, error_text
        );
        return Err(format!("Dispatch error: {} - {}", status, error_text));
    }

    // Some providers answer 202 with an empty body.
    let text = response.text().await.unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(DispatchReceipt {
            id: None,
            status: Some(status.as_str().to_string()),
        });
    }
    serde_json::from_str(&text).map_err(|e| {
        error!("Failed to parse dispatch response: {}", e);
        format!("Failed to parse dispatch response: {}", e)
    })
}

/// Builds the host-facing message for an RSVP.
pub fn rsvp_message(event: &RsvpEvent, to: &str) -> DispatchMessage {
    let verb = match event.status.as_str() {
        "accepted" => "is coming to",
        "declined" => "can't make it to",
        _ => "responded to",
    };

    let mut body = format!("{} {} \"{}\".", event.guest_name, verb, event.evite_title);
    if let Some(headcount) = event.headcount.filter(|n| *n > 1) {
        body.push_str(&format!(" Party of {}.", headcount));
    }

    DispatchMessage {
        to: to.to_string(),
        subject: format!("New RSVP for {}", event.evite_title),
        body,
        data: Some(serde_json::json!({
            "type": event.event_type,
            "eviteId": event.evite_id,
            "guestEmail": event.guest_email,
            "status": event.status,
        })),
    }
}

/// Notifies the host of an RSVP through the dispatch endpoint.
pub async fn send_rsvp_notification(
    client: &Client,
    endpoint: &str,
    event: &RsvpEvent,
    to: &str,
) -> Result<DispatchReceipt, String> {
    send_dispatch(client, endpoint, &rsvp_message(event, to)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::RSVP_RECEIVED;

    fn event(status: &str, headcount: Option<u32>) -> RsvpEvent {
        RsvpEvent {
            event_type: RSVP_RECEIVED.to_string(),
            evite_id: "1".to_string(),
            evite_title: "Party".to_string(),
            host_name: "Alex".to_string(),
            owner_id: Some("host-1".to_string()),
            guest_name: "Sam".to_string(),
            guest_email: "sam@x.com".to_string(),
            status: status.to_string(),
            headcount,
            timestamp: "2026-10-01T10:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_rsvp_message_wording() {
        let message = rsvp_message(&event("accepted", Some(3)), "alex@x.com");
        assert_eq!(message.to, "alex@x.com");
        assert_eq!(message.subject, "New RSVP for Party");
        assert_eq!(message.body, "Sam is coming to \"Party\". Party of 3.");

        let message = rsvp_message(&event("declined", None), "alex@x.com");
        assert_eq!(message.body, "Sam can't make it to \"Party\".");
        assert_eq!(message.data.unwrap()["eviteId"], "1");
    }
}
