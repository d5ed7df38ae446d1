use serde::{Deserialize, Serialize};

use super::{Evite, Guest};

pub const RSVP_RECEIVED: &str = "rsvp_received";

/// Event published when a guest answers an invitation through the share link
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RsvpEvent {
    pub event_type: String,
    pub evite_id: String,
    pub evite_title: String,
    pub host_name: String,
    pub owner_id: Option<String>,
    pub guest_name: String,
    pub guest_email: String,
    pub status: String,
    #[serde(default)]
    pub headcount: Option<u32>,
    pub timestamp: String,
}

impl RsvpEvent {
    pub fn received(evite: &Evite, guest: &Guest, timestamp: String) -> Self {
        Self {
            event_type: RSVP_RECEIVED.to_string(),
            evite_id: evite.id.clone(),
            evite_title: evite.title.clone(),
            host_name: evite.host_name.clone(),
            owner_id: evite.owner_id.clone(),
            guest_name: guest.name.clone(),
            guest_email: guest.email.clone(),
            status: guest.status.as_str().to_string(),
            headcount: guest.details.as_ref().map(|d| d.expected_headcount()),
            timestamp,
        }
    }
}
