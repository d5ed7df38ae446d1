use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EviteError;

pub mod events;

/// Current UTC time as an RFC 3339 string, the timestamp format used across records.
pub fn now_str() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EviteTemplate {
    #[default]
    Classic,
    Elegant,
    Kids,
    Minimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuestStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl GuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestStatus::Pending => "pending",
            GuestStatus::Accepted => "accepted",
            GuestStatus::Declined => "declined",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChildGuest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

/// Attendance details a guest can attach to an accepted RSVP.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headcount: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adults: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children_names: Vec<ChildGuest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AttendanceDetails {
    /// Number of people this RSVP brings. Falls back to the adult/child split,
    /// then to a single attendee.
    pub fn expected_headcount(&self) -> u32 {
        if let Some(headcount) = self.headcount {
            return headcount;
        }
        match (self.adults, self.children) {
            (None, None) => 1,
            (adults, children) => adults.unwrap_or(0).saturating_add(children.unwrap_or(0)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: GuestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<AttendanceDetails>,
}

impl Guest {
    pub fn has_email(&self, email: &str) -> bool {
        normalize_email(&self.email) == normalize_email(email)
    }
}

/// The event record: a host's invitation together with its guest list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Evite {
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
    pub owner_id: Option<String>,
}

/// Public RSVP payload, keyed by email.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RsvpSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: GuestStatus,
    #[serde(default)]
    pub details: Option<AttendanceDetails>,
}

/// A guest added by the host. Always starts out pending.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewGuest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RsvpSummary {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub declined: usize,
    pub expected_headcount: u32,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn details_for(status: GuestStatus, details: Option<AttendanceDetails>) -> Option<AttendanceDetails> {
    match status {
        GuestStatus::Accepted => details,
        _ => None,
    }
}

impl Evite {
    pub fn guest_by_email(&self, email: &str) -> Option<&Guest> {
        self.guests.iter().find(|g| g.has_email(email))
    }

    /// Records an RSVP, replacing any existing guest with the same email
    /// (case-insensitive). The guest id of an existing entry is kept.
    pub fn upsert_rsvp(&mut self, submission: RsvpSubmission) -> &Guest {
        let details = details_for(submission.status, submission.details);
        let email = submission.email.trim().to_string();

        let index = match self.guests.iter().position(|g| g.has_email(&email)) {
            Some(index) => {
                let guest = &mut self.guests[index];
                guest.name = submission.name;
                guest.email = email;
                guest.phone = submission.phone;
                guest.status = submission.status;
                guest.details = details;
                index
            }
            None => {
                self.guests.push(Guest {
                    id: Uuid::new_v4().to_string(),
                    name: submission.name,
                    email,
                    phone: submission.phone,
                    status: submission.status,
                    details,
                });
                self.guests.len() - 1
            }
        };

        &self.guests[index]
    }

    pub fn add_guest(&mut self, new_guest: NewGuest) -> Result<&Guest, EviteError> {
        let email = new_guest.email.trim().to_string();
        if self.guest_by_email(&email).is_some() {
            return Err(EviteError::DuplicateGuest(email));
        }

        self.guests.push(Guest {
            id: Uuid::new_v4().to_string(),
            name: new_guest.name,
            email,
            phone: new_guest.phone,
            status: GuestStatus::Pending,
            details: None,
        });
        Ok(&self.guests[self.guests.len() - 1])
    }

    /// Replaces the guest list. Guests whose email is already invited keep
    /// their id and RSVP; new emails start pending. On a duplicate email the
    /// list is left untouched.
    pub fn replace_guests(&mut self, guests: Vec<NewGuest>) -> Result<(), EviteError> {
        let mut replaced: Vec<Guest> = Vec::with_capacity(guests.len());
        for new_guest in guests {
            let email = new_guest.email.trim().to_string();
            if replaced.iter().any(|g| g.has_email(&email)) {
                return Err(EviteError::DuplicateGuest(email));
            }

            let guest = match self.guest_by_email(&email) {
                Some(existing) => Guest {
                    name: new_guest.name,
                    email,
                    phone: new_guest.phone,
                    ..existing.clone()
                },
                None => Guest {
                    id: Uuid::new_v4().to_string(),
                    name: new_guest.name,
                    email,
                    phone: new_guest.phone,
                    status: GuestStatus::Pending,
                    details: None,
                },
            };
            replaced.push(guest);
        }

        self.guests = replaced;
        Ok(())
    }

    pub fn update_guest_status(
        &mut self,
        guest_id: &str,
        status: GuestStatus,
        details: Option<AttendanceDetails>,
    ) -> Result<&Guest, EviteError> {
        let guest = self
            .guests
            .iter_mut()
            .find(|g| g.id == guest_id)
            .ok_or_else(|| EviteError::NotFound(format!("guest {}", guest_id)))?;

        guest.status = status;
        guest.details = details_for(status, details);
        Ok(&*guest)
    }

    /// Returns whether a guest with this id was on the list.
    pub fn remove_guest(&mut self, guest_id: &str) -> bool {
        let before = self.guests.len();
        self.guests.retain(|g| g.id != guest_id);
        self.guests.len() != before
    }

    pub fn rsvp_summary(&self) -> RsvpSummary {
        let mut summary = RsvpSummary {
            total: self.guests.len(),
            ..RsvpSummary::default()
        };

        for guest in &self.guests {
            match guest.status {
                GuestStatus::Pending => summary.pending += 1,
                GuestStatus::Declined => summary.declined += 1,
                GuestStatus::Accepted => {
                    summary.accepted += 1;
                    let headcount = guest
                        .details
                        .as_ref()
                        .map(AttendanceDetails::expected_headcount)
                        .unwrap_or(1);
                    summary.expected_headcount =
                        summary.expected_headcount.saturating_add(headcount);
                }
            }
        }

        summary
    }
}
