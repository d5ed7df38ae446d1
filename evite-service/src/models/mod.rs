use evite_shared::models::{
    AttendanceDetails, Evite, EviteTemplate, GuestStatus, NewGuest, RsvpSummary,
};
use evite_shared::error::EviteError;
use serde::{Deserialize, Deserializer, Serialize};

// Request DTOs
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateEviteRequest {
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
    #[serde(default)]
    pub custom_style: Option<String>,
    #[serde(default)]
    pub custom_images: Vec<String>,
    #[serde(default)]
    pub guests: Vec<NewGuest>,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Edit of an existing evite. Absent fields are left unchanged; `customStyle: null`
/// clears the style and a supplied `guests` list replaces the guest list.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEviteRequest {
    pub title: Option<String>,
    pub host_name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub template: Option<EviteTemplate>,
    pub is_customized: Option<bool>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub custom_style: Option<Option<String>>,
    pub custom_images: Option<Vec<String>>,
    pub guests: Option<Vec<NewGuest>>,
}

impl UpdateEviteRequest {
    pub fn apply(self, evite: &mut Evite) -> Result<(), EviteError> {
        if let Some(guests) = self.guests {
            evite.replace_guests(guests)?;
        }

        if let Some(title) = self.title {
            evite.title = title;
        }
        if let Some(host_name) = self.host_name {
            evite.host_name = host_name;
        }
        if let Some(date) = self.date {
            evite.date = date;
        }
        if let Some(time) = self.time {
            evite.time = time;
        }
        if let Some(location) = self.location {
            evite.location = location;
        }
        if let Some(description) = self.description {
            evite.description = description;
        }
        if let Some(template) = self.template {
            evite.template = template;
        }
        if let Some(is_customized) = self.is_customized {
            evite.is_customized = is_customized;
        }
        if let Some(custom_style) = self.custom_style {
            evite.custom_style = custom_style;
        }
        if let Some(custom_images) = self.custom_images {
            evite.custom_images = custom_images;
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
pub struct UpdateGuestRequest {
    pub status: GuestStatus,
    #[serde(default)]
    pub details: Option<AttendanceDetails>,
}

// Response DTOs
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicGuest {
    pub name: String,
    pub status: GuestStatus,
}

/// What a share-link visitor sees: the invitation without other guests' contact details.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicEviteView {
    pub id: String,
    pub title: String,
    pub host_name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub description: String,
    pub template: EviteTemplate,
    pub is_customized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_style: Option<String>,
    pub custom_images: Vec<String>,
    pub guests: Vec<PublicGuest>,
    pub summary: RsvpSummary,
}

impl From<&Evite> for PublicEviteView {
    fn from(evite: &Evite) -> Self {
        Self {
            id: evite.id.clone(),
            title: evite.title.clone(),
            host_name: evite.host_name.clone(),
            date: evite.date.clone(),
            time: evite.time.clone(),
            location: evite.location.clone(),
            description: evite.description.clone(),
            template: evite.template,
            is_customized: evite.is_customized,
            custom_style: evite.custom_style.clone(),
            custom_images: evite.custom_images.clone(),
            guests: evite
                .guests
                .iter()
                .map(|g| PublicGuest {
                    name: g.name.clone(),
                    status: g.status,
                })
                .collect(),
            summary: evite.rsvp_summary(),
        }
    }
}
