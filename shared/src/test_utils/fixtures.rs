use crate::models::{Evite, EviteTemplate};

pub const SAMPLE_CREATED_AT: &str = "2026-10-01T10:00:00+00:00";

/// A minimal evite with a fixed creation time and no guests.
pub fn sample_evite(id: &str, title: &str) -> Evite {
    Evite {
        id: id.to_string(),
        title: title.to_string(),
        host_name: "Alex".to_string(),
        date: "2026-11-01".to_string(),
        time: "18:00".to_string(),
        location: "123 Main St".to_string(),
        description: "Come celebrate!".to_string(),
        template: EviteTemplate::Classic,
        is_customized: false,
        custom_style: None,
        custom_images: vec![],
        guests: vec![],
        created_at: SAMPLE_CREATED_AT.to_string(),
        owner_id: None,
    }
}
