use axum::{
    extract::{Path, State},
    Json,
};
use evite_shared::models::{events::RsvpEvent, now_str, RsvpSubmission};
use evite_shared::store::{RemoteEviteStore, SlotStorage};
use log::{error, info};

use super::guest_handlers::validate_contact;
use super::SharedStorage;
use crate::error::{AppError, Result};
use crate::models::PublicEviteView;
use crate::publish::publish_rsvp_event;

fn unavailable(id: &str) -> AppError {
    AppError::not_found(format!("Invitation {} is no longer available", id))
}

// GET /public/evites/:id
pub async fn get_public_evite<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Path(id): Path<String>,
) -> Result<Json<PublicEviteView>>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    let evite = storage.get(&id).await.ok_or_else(|| unavailable(&id))?;
    Ok(Json(PublicEviteView::from(&evite)))
}

// POST /public/evites/:id/rsvp
pub async fn submit_rsvp<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Path(id): Path<String>,
    Json(payload): Json<RsvpSubmission>,
) -> Result<Json<serde_json::Value>>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    validate_contact(&payload.name, &payload.email)?;
    let email = payload.email.clone();

    let evite = storage
        .submit_rsvp(&id, payload)
        .await
        .map_err(|e| match e {
            evite_shared::error::EviteError::NotFound(_) => unavailable(&id),
            other => other.into(),
        })?;

    let guest = evite
        .guest_by_email(&email)
        .cloned()
        .ok_or_else(|| AppError::internal_server_error("RSVP was not recorded".into()))?;
    info!(
        "Guest {} answered {} for evite {}",
        guest.id,
        guest.status.as_str(),
        id
    );

    // The RSVP is already stored; a failed notification must not fail the guest's request.
    if let Err(e) = publish_rsvp_event(&RsvpEvent::received(&evite, &guest, now_str())).await {
        error!("Failed to publish rsvp_received for evite {}: {}", id, e);
    }

    Ok(Json(serde_json::json!({
        "guest": guest,
        "evite": PublicEviteView::from(&evite),
    })))
}
