use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use evite_shared::models::{now_str, Evite, RsvpSummary};
use evite_shared::store::{RemoteEviteStore, SaveOutcome, SlotStorage};
use log::{info, warn};
use uuid::Uuid;

use super::guest_handlers::validate_contact;
use super::{load_owned_evite, SharedStorage};
use crate::error::{AppError, Result};
use crate::models::{CreateEviteRequest, UpdateEviteRequest};

fn log_outcome(id: &str, outcome: SaveOutcome) {
    if outcome != SaveOutcome::Synced {
        warn!("Evite {} saved with degraded persistence: {:?}", id, outcome);
    }
}

// GET /evites
pub async fn list_evites<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    let evites = storage.list_for_owner(&user_id).await;
    Ok(Json(serde_json::json!({ "evites": evites })))
}

// POST /evites
pub async fn create_evite<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<CreateEviteRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("Title is required".into()));
    }

    let mut evite = Evite {
        id: Uuid::new_v4().to_string(),
        title: payload.title.trim().to_string(),
        host_name: payload.host_name,
        date: payload.date,
        time: payload.time,
        location: payload.location,
        description: payload.description,
        template: payload.template,
        is_customized: payload.is_customized,
        custom_style: payload.custom_style,
        custom_images: payload.custom_images,
        guests: vec![],
        created_at: now_str(),
        owner_id: Some(user_id),
    };

    for guest in payload.guests {
        validate_contact(&guest.name, &guest.email)?;
        evite.add_guest(guest)?;
    }

    let outcome = storage.save(&evite).await?;
    log_outcome(&evite.id, outcome);
    info!(
        "Created evite {} with {} guests",
        evite.id,
        evite.guests.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "evite": evite, "persistence": outcome })),
    ))
}

// GET /evites/:id
pub async fn get_evite<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    let evite = load_owned_evite(&storage, &id, &user_id).await?;
    Ok(Json(serde_json::json!({ "evite": evite })))
}

// PUT /evites/:id
pub async fn update_evite<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateEviteRequest>,
) -> Result<Json<serde_json::Value>>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    let mut evite = load_owned_evite(&storage, &id, &user_id).await?;

    if matches!(&payload.title, Some(title) if title.trim().is_empty()) {
        return Err(AppError::bad_request("Title cannot be empty".into()));
    }
    for guest in payload.guests.iter().flatten() {
        validate_contact(&guest.name, &guest.email)?;
    }
    payload.apply(&mut evite)?;

    let outcome = storage.save(&evite).await?;
    log_outcome(&evite.id, outcome);

    Ok(Json(
        serde_json::json!({ "evite": evite, "persistence": outcome }),
    ))
}

// DELETE /evites/:id
pub async fn delete_evite<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<StatusCode>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    load_owned_evite(&storage, &id, &user_id).await?;

    let outcome = storage.delete(&id).await?;
    if outcome.remote_removed.is_none() {
        warn!("Evite {} deleted locally only", id);
    }

    Ok(StatusCode::NO_CONTENT)
}

// GET /evites/:id/summary
pub async fn get_rsvp_summary<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<RsvpSummary>>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    let evite = load_owned_evite(&storage, &id, &user_id).await?;
    Ok(Json(evite.rsvp_summary()))
}
