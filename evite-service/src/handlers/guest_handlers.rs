use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use evite_shared::models::NewGuest;
use evite_shared::store::{RemoteEviteStore, SlotStorage};
use log::info;

use super::{load_owned_evite, SharedStorage};
use crate::error::{AppError, Result};
use crate::models::UpdateGuestRequest;

pub(crate) fn validate_contact(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::bad_request("Guest name is required".into()));
    }
    if !email.contains('@') {
        return Err(AppError::bad_request(format!(
            "Invalid email address: {}",
            email
        )));
    }
    Ok(())
}

// POST /evites/:id/guests
pub async fn add_guest<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<NewGuest>,
) -> Result<(StatusCode, Json<serde_json::Value>)>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    validate_contact(&payload.name, &payload.email)?;
    load_owned_evite(&storage, &id, &user_id).await?;

    let evite = storage.add_guest(&id, payload).await?;
    info!("Added guest to evite {}, {} guests", id, evite.guests.len());

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "evite": evite })),
    ))
}

// PATCH /evites/:id/guests/:guest_id
pub async fn update_guest<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Path((id, guest_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateGuestRequest>,
) -> Result<Json<serde_json::Value>>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    load_owned_evite(&storage, &id, &user_id).await?;

    let evite = storage
        .update_guest_status(&id, &guest_id, payload.status, payload.details)
        .await?;

    Ok(Json(serde_json::json!({ "evite": evite })))
}

// DELETE /evites/:id/guests/:guest_id
pub async fn remove_guest<R, S>(
    State(storage): State<SharedStorage<R, S>>,
    Path((id, guest_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    R: RemoteEviteStore + 'static,
    S: SlotStorage + 'static,
{
    load_owned_evite(&storage, &id, &user_id).await?;

    let evite = storage.remove_guest(&id, &guest_id).await?;
    info!("Removed guest {} from evite {}", guest_id, id);

    Ok(Json(serde_json::json!({ "evite": evite })))
}
