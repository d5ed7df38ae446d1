use std::sync::Arc;

use evite_shared::models::Evite;
use evite_shared::store::{EviteStorage, RemoteEviteStore, SlotStorage};

use crate::error::{AppError, Result};

pub mod evite_handlers;
pub mod guest_handlers;
pub mod public_handlers;

pub type SharedStorage<R, S> = Arc<EviteStorage<R, S>>;

/// Loads an evite the caller owns. Evites without an owner are open to any host.
pub async fn load_owned_evite<R, S>(
    storage: &EviteStorage<R, S>,
    id: &str,
    user_id: &str,
) -> Result<Evite>
where
    R: RemoteEviteStore,
    S: SlotStorage,
{
    let evite = storage
        .get(id)
        .await
        .ok_or_else(|| AppError::not_found(format!("Evite {} not found", id)))?;

    match evite.owner_id.as_deref() {
        Some(owner) if owner != user_id => Err(AppError::forbidden(
            "You don't have permission to manage this evite".into(),
        )),
        _ => Ok(evite),
    }
}
