use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::EviteConfig;
use crate::error::{EviteError, RemoteError};
use crate::models::{AttendanceDetails, Evite, GuestStatus, NewGuest, RsvpSubmission};
use crate::store::local::{FileSlotStorage, LocalEviteCache, SlotStorage};
use crate::store::tombstone::TombstoneSet;
use crate::store::RemoteEviteStore;

/// Where a save landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveOutcome {
    Synced,
    /// Remote upsert failed; the edit only lives in the local cache for now.
    LocalOnly,
    /// Remote upsert succeeded but the local mirror could not be written.
    RemoteOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub local_removed: bool,
    /// `None` when the remote store is misconfigured and the delete was not applied there.
    pub remote_removed: Option<bool>,
}

impl DeleteOutcome {
    /// Neither backend had anything to delete.
    pub fn already_gone(&self) -> bool {
        !self.local_removed && self.remote_removed != Some(true)
    }
}

/// Evite storage over a remote store and a local mirror.
///
/// Reads degrade to the local cache when the remote store fails. Writes go to
/// both and only fail when both do. Deletes are tombstoned first so that a
/// list right after a delete never shows the deleted evite, whatever the
/// remote store returns.
///
/// If a remote delete fails on a configuration error, the local delete stands
/// and the evite may reappear once its tombstone expires and the remote store
/// still reports it.
pub struct EviteStorage<R, S> {
    remote: Arc<R>,
    local: LocalEviteCache<S>,
    tombstones: TombstoneSet,
}

impl<R> EviteStorage<R, FileSlotStorage>
where
    R: RemoteEviteStore,
{
    pub fn from_config(remote: Arc<R>, config: &EviteConfig) -> Self {
        Self::new(
            remote,
            LocalEviteCache::new(
                FileSlotStorage::new(config.cache_dir.clone()),
                config.cache_slot.clone(),
            ),
            TombstoneSet::with_system_clock(config.tombstone_window),
        )
    }
}

impl<R, S> EviteStorage<R, S>
where
    R: RemoteEviteStore,
    S: SlotStorage,
{
    pub fn new(remote: Arc<R>, local: LocalEviteCache<S>, tombstones: TombstoneSet) -> Self {
        Self {
            remote,
            local,
            tombstones,
        }
    }

    pub fn local(&self) -> &LocalEviteCache<S> {
        &self.local
    }

    pub fn tombstones(&self) -> &TombstoneSet {
        &self.tombstones
    }

    /// All known evites, newest first.
    pub async fn list(&self) -> Vec<Evite> {
        match self.remote.list().await {
            Ok(rows) if rows.is_empty() => {
                debug!("Remote store has no evites, clearing local cache");
                if let Err(e) = self.local.clear() {
                    warn!("Failed to clear local evite cache: {}", e);
                }
                Vec::new()
            }
            Ok(rows) => {
                let evites: Vec<Evite> = rows
                    .into_iter()
                    .filter(|e| !self.tombstones.is_tombstoned(&e.id))
                    .collect();
                if let Err(e) = self.local.write_all(&evites) {
                    warn!("Failed to sync local evite cache: {}", e);
                }
                evites
            }
            Err(e) => {
                log_remote_failure("list", &e);
                match self
                    .local
                    .retain_and_read(|e| !self.tombstones.is_tombstoned(&e.id))
                {
                    Ok((evites, _)) => evites,
                    Err(e) => {
                        warn!("Failed to drop tombstoned evites from local cache: {}", e);
                        self.local
                            .read_all()
                            .into_iter()
                            .filter(|e| !self.tombstones.is_tombstoned(&e.id))
                            .collect()
                    }
                }
            }
        }
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> Vec<Evite> {
        self.list()
            .await
            .into_iter()
            .filter(|e| e.owner_id.as_deref() == Some(owner_id))
            .collect()
    }

    /// `None` is terminal: the evite is gone or the share link is invalid.
    pub async fn get(&self, id: &str) -> Option<Evite> {
        if self.tombstones.is_tombstoned(id) {
            debug!("Evite {} is tombstoned", id);
            return None;
        }

        match self.remote.get(id).await {
            Ok(Some(evite)) => return Some(evite),
            Ok(None) => debug!("Evite {} not in remote store, checking local cache", id),
            Err(e) => log_remote_failure("get", &e),
        }

        self.local.get(id)
    }

    pub async fn save(&self, evite: &Evite) -> Result<SaveOutcome, EviteError> {
        if self.tombstones.lift(&evite.id) {
            info!("Evite {} saved again after delete, lifting tombstone", evite.id);
        }

        let remote = self.remote.upsert(evite).await;
        if let Err(e) = &remote {
            log_remote_failure("save", e);
        }

        let local = self.local.upsert_one(evite);
        if let Err(e) = &local {
            warn!("Failed to write evite {} to local cache: {}", evite.id, e);
        }

        match (remote, local) {
            (Ok(()), Ok(())) => Ok(SaveOutcome::Synced),
            (Err(_), Ok(())) => Ok(SaveOutcome::LocalOnly),
            (Ok(()), Err(_)) => Ok(SaveOutcome::RemoteOnly),
            (Err(remote), Err(local)) => Err(EviteError::SaveFailed {
                id: evite.id.clone(),
                remote,
                local,
            }),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, EviteError> {
        self.tombstones.mark_deleted(id);

        let local_removed = match self.local.remove_one(id) {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Failed to remove evite {} from local cache: {}", id, e);
                false
            }
        };

        match self.remote.remove(id).await {
            Ok(count) => {
                info!(
                    "Deleted evite {} (remote rows={}, local={})",
                    id, count, local_removed
                );
                Ok(DeleteOutcome {
                    local_removed,
                    remote_removed: Some(count > 0),
                })
            }
            Err(e) if e.is_configuration() => {
                error!(
                    "Remote delete of evite {} skipped, store misconfigured: {}. Local delete stands.",
                    id, e
                );
                Ok(DeleteOutcome {
                    local_removed,
                    remote_removed: None,
                })
            }
            Err(e) if local_removed => {
                warn!(
                    "Remote delete of evite {} failed, removed locally only: {}",
                    id, e
                );
                Ok(DeleteOutcome {
                    local_removed,
                    remote_removed: Some(false),
                })
            }
            Err(e) => {
                error!("Failed to delete evite {}: {}", id, e);
                Err(EviteError::DeletionFailed {
                    id: id.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Public RSVP: upserts the guest by email and saves the evite.
    pub async fn submit_rsvp(
        &self,
        id: &str,
        submission: RsvpSubmission,
    ) -> Result<Evite, EviteError> {
        self.modify(id, |evite| {
            let guest = evite.upsert_rsvp(submission);
            info!(
                "RSVP for evite {}: guest {} is {}",
                id,
                guest.id,
                guest.status.as_str()
            );
            Ok(())
        })
        .await
    }

    pub async fn add_guest(&self, id: &str, new_guest: NewGuest) -> Result<Evite, EviteError> {
        self.modify(id, |evite| evite.add_guest(new_guest).map(|_| ()))
            .await
    }

    pub async fn update_guest_status(
        &self,
        id: &str,
        guest_id: &str,
        status: GuestStatus,
        details: Option<AttendanceDetails>,
    ) -> Result<Evite, EviteError> {
        self.modify(id, |evite| {
            evite
                .update_guest_status(guest_id, status, details)
                .map(|_| ())
        })
        .await
    }

    pub async fn remove_guest(&self, id: &str, guest_id: &str) -> Result<Evite, EviteError> {
        self.modify(id, |evite| {
            if evite.remove_guest(guest_id) {
                Ok(())
            } else {
                Err(EviteError::NotFound(format!("guest {}", guest_id)))
            }
        })
        .await
    }

    async fn modify<F>(&self, id: &str, change: F) -> Result<Evite, EviteError>
    where
        F: FnOnce(&mut Evite) -> Result<(), EviteError>,
    {
        let mut evite = self
            .get(id)
            .await
            .ok_or_else(|| EviteError::NotFound(format!("evite {}", id)))?;
        change(&mut evite)?;
        self.save(&evite).await?;
        Ok(evite)
    }
}

fn log_remote_failure(operation: &str, err: &RemoteError) {
    if err.is_configuration() {
        error!(
            "Remote evite store misconfigured during {}, using local cache: {}",
            operation, err
        );
    } else {
        warn!(
            "Remote evite store failed during {}, using local cache: {}",
            operation, err
        );
    }
}
