use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::Evite;

pub mod dynamo;
pub mod evite_storage;
pub mod local;
pub mod tombstone;

pub use evite_storage::{DeleteOutcome, EviteStorage, SaveOutcome};
pub use local::{FileSlotStorage, LocalEviteCache, MemorySlotStorage, SlotStorage};
pub use tombstone::{Clock, SystemClock, TombstoneSet};

/// Durable evite storage keyed by evite id.
#[async_trait]
pub trait RemoteEviteStore: Send + Sync {
    /// Missing rows are `Ok(None)`; errors are reserved for transport or configuration failures.
    async fn get(&self, id: &str) -> Result<Option<Evite>, RemoteError>;

    /// All evites, newest first.
    async fn list(&self) -> Result<Vec<Evite>, RemoteError>;

    /// Insert or replace by id. Last write wins.
    async fn upsert(&self, evite: &Evite) -> Result<(), RemoteError>;

    /// Delete by id, returning how many rows were removed (0 or 1).
    async fn remove(&self, id: &str) -> Result<usize, RemoteError>;
}

/// Orders evites newest first. RFC 3339 stamps are compared as instants;
/// anything unparsable sorts last.
pub fn sort_newest_first(evites: &mut [Evite]) {
    evites.sort_by(|a, b| {
        let a_ts = chrono::DateTime::parse_from_rfc3339(&a.created_at).ok();
        let b_ts = chrono::DateTime::parse_from_rfc3339(&b.created_at).ok();
        b_ts.cmp(&a_ts)
    });
}
