use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;

use crate::error::RemoteError;
use crate::models::Evite;
use crate::store::{sort_newest_first, RemoteEviteStore};

#[derive(Default)]
struct MockState {
    rows: BTreeMap<String, Evite>,
    failure: Option<RemoteError>,
    remove_failure: Option<RemoteError>,
    ignore_removes: bool,
    remove_latency: Option<Duration>,
}

/// In-memory remote store with failure injection.
#[derive(Default)]
pub struct MockRemoteStore {
    state: Mutex<MockState>,
}

impl MockRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails with `error` until `recover` is called.
    pub async fn fail_with(&self, error: RemoteError) {
        self.state.lock().await.failure = Some(error);
    }

    /// Only deletes fail with `error`.
    pub async fn fail_removes_with(&self, error: RemoteError) {
        self.state.lock().await.remove_failure = Some(error);
    }

    pub async fn recover(&self) {
        let mut state = self.state.lock().await;
        state.failure = None;
        state.remove_failure = None;
    }

    /// Deletes report success without removing anything, like a store that
    /// has not converged yet.
    pub async fn ignore_removes(&self, ignore: bool) {
        self.state.lock().await.ignore_removes = ignore;
    }

    pub async fn set_remove_latency(&self, latency: Duration) {
        self.state.lock().await.remove_latency = Some(latency);
    }

    /// Inserts a row directly, bypassing failure injection.
    pub async fn seed(&self, evite: Evite) {
        self.state.lock().await.rows.insert(evite.id.clone(), evite);
    }

    pub async fn snapshot(&self) -> Vec<Evite> {
        let mut rows: Vec<Evite> = self.state.lock().await.rows.values().cloned().collect();
        sort_newest_first(&mut rows);
        rows
    }

    async fn check(&self) -> Result<(), RemoteError> {
        match &self.state.lock().await.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteEviteStore for MockRemoteStore {
    async fn get(&self, id: &str) -> Result<Option<Evite>, RemoteError> {
        self.check().await?;
        Ok(self.state.lock().await.rows.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Evite>, RemoteError> {
        self.check().await?;
        Ok(self.snapshot().await)
    }

    async fn upsert(&self, evite: &Evite) -> Result<(), RemoteError> {
        self.check().await?;
        self.seed(evite.clone()).await;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<usize, RemoteError> {
        self.check().await?;

        let latency = self.state.lock().await.remove_latency;
        if let Some(latency) = latency {
            debug!("Mock remote delaying delete of {} by {:?}", id, latency);
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().await;
        if let Some(error) = &state.remove_failure {
            return Err(error.clone());
        }
        if state.ignore_removes {
            return Ok(0);
        }
        Ok(state.rows.remove(id).map_or(0, |_| 1))
    }
}
