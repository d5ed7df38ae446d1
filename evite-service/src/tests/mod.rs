use std::env;
use std::sync::Arc;

use axum::Router;
use chrono::Duration;
use evite_shared::store::{EviteStorage, LocalEviteCache, MemorySlotStorage, TombstoneSet};
use evite_shared::test_utils::manual_clock::ManualClock;
use evite_shared::test_utils::mock_remote_store::MockRemoteStore;
use evite_shared::test_utils::test_logging::init_test_logging;

use crate::routes::create_router_with_storage;

mod evite_handlers_test;

pub(crate) struct TestApp {
    pub app: Router,
    pub remote: Arc<MockRemoteStore>,
    pub storage: Arc<EviteStorage<MockRemoteStore, MemorySlotStorage>>,
    pub clock: Arc<ManualClock>,
}

pub(crate) fn create_test_app() -> TestApp {
    init_test_logging();

    // Skip actual SNS publishing
    env::set_var("TEST_SNS", "true");

    let remote = Arc::new(MockRemoteStore::new());
    let clock = Arc::new(ManualClock::starting_now());
    let storage = Arc::new(EviteStorage::new(
        remote.clone(),
        LocalEviteCache::new(MemorySlotStorage::new(), "evites"),
        TombstoneSet::new(Duration::seconds(30), clock.clone()),
    ));

    let app = create_router_with_storage(storage.clone(), "");
    TestApp {
        app,
        remote,
        storage,
        clock,
    }
}
