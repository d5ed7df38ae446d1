use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use log::debug;

/// Source of the current time, injected so tests can move it by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Process-local set of recently deleted evite ids.
///
/// An id stays tombstoned for `window` after `mark_deleted`, which hides it from
/// stale remote reads that have not caught up with the delete yet. Expiry is
/// checked lazily against the clock; nothing is scheduled.
pub struct TombstoneSet {
    window: Duration,
    clock: Arc<dyn Clock>,
    deleted_at: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl TombstoneSet {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            deleted_at: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_system_clock(window: Duration) -> Self {
        Self::new(window, Arc::new(SystemClock))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn mark_deleted(&self, id: &str) {
        let now = self.clock.now();
        self.entries().insert(id.to_string(), now);
        debug!(
            "Tombstoned evite {} for {}s",
            id,
            self.window.num_seconds()
        );
    }

    pub fn is_tombstoned(&self, id: &str) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries();
        match entries.get(id) {
            Some(deleted_at) if live(*deleted_at, self.window, now) => true,
            Some(_) => {
                entries.remove(id);
                false
            }
            None => false,
        }
    }

    /// Drops the tombstone for an id that has been explicitly saved again.
    pub fn lift(&self, id: &str) -> bool {
        self.entries().remove(id).is_some()
    }

    /// Removes expired tombstones, returning how many were dropped.
    pub fn prune(&self) -> usize {
        let now = self.clock.now();
        let window = self.window;
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, deleted_at| live(*deleted_at, window, now));
        before - entries.len()
    }

    /// Number of live tombstones.
    pub fn len(&self) -> usize {
        self.prune();
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.deleted_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A tombstone whose expiry is past the end of time never expires.
fn live(deleted_at: DateTime<Utc>, window: Duration, now: DateTime<Utc>) -> bool {
    deleted_at
        .checked_add_signed(window)
        .map_or(true, |expires_at| now < expires_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::manual_clock::ManualClock;

    fn tombstones() -> (TombstoneSet, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let set = TombstoneSet::new(Duration::seconds(30), clock.clone());
        (set, clock)
    }

    #[test]
    fn test_tombstone_expires_after_window() {
        let (set, clock) = tombstones();
        set.mark_deleted("1");
        assert!(set.is_tombstoned("1"));
        assert!(!set.is_tombstoned("2"));

        clock.advance(Duration::seconds(29));
        assert!(set.is_tombstoned("1"));

        clock.advance(Duration::seconds(1));
        assert!(!set.is_tombstoned("1"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_mark_again_restarts_window() {
        let (set, clock) = tombstones();
        set.mark_deleted("1");
        clock.advance(Duration::seconds(20));
        set.mark_deleted("1");
        clock.advance(Duration::seconds(20));
        assert!(set.is_tombstoned("1"));
    }

    #[test]
    fn test_prune_and_lift() {
        let (set, clock) = tombstones();
        set.mark_deleted("old");
        clock.advance(Duration::seconds(40));
        set.mark_deleted("new");

        assert_eq!(set.prune(), 1);
        assert_eq!(set.len(), 1);
        assert!(set.lift("new"));
        assert!(!set.lift("new"));
        assert!(!set.is_tombstoned("new"));
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let clock = Arc::new(ManualClock::starting_now());
        let set = TombstoneSet::new(Duration::MAX, clock.clone());
        set.mark_deleted("1");
        clock.advance(Duration::days(365));
        assert!(set.is_tombstoned("1"));
        assert_eq!(set.prune(), 0);
    }
}
