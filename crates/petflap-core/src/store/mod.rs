// ── Central snapshot store ──
//
// Owns the merged Snapshot behind a single watch cell. All mutation --
// scheduled merges and optimistic writes alike -- funnels through
// `send_modify`, which serializes writers and wakes watch subscribers.
// Callback subscribers are notified synchronously after every mutation.

mod snapshot;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{PetStatusMap, StateMap};
use crate::stream::SnapshotStream;
use crate::subscriber::{SubscriberRegistry, SubscriptionHandle};

pub use snapshot::{Availability, Snapshot};

/// Single source of truth subscribers read from.
pub struct SnapshotStore {
    snapshot: watch::Sender<Snapshot>,
    subscribers: SubscriberRegistry,
}

impl SnapshotStore {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        Self {
            snapshot,
            subscribers: SubscriberRegistry::default(),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current snapshot (clone, non-blocking).
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn watch(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// Reactive subscription handle for async consumers.
    pub fn subscribe_stream(&self) -> SnapshotStream {
        SnapshotStream::new(self.watch())
    }

    /// Register a synchronous callback, invoked after every snapshot
    /// mutation. The subscription lives as long as the returned handle.
    pub fn subscribe(
        &self,
        handler: impl Fn(&Snapshot) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        self.subscribers.subscribe(handler)
    }

    // ── Scheduled merges ─────────────────────────────────────────────

    /// Apply a successful fast-plane fetch: wholesale replacement, never
    /// a per-key union. Keys missing from `states` disappear.
    pub(crate) fn apply_fast(&self, states: StateMap) {
        self.snapshot.send_modify(|snap| {
            snap.availability.fast_fetch_succeeded(states.keys());
            snap.fast = states;
        });
        self.notify();
    }

    /// Record a failed fast-plane fetch. Data is retained; every known
    /// fast key flips unavailable.
    pub(crate) fn fail_fast(&self) {
        self.snapshot.send_modify(|snap| {
            snap.availability.fast_fetch_failed();
        });
        self.notify();
    }

    /// Apply a successful slow-plane fetch: wholesale replacement plus
    /// timestamp advance.
    pub(crate) fn apply_slow(&self, status: PetStatusMap, fetched_at: DateTime<Utc>) {
        self.snapshot.send_modify(|snap| {
            snap.slow = status;
            snap.last_slow_refresh = Some(fetched_at);
            snap.availability.slow_fetch_result(true);
        });
        self.notify();
    }

    /// Record a failed slow-plane fetch. The previous map and timestamp
    /// stay untouched -- stale but valid.
    pub(crate) fn fail_slow(&self) {
        self.snapshot.send_modify(|snap| {
            snap.availability.slow_fetch_result(false);
        });
        self.notify();
    }

    // ── Optimistic writes ────────────────────────────────────────────

    /// Overwrite a single fast-plane key after an acknowledged write.
    pub(crate) fn apply_optimistic(&self, key: &str, value: bool) {
        self.snapshot.send_modify(|snap| {
            snap.fast.insert(key.to_owned(), value);
            snap.availability.write_result(key, true);
        });
        self.notify();
    }

    /// Record a failed write: the previous value stays, the key flips
    /// unavailable.
    pub(crate) fn fail_write(&self, key: &str) {
        self.snapshot.send_modify(|snap| {
            snap.availability.write_result(key, false);
        });
        self.notify();
    }

    fn notify(&self) {
        let snapshot = self.snapshot.borrow().clone();
        self.subscribers.notify_all(&snapshot);
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Direction, PassageEvent, PetId};

    fn states(pairs: &[(&str, bool)]) -> StateMap {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
    }

    #[test]
    fn fast_merge_is_full_replacement() {
        let store = SnapshotStore::new();
        store.apply_fast(states(&[("door", false), ("rfid", true)]));
        store.apply_fast(states(&[("door", true)]));

        let snap = store.snapshot();
        assert_eq!(snap.fast, states(&[("door", true)]));
        // The dropped key takes its availability flag with it.
        assert!(!snap.availability.is_available("rfid"));
        assert!(snap.availability.is_available("door"));
    }

    #[test]
    fn fast_merge_is_idempotent() {
        let store = SnapshotStore::new();
        let map = states(&[("door", false), ("rfid", true)]);
        store.apply_fast(map.clone());
        let first = store.snapshot();
        store.apply_fast(map);
        assert_eq!(store.snapshot(), first);
    }

    #[test]
    fn failed_fast_fetch_keeps_data_and_taints_keys() {
        let store = SnapshotStore::new();
        store.apply_fast(states(&[("door", true)]));
        store.fail_fast();

        let snap = store.snapshot();
        assert_eq!(snap.state("door"), Some(true));
        assert!(!snap.availability.is_available("door"));
    }

    #[test]
    fn failed_slow_fetch_keeps_map_and_timestamp() {
        let store = SnapshotStore::new();
        let when = Utc::now();
        let mut status: HashMap<PetId, PassageEvent> = HashMap::new();
        status.insert(
            PetId::from("p1"),
            PassageEvent {
                direction: Direction::In,
                timestamp: when,
            },
        );
        store.apply_slow(status.clone(), when);
        store.fail_slow();

        let snap = store.snapshot();
        assert_eq!(snap.slow, status);
        assert_eq!(snap.last_slow_refresh, Some(when));
        assert!(!snap.availability.slow_plane());
    }

    #[test]
    fn optimistic_write_overwrites_single_key() {
        let store = SnapshotStore::new();
        store.apply_fast(states(&[("door", false), ("rfid", true)]));
        store.apply_optimistic("door", true);

        let snap = store.snapshot();
        assert_eq!(snap.state("door"), Some(true));
        assert_eq!(snap.state("rfid"), Some(true));
        assert!(snap.availability.is_available("door"));
    }

    #[test]
    fn failed_write_preserves_previous_value() {
        let store = SnapshotStore::new();
        store.apply_fast(states(&[("door", false)]));
        store.fail_write("door");

        let snap = store.snapshot();
        assert_eq!(snap.state("door"), Some(false));
        assert!(!snap.availability.is_available("door"));
    }

    #[test]
    fn availability_defaults_to_unavailable() {
        let snap = SnapshotStore::new().snapshot();
        assert!(!snap.availability.is_available("door"));
        assert!(!snap.availability.slow_plane());
        assert!(snap.last_slow_refresh.is_none());
    }

    #[test]
    fn callback_fires_on_every_mutation() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let store = SnapshotStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let _handle = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        store.apply_fast(states(&[("door", true)]));
        store.fail_fast();
        store.apply_optimistic("door", false);

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
