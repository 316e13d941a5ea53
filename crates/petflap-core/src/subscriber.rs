// ── Synchronous subscriber fan-out ──
//
// Callback registry for consumers that want every snapshot mutation
// pushed to them. Delivery is unordered and each call is isolated:
// a panicking subscriber never breaks fan-out to the rest.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::store::Snapshot;

type Handler = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Registry of snapshot observers.
#[derive(Clone, Default)]
pub(crate) struct SubscriberRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    handlers: Mutex<Vec<(u64, Handler)>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    /// Register a handler. The subscription lives as long as the handle.
    pub(crate) fn subscribe(
        &self,
        handler: impl Fn(&Snapshot) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .lock()
            .expect("subscriber lock poisoned")
            .push((id, Arc::new(handler)));
        SubscriptionHandle {
            id,
            registry: self.clone(),
        }
    }

    /// Deliver a snapshot to every registered handler.
    ///
    /// The handler list is cloned up front so a handler that re-enters
    /// the registry (subscribe/unsubscribe) cannot deadlock delivery.
    pub(crate) fn notify_all(&self, snapshot: &Snapshot) {
        let handlers: Vec<(u64, Handler)> = self
            .inner
            .handlers
            .lock()
            .expect("subscriber lock poisoned")
            .clone();

        for (id, handler) in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(snapshot))).is_err() {
                warn!(subscriber = id, "subscriber panicked during notification");
            }
        }
    }

    fn remove(&self, id: u64) {
        self.inner
            .handlers
            .lock()
            .expect("subscriber lock poisoned")
            .retain(|(existing, _)| *existing != id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .handlers
            .lock()
            .expect("subscriber lock poisoned")
            .len()
    }
}

/// Keeps one subscription alive; dropping it unregisters the handler.
pub struct SubscriptionHandle {
    id: u64,
    registry: SubscriberRegistry,
}

impl SubscriptionHandle {
    /// Explicitly end the subscription (equivalent to dropping).
    pub fn unsubscribe(self) {}
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
