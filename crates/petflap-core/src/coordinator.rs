// ── Coordinator ──
//
// Full lifecycle management for one door: identity resolution, the
// two-cadence refresh loop, write reconciliation, and snapshot fan-out.
//
// The slow (pet status) cycle is nested inside the fast cycle instead of
// running on its own timer, so both share a single in-flight guard and
// one failure-handling path. A failed slow fetch does not advance the
// gate -- the next fast tick retries it immediately.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::Utc;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::DeviceClient;
use crate::command::{CommandEnvelope, WriteCommand};
use crate::config::CoordinatorConfig;
use crate::error::CoreError;
use crate::model::{DeviceIdentity, Pet, PetId, Presence};
use crate::store::{Snapshot, SnapshotStore};
use crate::stream::SnapshotStream;
use crate::subscriber::SubscriptionHandle;

const COMMAND_CHANNEL_SIZE: usize = 32;

// ── CoordinatorState ─────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Starting,
    Running,
    Stopped,
}

// ── Coordinator ──────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. [`start()`](Self::start)
/// resolves the device identity, primes the snapshot, and spawns the
/// refresh and command-processor tasks; [`stop()`](Self::stop) winds
/// them down, letting any in-flight call finish or time out.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    client: Arc<dyn DeviceClient>,
    store: Arc<SnapshotStore>,
    state: watch::Sender<CoordinatorState>,
    /// Keeps the lifecycle channel open so `state.send()` always applies
    /// the new value -- `watch::Sender::send` is a no-op when no receiver
    /// is alive, and external watchers are not guaranteed to exist.
    _state_keepalive: watch::Receiver<CoordinatorState>,
    /// Resolved once in `start()`; immutable afterwards.
    identity: ArcSwapOption<DeviceIdentity>,
    /// Pet roster fetched alongside the identity.
    pets: ArcSwapOption<Vec<Pet>>,
    /// Held for the duration of a refresh cycle. A failed `try_lock`
    /// means a cycle is still in flight and the tick is skipped, so at
    /// most one refresh ever hits the door at a time.
    refresh_gate: Mutex<()>,
    /// Slow-cycle gate on the tokio clock. `None` until the first
    /// successful pet-status fetch; only advanced on success.
    last_slow_success: std::sync::Mutex<Option<Instant>>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current run -- cancelled on stop, replaced
    /// on the next start (avoids permanent cancellation).
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a new coordinator. Does NOT contact the door -- call
    /// [`start()`](Self::start) to resolve the identity and begin polling.
    pub fn new(client: Arc<dyn DeviceClient>, config: CoordinatorConfig) -> Self {
        let store = Arc::new(SnapshotStore::new());
        let (state, state_keepalive) = watch::channel(CoordinatorState::Idle);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                client,
                store,
                state,
                _state_keepalive: state_keepalive,
                identity: ArcSwapOption::empty(),
                pets: ArcSwapOption::empty(),
                refresh_gate: Mutex::new(()),
                last_slow_success: std::sync::Mutex::new(None),
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the coordinator configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Access the underlying snapshot store.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.inner.store
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Current merged snapshot (non-blocking clone).
    pub fn snapshot(&self) -> Snapshot {
        self.inner.store.snapshot()
    }

    /// The device identity, once resolved by `start()`.
    pub fn identity(&self) -> Option<Arc<DeviceIdentity>> {
        self.inner.identity.load_full()
    }

    /// The pet roster fetched at startup.
    pub fn pets(&self) -> Vec<Pet> {
        self.inner
            .pets
            .load_full()
            .map(|pets| (*pets).clone())
            .unwrap_or_default()
    }

    /// Convenience read of a single fast-plane key.
    pub fn state(&self, key: &str) -> Option<bool> {
        self.inner.store.snapshot().state(key)
    }

    /// Presence of a pet derived from its latest passage.
    pub fn presence(&self, pet: &PetId) -> Option<Presence> {
        self.inner.store.snapshot().presence(pet)
    }

    /// Current lifecycle state.
    pub fn run_state(&self) -> CoordinatorState {
        *self.inner.state.borrow()
    }

    /// Observe lifecycle transitions.
    pub fn run_state_watch(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.state.subscribe()
    }

    // ── Subscriptions ────────────────────────────────────────────

    /// Register a synchronous callback fired after every snapshot
    /// mutation. Keep the handle alive for as long as the subscription
    /// should last.
    pub fn subscribe(
        &self,
        handler: impl Fn(&Snapshot) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        self.inner.store.subscribe(handler)
    }

    /// Reactive subscription for async consumers.
    pub fn subscribe_stream(&self) -> SnapshotStream {
        self.inner.store.subscribe_stream()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start the coordinator.
    ///
    /// Resolves the device identity and pet roster (both fatal on
    /// failure -- the owning lifecycle decides when to try again, we
    /// never retry startup internally), primes the snapshot with one
    /// refresh cycle, then spawns the background tasks.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.run_state() == CoordinatorState::Running {
            return Ok(());
        }
        if self.inner.config.fast_interval.is_zero() {
            return Err(CoreError::Config {
                message: "fast_interval must be non-zero".into(),
            });
        }
        let _ = self.inner.state.send(CoordinatorState::Starting);

        // Fresh child token for this run (supports restart after stop).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let identity = match self.bounded(self.inner.client.resolve_identity()).await {
            Ok(identity) => identity,
            Err(e) => return self.fail_start(e),
        };
        info!(device = %identity.name, id = identity.device_id, "resolved device identity");
        self.inner.identity.store(Some(Arc::new(identity)));

        let include_all = self.inner.config.include_all_events;
        let pets = match self.bounded(self.inner.client.available_pets(include_all)).await {
            Ok(pets) => pets,
            Err(e) => return self.fail_start(e),
        };
        debug!(count = pets.len(), "fetched pet roster");
        self.inner.pets.store(Some(Arc::new(pets)));

        // Prime the snapshot so subscribers have data immediately.
        if let Err(e) = self.refresh_cycle().await {
            return self.fail_start(e);
        }

        // Spawn background tasks.
        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let coordinator = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(command_processor_task(coordinator, rx, cancel)));
        }

        {
            let coordinator = self.clone();
            let cancel = child.clone();
            let period = self.inner.config.fast_interval;
            handles.push(tokio::spawn(refresh_task(coordinator, period, cancel)));
        }
        drop(handles);

        let _ = self.inner.state.send(CoordinatorState::Running);
        info!("coordinator running");
        Ok(())
    }

    /// Stop the coordinator.
    ///
    /// Cancels the background tasks and waits for them: an in-flight
    /// call completes or times out, nothing is aborted mid-merge. The
    /// coordinator can be started again afterwards.
    pub async fn stop(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        // Recreate the command channel so a later start() gets a fresh
        // receiver -- the previous one was consumed by the processor.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        let _ = self.inner.state.send(CoordinatorState::Stopped);
        debug!("coordinator stopped");
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Submit a state write.
    ///
    /// On acknowledgment the value is applied to the snapshot
    /// immediately -- the door settles slowly, and waiting for the next
    /// poll would make every toggle feel unresponsive. The next
    /// scheduled refresh may still override the value if the door had
    /// not internalized it yet. On failure the key flips unavailable
    /// and the previous snapshot value is retained.
    pub async fn submit_write(
        &self,
        key: impl Into<String>,
        value: bool,
    ) -> Result<(), CoreError> {
        if self.run_state() != CoordinatorState::Running {
            return Err(CoreError::NotRunning);
        }

        let (response_tx, response_rx) = oneshot::channel();
        let envelope = CommandEnvelope {
            command: WriteCommand {
                key: key.into(),
                value,
            },
            response_tx,
        };

        let tx = self.inner.command_tx.lock().await.clone();
        tx.send(envelope)
            .await
            .map_err(|_| CoreError::Internal("command channel closed".into()))?;
        response_rx
            .await
            .map_err(|_| CoreError::Internal("command processor dropped the request".into()))?
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Run one refresh cycle outside the schedule. Shares the in-flight
    /// guard with the scheduled cycle; a no-op if one is already running.
    pub async fn refresh_now(&self) -> Result<(), CoreError> {
        self.refresh_cycle().await
    }

    /// One full refresh cycle: fast plane, then -- once the fast fetch
    /// has settled -- the gated slow plane.
    async fn refresh_cycle(&self) -> Result<(), CoreError> {
        let Ok(_gate) = self.inner.refresh_gate.try_lock() else {
            debug!("refresh still in flight, skipping");
            return Ok(());
        };

        let timeout = self.inner.config.call_timeout;
        let store = &self.inner.store;

        debug!("fetching state map");
        match tokio::time::timeout(timeout, self.inner.client.fetch_states()).await {
            Ok(Ok(states)) => store.apply_fast(states),
            Ok(Err(e)) => {
                store.fail_fast();
                warn!(error = %e, "state fetch failed");
                return Err(e.into());
            }
            Err(_) => {
                store.fail_fast();
                warn!(timeout_secs = timeout.as_secs(), "state fetch timed out");
                return Err(CoreError::Timeout {
                    timeout_secs: timeout.as_secs(),
                });
            }
        }

        if self.inner.config.include_all_events && self.slow_plane_due() {
            let Some(identity) = self.inner.identity.load_full() else {
                return Err(CoreError::Internal("refresh before identity resolution".into()));
            };

            debug!(device_id = identity.device_id, "fetching pet status");
            match tokio::time::timeout(
                timeout,
                self.inner.client.fetch_pet_status(identity.device_id),
            )
            .await
            {
                Ok(Ok(status)) => {
                    store.apply_slow(status, Utc::now());
                    *self
                        .inner
                        .last_slow_success
                        .lock()
                        .expect("slow gate lock poisoned") = Some(Instant::now());
                }
                Ok(Err(e)) => {
                    // Keep the previous pet data and leave the gate where
                    // it is: the next fast tick retries immediately.
                    store.fail_slow();
                    warn!(error = %e, "pet status fetch failed");
                    return Err(e.into());
                }
                Err(_) => {
                    store.fail_slow();
                    warn!(timeout_secs = timeout.as_secs(), "pet status fetch timed out");
                    return Err(CoreError::Timeout {
                        timeout_secs: timeout.as_secs(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Whether the slow plane is due: never fetched successfully, or the
    /// configured interval has elapsed since the last success.
    fn slow_plane_due(&self) -> bool {
        let guard = self
            .inner
            .last_slow_success
            .lock()
            .expect("slow gate lock poisoned");
        match *guard {
            None => true,
            Some(at) => at.elapsed() >= self.inner.config.slow_interval,
        }
    }

    /// Execute one write: remote call first, optimistic apply only on
    /// acknowledgment.
    async fn execute_write(&self, command: WriteCommand) -> Result<(), CoreError> {
        let timeout = self.inner.config.call_timeout;
        let WriteCommand { key, value } = command;

        match tokio::time::timeout(timeout, self.inner.client.write_state(&key, value)).await {
            Ok(Ok(())) => {
                self.inner.store.apply_optimistic(&key, value);
                debug!(key = %key, value, "write applied optimistically");
                Ok(())
            }
            Ok(Err(e)) => {
                self.inner.store.fail_write(&key);
                warn!(key = %key, error = %e, "write failed");
                Err(e.into())
            }
            Err(_) => {
                self.inner.store.fail_write(&key);
                warn!(key = %key, timeout_secs = timeout.as_secs(), "write timed out");
                Err(CoreError::Timeout {
                    timeout_secs: timeout.as_secs(),
                })
            }
        }
    }

    // ── Private helpers ──────────────────────────────────────────

    /// Bound a startup call with the configured timeout.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, petflap_api::Error>> + Send,
    ) -> Result<T, CoreError> {
        let timeout = self.inner.config.call_timeout;
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result.map_err(CoreError::from),
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    fn fail_start<T>(&self, err: CoreError) -> Result<T, CoreError> {
        let _ = self.inner.state.send(CoordinatorState::Idle);
        Err(err)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Drive the fast cycle at a fixed cadence until cancelled. Missed
/// ticks are skipped, never bursted -- a slow door must not earn itself
/// a request storm.
async fn refresh_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = coordinator.refresh_cycle().await {
                    warn!(error = %e, "scheduled refresh failed");
                }
            }
        }
    }
}

/// Process write commands from the mpsc channel, one at a time.
async fn command_processor_task(
    coordinator: Coordinator,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = coordinator.execute_write(envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}
