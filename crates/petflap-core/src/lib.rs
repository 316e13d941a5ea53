//! Coordination layer between `petflap-api` and consumers.
//!
//! This crate owns the business logic and the eventually-consistent
//! cached view of one PetWALK door:
//!
//! - **[`Coordinator`]** — Central facade managing the full lifecycle:
//!   [`start()`](Coordinator::start) resolves the device identity and pet
//!   roster, primes an initial snapshot, then spawns background tasks for
//!   the two-cadence refresh loop and write processing.
//!
//! - **[`SnapshotStore`]** — Single source of truth: the merged
//!   [`Snapshot`] of both data planes behind a `tokio::sync::watch` cell.
//!   Scheduled merges and optimistic writes are serialized through it.
//!
//! - **[`SnapshotStream`]** — Subscription handle vended by the store.
//!   Exposes `current()` / `latest()` / `changed()` for reactive
//!   consumers; synchronous callbacks go through
//!   [`Coordinator::subscribe`] with per-subscriber fault isolation.
//!
//! - **Write reconciliation** — [`Coordinator::submit_write`] routes
//!   writes through an `mpsc` channel to a single processor; acknowledged
//!   writes are applied optimistically, failed writes drop the key's
//!   availability and never touch cached data.
//!
//! - **Domain model** ([`model`]) — Typed identity, pets, passage events,
//!   and state-key constants; species and direction resolve to enums once
//!   at conversion.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

mod command;
mod convert;
mod subscriber;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::DeviceClient;
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, CoordinatorState};
pub use error::CoreError;
pub use store::{Availability, Snapshot, SnapshotStore};
pub use stream::SnapshotStream;
pub use subscriber::SubscriptionHandle;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DeviceIdentity, Direction, PassageEvent, Pet, PetId, PetStatusMap, Presence, Species,
    StateMap, keys,
};
