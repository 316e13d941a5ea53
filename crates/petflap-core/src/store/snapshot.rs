use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{PassageEvent, PetId, PetStatusMap, Presence, StateMap};

/// The complete merged cache of door state at a point in time.
///
/// Both planes live in one owned value so a fast-plane refresh can never
/// discard pet data and vice versa. Cheap to clone; handed out by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Binary device states, wholly replaced on every successful fetch.
    pub fast: StateMap,
    /// Latest passage per pet. Retained verbatim between slow-cycle
    /// refreshes -- readers see the last fetched value, never a hole.
    pub slow: PetStatusMap,
    /// When the slow plane last refreshed successfully.
    pub last_slow_refresh: Option<DateTime<Utc>>,
    pub availability: Availability,
}

impl Snapshot {
    /// Current value of a fast-plane key, if it has ever been observed.
    pub fn state(&self, key: &str) -> Option<bool> {
        self.fast.get(key).copied()
    }

    /// Latest passage event for a pet, if any has been fetched.
    pub fn passage(&self, pet: &PetId) -> Option<&PassageEvent> {
        self.slow.get(pet)
    }

    /// Presence derived from the pet's latest passage direction.
    pub fn presence(&self, pet: &PetId) -> Option<Presence> {
        self.slow.get(pet).map(|event| event.direction.into())
    }
}

/// Advisory per-key availability metadata.
///
/// A key is available once the last operation touching its plane (or the
/// key itself, for writes) succeeded. Everything defaults to unavailable
/// until the first successful fetch. Never blocks scheduling -- purely
/// informational for consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Availability {
    fast: HashMap<String, bool>,
    slow_plane: bool,
}

impl Availability {
    /// Whether the given fast-plane key is currently trustworthy.
    pub fn is_available(&self, key: &str) -> bool {
        self.fast.get(key).copied().unwrap_or(false)
    }

    /// Whether the slow plane (pet status) is currently trustworthy.
    pub fn slow_plane(&self) -> bool {
        self.slow_plane
    }

    /// A successful fast fetch makes exactly the fetched keys available;
    /// keys absent from the new map drop out entirely.
    pub(crate) fn fast_fetch_succeeded<'a>(&mut self, keys: impl Iterator<Item = &'a String>) {
        self.fast = keys.map(|k| (k.clone(), true)).collect();
    }

    /// A failed fast fetch taints every currently-known key.
    pub(crate) fn fast_fetch_failed(&mut self) {
        for flag in self.fast.values_mut() {
            *flag = false;
        }
    }

    pub(crate) fn write_result(&mut self, key: &str, ok: bool) {
        self.fast.insert(key.to_owned(), ok);
    }

    pub(crate) fn slow_fetch_result(&mut self, ok: bool) {
        self.slow_plane = ok;
    }
}
