use std::collections::HashMap;

use super::event::PassageEvent;
use super::pet::PetId;

/// Complete binary state map of the door, as of the last fetch.
pub type StateMap = HashMap<String, bool>;

/// Latest passage event per pet, as of the last pet-status fetch.
pub type PetStatusMap = HashMap<PetId, PassageEvent>;

/// Well-known state keys the door reports. The map is open-ended --
/// firmware updates add keys -- so these are conveniences, not a schema.
pub mod keys {
    pub const DOOR: &str = "door";
    pub const SYSTEM: &str = "system";
    pub const RFID: &str = "rfid";
    pub const MOTION_IN: &str = "motion_in";
    pub const MOTION_OUT: &str = "motion_out";
    pub const BRIGHTNESS_SENSOR: &str = "brightness_sensor";
    pub const TIME: &str = "time";
}
