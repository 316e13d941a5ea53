use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which way a pet passed through the flap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// The latest recorded passage for one pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageEvent {
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
}

/// Presence derived from the latest passage direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum Presence {
    Home,
    Away,
}

impl From<Direction> for Presence {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::In => Self::Home,
            Direction::Out => Self::Away,
        }
    }
}
