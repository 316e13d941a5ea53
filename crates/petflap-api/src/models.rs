// Wire DTOs for the door's local API.
//
// These stay wire-shaped: string directions, optional fields as the
// device sends them. petflap-core converts them into domain types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device identity as reported by `GET /api/v1/info`.
#[derive(Debug, Clone, Deserialize)]
pub struct InfoDto {
    pub name: String,
    pub id: u64,
    pub sw_version: String,
    pub serial: String,
}

/// Envelope for `GET /api/v1/states`.
#[derive(Debug, Deserialize)]
pub(crate) struct StatesEnvelope {
    pub states: HashMap<String, bool>,
}

/// A pet known to the door, from `GET /api/v1/pets`.
///
/// `species` is free-form on the wire ("cat", "dog", occasionally empty) --
/// core resolves it into an enum once.
#[derive(Debug, Clone, Deserialize)]
pub struct PetDto {
    pub id: String,
    pub name: Option<String>,
    pub species: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PetsEnvelope {
    pub pets: Vec<PetDto>,
}

/// Latest passage for one pet, from `GET /api/v1/devices/{id}/pet-status`.
#[derive(Debug, Clone, Deserialize)]
pub struct PassageDto {
    /// Direction string as sent by the device ("in" / "out").
    pub direction: String,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PetStatusEnvelope {
    pub status: HashMap<String, PassageDto>,
}

/// Body for `PUT /api/v1/states/{key}`.
#[derive(Debug, Serialize)]
pub(crate) struct WriteBody {
    pub value: bool,
}

/// The door wraps failures as `{"error":{"code":N,"message":"..."}}`,
/// sometimes with HTTP 200.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: Option<ErrorInner>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorInner {
    pub code: u16,
    pub message: Option<String>,
}
