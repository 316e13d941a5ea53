// ── Device client seam ──
//
// The coordinator only talks to the door through this trait, so tests
// can substitute a scripted double and alternative transports can slot
// in without touching the scheduling logic.

use async_trait::async_trait;

use petflap_api::DoorClient;

use crate::convert;
use crate::model::{DeviceIdentity, Pet, PetStatusMap, StateMap};

/// Everything the coordinator needs from a door.
///
/// All calls may fail with connectivity, protocol, or timeout errors;
/// the coordinator owns retry and availability policy, implementations
/// must not retry internally.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Fetch the identity descriptor. Called once at startup.
    async fn resolve_identity(&self) -> Result<DeviceIdentity, petflap_api::Error>;

    /// Fetch the pet roster. Called once at startup.
    async fn available_pets(&self, include_all: bool) -> Result<Vec<Pet>, petflap_api::Error>;

    /// Fetch the complete binary state map (fast plane).
    async fn fetch_states(&self) -> Result<StateMap, petflap_api::Error>;

    /// Fetch the latest passage event per pet (slow plane).
    async fn fetch_pet_status(&self, device_id: u64) -> Result<PetStatusMap, petflap_api::Error>;

    /// Write a single state key.
    async fn write_state(&self, key: &str, value: bool) -> Result<(), petflap_api::Error>;
}

#[async_trait]
impl DeviceClient for DoorClient {
    async fn resolve_identity(&self) -> Result<DeviceIdentity, petflap_api::Error> {
        self.device_info().await.map(convert::identity_from_info)
    }

    async fn available_pets(&self, include_all: bool) -> Result<Vec<Pet>, petflap_api::Error> {
        let pets = self.pets(include_all).await?;
        Ok(pets.into_iter().map(convert::pet_from_dto).collect())
    }

    async fn fetch_states(&self) -> Result<StateMap, petflap_api::Error> {
        self.states().await
    }

    async fn fetch_pet_status(&self, device_id: u64) -> Result<PetStatusMap, petflap_api::Error> {
        let raw = self.pet_status(device_id).await?;
        convert::pet_status_from_dtos(raw)
    }

    async fn write_state(&self, key: &str, value: bool) -> Result<(), petflap_api::Error> {
        self.set_state(key, value).await
    }
}
