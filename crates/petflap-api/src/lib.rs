// petflap-api: Async Rust client for the PetWALK pet-door local API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::DoorClient;
pub use error::Error;
pub use models::{InfoDto, PassageDto, PetDto};
pub use transport::TransportConfig;
