// src/error.rs

use mira_lib::error::MiraError;
use mira_lib::identity::MacAddress;
use thiserror::Error;
use uuid::Uuid;

/// The primary error type for the `mira-rs` crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No Bluetooth adapter found")]
    NoAdapter,

    #[error("Shower {0} not found. Is it powered on and in range?")]
    DeviceNotFound(MacAddress),

    #[error("Characteristic {0} not found on the shower")]
    CharacteristicNotFound(Uuid),

    #[error("Bluetooth error: {0}")]
    Ble(#[from] btleplug::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] MiraError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),
}
