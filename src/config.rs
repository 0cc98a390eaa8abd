//! Persisted per-installation settings.
//!
//! ```json
//! {
//!   "device_id": 2,
//!   "client_id": 32683,
//!   "mac_address": "FD:93:5A:A8:EC:93",
//!   "write_characteristic": "bccb0002-ca66-11e5-88a4-0002a5d5c51b",
//!   "notify_characteristic": "bccb0003-ca66-11e5-88a4-0002a5d5c51b"
//! }
//! ```
//!
//! The characteristic UUIDs may be omitted.

use crate::device::{NOTIFY_CHARACTERISTIC, WRITE_CHARACTERISTIC};
use crate::error::Error;
use mira_lib::identity::DeviceIdentity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowerConfig {
    #[serde(flatten)]
    pub identity: DeviceIdentity,
    #[serde(default = "default_write_characteristic")]
    pub write_characteristic: Uuid,
    #[serde(default = "default_notify_characteristic")]
    pub notify_characteristic: Uuid,
}

fn default_write_characteristic() -> Uuid {
    WRITE_CHARACTERISTIC
}

fn default_notify_characteristic() -> Uuid {
    NOTIFY_CHARACTERISTIC
}

impl ShowerConfig {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            write_characteristic: WRITE_CHARACTERISTIC,
            notify_characteristic: NOTIFY_CHARACTERISTIC,
        }
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        debug!(?path, mac = %config.identity.mac_address, "Loaded configuration");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut contents = serde_json::to_string_pretty(self)?;
        contents.push('\n');
        fs::write(path, contents)?;
        info!(?path, "Configuration written");
        Ok(())
    }
}
