//! BLE access to Mira showers via btleplug.

use crate::config::ShowerConfig;
use crate::error::Error;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, ValueNotification, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use bytes::Bytes;
use futures_lite::{Stream, StreamExt};
use mira_lib::constants::{DEVICE_LABEL_PREFIX, DEVICE_NAME_PREFIX};
use mira_lib::identity::MacAddress;
use mira_lib::transport::Transport;
use serde::Serialize;
use std::fmt;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Commands are written here
pub const WRITE_CHARACTERISTIC: Uuid = Uuid::from_u128(0xbccb0002_ca66_11e5_88a4_0002a5d5c51b);
/// Status notifications arrive here
pub const NOTIFY_CHARACTERISTIC: Uuid = Uuid::from_u128(0xbccb0003_ca66_11e5_88a4_0002a5d5c51b);

// Device Information Service
const MODEL_NUMBER: Uuid = Uuid::from_u128(0x00002a24_0000_1000_8000_00805f9b34fb);
const SERIAL_NUMBER: Uuid = Uuid::from_u128(0x00002a25_0000_1000_8000_00805f9b34fb);
const FIRMWARE_REVISION: Uuid = Uuid::from_u128(0x00002a26_0000_1000_8000_00805f9b34fb);
const HARDWARE_REVISION: Uuid = Uuid::from_u128(0x00002a27_0000_1000_8000_00805f9b34fb);
const MANUFACTURER_NAME: Uuid = Uuid::from_u128(0x00002a29_0000_1000_8000_00805f9b34fb);

const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(250);

type NotificationStream = Pin<Box<dyn Stream<Item = ValueNotification> + Send>>;

/// A shower seen while scanning.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredShower {
    pub name: String,
    pub address: MacAddress,
    pub rssi: Option<i16>,
}

/// Device Information Service strings; absent characteristics stay `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceInfo {
    pub model_number: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_revision: Option<String>,
    pub hardware_revision: Option<String>,
    pub manufacturer_name: Option<String>,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            ("Manufacturer", &self.manufacturer_name),
            ("Model", &self.model_number),
            ("Serial number", &self.serial_number),
            ("Firmware", &self.firmware_revision),
            ("Hardware", &self.hardware_revision),
        ];
        for (label, value) in fields {
            writeln!(f, "{label:<14} {}", value.as_deref().unwrap_or("<Not available>"))?;
        }
        Ok(())
    }
}

/// User-facing name with the model label stripped.
pub fn display_name(local_name: &str) -> &str {
    local_name.strip_prefix(DEVICE_LABEL_PREFIX).unwrap_or(local_name)
}

async fn get_adapter() -> Result<Adapter, Error> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(Error::NoAdapter)
}

/// Lists nearby showers.
pub async fn scan(duration: Duration) -> Result<Vec<DiscoveredShower>, Error> {
    let adapter = get_adapter().await?;

    info!(?duration, "Scanning for showers...");
    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(duration).await;

    let mut showers = Vec::new();
    for peripheral in adapter.peripherals().await? {
        let Some(props) = peripheral.properties().await? else {
            continue;
        };
        let Some(name) = props.local_name else {
            continue;
        };
        if !name.starts_with(DEVICE_NAME_PREFIX) {
            continue;
        }
        showers.push(DiscoveredShower {
            name: display_name(&name).to_string(),
            address: MacAddress(peripheral.address().into_inner()),
            rssi: props.rssi,
        });
    }

    adapter.stop_scan().await?;
    info!(found = showers.len(), "Scan finished");
    Ok(showers)
}

async fn find_peripheral(adapter: &Adapter, address: MacAddress, scan_timeout: Duration) -> Result<Peripheral, Error> {
    let start = Instant::now();
    while start.elapsed() < scan_timeout {
        for peripheral in adapter.peripherals().await? {
            if peripheral.address().into_inner() == address.octets() {
                return Ok(peripheral);
            }
        }
        tokio::time::sleep(SCAN_POLL_INTERVAL).await;
    }
    Err(Error::DeviceNotFound(address))
}

fn find_characteristic(peripheral: &Peripheral, uuid: Uuid) -> Result<Characteristic, Error> {
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == uuid)
        .ok_or(Error::CharacteristicNotFound(uuid))
}

/// A connected shower, subscribed to its status notifications.
pub struct BleTransport {
    peripheral: Peripheral,
    write_char: Characteristic,
    notify_char: Characteristic,
    notifications: NotificationStream,
}

impl BleTransport {
    /// Finds the configured shower by MAC address and connects to it.
    pub async fn connect(config: &ShowerConfig, scan_timeout: Duration) -> Result<Self, Error> {
        let address = config.identity.mac_address;
        let adapter = get_adapter().await?;

        info!(%address, "Searching for shower...");
        adapter.start_scan(ScanFilter::default()).await?;
        let found = find_peripheral(&adapter, address, scan_timeout).await;
        adapter.stop_scan().await?;
        let peripheral = found?;

        peripheral.connect().await?;
        info!(%address, "Connected");

        match Self::setup(peripheral.clone(), config).await {
            Ok(transport) => Ok(transport),
            Err(err) => {
                if let Err(disconnect_err) = peripheral.disconnect().await {
                    warn!(err = %disconnect_err, "Failed to disconnect after setup error");
                }
                Err(err)
            }
        }
    }

    async fn setup(peripheral: Peripheral, config: &ShowerConfig) -> Result<Self, Error> {
        peripheral.discover_services().await?;

        let write_char = find_characteristic(&peripheral, config.write_characteristic)?;
        let notify_char = find_characteristic(&peripheral, config.notify_characteristic)?;

        peripheral.subscribe(&notify_char).await?;
        let notifications = peripheral.notifications().await?;
        debug!(notify = %notify_char.uuid, "Subscribed to notifications");

        Ok(Self {
            peripheral,
            write_char,
            notify_char,
            notifications,
        })
    }

    /// Reads the standard Device Information Service strings.
    pub async fn read_device_info(&self) -> Result<DeviceInfo, Error> {
        Ok(DeviceInfo {
            model_number: self.read_string(MODEL_NUMBER).await?,
            serial_number: self.read_string(SERIAL_NUMBER).await?,
            firmware_revision: self.read_string(FIRMWARE_REVISION).await?,
            hardware_revision: self.read_string(HARDWARE_REVISION).await?,
            manufacturer_name: self.read_string(MANUFACTURER_NAME).await?,
        })
    }

    async fn read_string(&self, uuid: Uuid) -> Result<Option<String>, Error> {
        let characteristic = match find_characteristic(&self.peripheral, uuid) {
            Ok(characteristic) => characteristic,
            Err(Error::CharacteristicNotFound(_)) => {
                debug!(%uuid, "Characteristic not present");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let value = self.peripheral.read(&characteristic).await?;
        let text = String::from_utf8_lossy(&value).trim_end_matches('\0').trim().to_string();
        Ok(Some(text))
    }

    /// Unsubscribes and disconnects. Failures are logged, not returned.
    pub async fn disconnect(self) {
        if let Err(err) = self.peripheral.unsubscribe(&self.notify_char).await {
            warn!(%err, "Failed to unsubscribe from notifications");
        }
        if let Err(err) = self.peripheral.disconnect().await {
            warn!(%err, "Failed to disconnect from shower");
        } else {
            info!("Disconnected");
        }
    }
}

impl Transport for BleTransport {
    type Error = btleplug::Error;

    async fn write(&mut self, packet: &[u8]) -> Result<(), btleplug::Error> {
        self.peripheral
            .write(&self.write_char, packet, WriteType::WithResponse)
            .await
    }

    async fn next_notification(&mut self) -> Result<Option<Bytes>, btleplug::Error> {
        while let Some(notification) = self.notifications.next().await {
            if notification.uuid == self.notify_char.uuid {
                return Ok(Some(Bytes::from(notification.value)));
            }
            debug!(uuid = %notification.uuid, "Ignoring notification from another characteristic");
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_model_label() {
        assert_eq!(display_name("Mira N86Sd: Ensuite"), "Ensuite");
        assert_eq!(display_name("Mira Mode"), "Mira Mode");
    }

    #[test]
    fn characteristic_uuids() {
        assert_eq!(WRITE_CHARACTERISTIC.to_string(), "bccb0002-ca66-11e5-88a4-0002a5d5c51b");
        assert_eq!(MODEL_NUMBER.to_string(), "00002a24-0000-1000-8000-00805f9b34fb");
    }

    #[test]
    fn device_info_marks_missing_fields() {
        let info = DeviceInfo {
            manufacturer_name: Some("Kohler Mira Ltd".to_string()),
            ..Default::default()
        };
        let text = info.to_string();
        assert!(text.contains("Kohler Mira Ltd"));
        assert!(text.contains("<Not available>"));
    }
}
