//! Per-installation identifiers needed to talk to a shower.
//!
//! None of these can be derived from one another: the device id is fixed per
//! shower unit, the client id belongs to the phone that was paired with it and
//! is only ever learned through key recovery, and the MAC address is what the
//! BLE stack connects to.

use crate::error::MiraError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 16-bit secret mixed into every command checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u16);

impl ClientId {
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    /// The bytes appended to the checksum input.
    ///
    /// The firmware consumes the key as a 32-bit big-endian word, so the two
    /// high bytes are always zero.
    pub fn checksum_bytes(&self) -> [u8; 4] {
        u32::from(self.0).to_be_bytes()
    }
}

impl From<u16> for ClientId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04x})", self.0, self.0)
    }
}

impl FromStr for ClientId {
    type Err = MiraError;

    /// Accepts decimal (`32683`) or hex with a `0x` prefix (`0x7fab`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex_digits) => u16::from_str_radix(hex_digits, 16),
            None => s.parse::<u16>(),
        };
        parsed
            .map(ClientId)
            .map_err(|e| MiraError::InvalidIdentity(format!("client id {s:?}: {e}")))
    }
}

/// BLE peripheral address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl FromStr for MacAddress {
    type Err = MiraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MiraError::InvalidIdentity(format!("MAC address {s:?}, expected AA:BB:CC:DD:EE:FF"));

        let mut octets = [0u8; 6];
        let mut parts = s.trim().split([':', '-']);
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(octets))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Everything needed to address one shower from one paired controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub device_id: u8,
    pub client_id: ClientId,
    pub mac_address: MacAddress,
}

impl DeviceIdentity {
    pub fn new(device_id: u8, client_id: ClientId, mac_address: MacAddress) -> Self {
        Self {
            device_id,
            client_id,
            mac_address,
        }
    }
}
