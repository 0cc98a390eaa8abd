//! Status notifications.
//!
//! After a status request the device answers on the notify characteristic
//! with a fixed 14-byte frame:
//!
//! | offset | size | field                                          |
//! |--------|------|------------------------------------------------|
//! | 0      | 1    | device id                                      |
//! | 1      | 1    | command                                        |
//! | 2      | 1    | length                                         |
//! | 3      | 1    | mode                                           |
//! | 4      | 2    | reserved                                       |
//! | 6      | 1    | target temperature, see [`temperature_from_byte`] |
//! | 7      | 2    | reserved                                       |
//! | 9      | 1    | outlet 1 flow, 0..=100                         |
//! | 10     | 1    | outlet 2 flow, 0..=100                         |
//! | 11     | 1    | reserved                                       |
//! | 12     | 2    | checksum                                       |
//!
//! Some units drop the leading device id byte and send 13 bytes. A third,
//! 19-byte notification kind exists that carries no outlet information.

use crate::constants::{
    AUXILIARY_FRAME_SIZE, OUTLET_COUNT, OUTLET_FLOW_MAX, STATUS_FRAME_SIZE, STATUS_FRAME_SIZE_TRUNCATED,
    TEMPERATURE_OFFSET, TEMPERATURE_SCALE,
};
use crate::error::MiraError;
use bytes::Bytes;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;
use std::fmt;
use strum_macros::Display;
use zerocopy::byteorder::big_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Lowest settable temperature in °C, wire byte `0x00`
pub const TEMPERATURE_MIN_C: f64 = TEMPERATURE_OFFSET / TEMPERATURE_SCALE;
/// Highest settable temperature in °C, wire byte `0xff`
pub const TEMPERATURE_MAX_C: f64 = (u8::MAX as f64 + TEMPERATURE_OFFSET) / TEMPERATURE_SCALE;

/// Wire byte to °C, rounded to two decimals.
pub fn temperature_from_byte(byte: u8) -> f64 {
    let celsius = (f64::from(byte) + TEMPERATURE_OFFSET) / TEMPERATURE_SCALE;
    (celsius * 100.0).round() / 100.0
}

/// °C to wire byte, clamped to the byte range. NaN maps to `0x00`.
///
/// Inverts [`temperature_from_byte`] exactly for every byte.
pub fn temperature_to_byte(celsius: f64) -> u8 {
    // `as` saturates, and maps NaN to zero
    (celsius * TEMPERATURE_SCALE - TEMPERATURE_OFFSET).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, TryFromPrimitive, IntoPrimitive)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Mode {
    #[strum(to_string = "running")]
    Running = 0x01,
    #[strum(to_string = "paused")]
    Paused = 0x03,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct StatusFrame {
    pub device_id: u8,
    pub command: u8,
    pub length: u8,
    pub mode: u8,
    pub reserved0: U16,
    pub temperature: u8,
    pub reserved1: U16,
    pub outlet1_flow: u8,
    pub outlet2_flow: u8,
    pub reserved2: u8,
    pub checksum: U16,
}

/// Decoded status snapshot, rebuilt from every notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub device_id: u8,
    pub mode: Mode,
    /// Target temperature in degrees Celsius
    pub temperature: f64,
    /// Flow per outlet, 0 (closed) to 100 (fully open, "on")
    pub outlet_flow: [u8; OUTLET_COUNT],
}

impl DeviceStatus {
    /// Whether outlet `index` is fully open, `None` for an index the device
    /// doesn't have. A partly open outlet reads as off.
    pub fn outlet_on(&self, index: usize) -> Option<bool> {
        self.outlet_flow.get(index).map(|&flow| flow == OUTLET_FLOW_MAX)
    }

    /// Outlet index to on/off.
    pub fn outlet_states(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.outlet_flow
            .iter()
            .enumerate()
            .map(|(index, &flow)| (index, flow == OUTLET_FLOW_MAX))
    }

    /// Highest flow across outlets.
    pub fn flow_rate(&self) -> u8 {
        self.outlet_flow.iter().copied().max().unwrap_or(0)
    }

    /// Temperature as the device encodes it.
    pub fn temperature_byte(&self) -> u8 {
        temperature_to_byte(self.temperature)
    }
}

impl TryFrom<StatusFrame> for DeviceStatus {
    type Error = MiraError;

    fn try_from(frame: StatusFrame) -> Result<Self, Self::Error> {
        let mode = Mode::try_from(frame.mode)
            .map_err(|_| MiraError::MalformedNotification(format!("unknown mode byte 0x{:02x}", frame.mode)))?;

        let outlet_flow = [frame.outlet1_flow, frame.outlet2_flow];
        if let Some((index, flow)) = outlet_flow.iter().enumerate().find(|(_, flow)| **flow > OUTLET_FLOW_MAX) {
            return Err(MiraError::MalformedNotification(format!(
                "outlet {index} flow {flow} exceeds {OUTLET_FLOW_MAX}"
            )));
        }

        Ok(DeviceStatus {
            device_id: frame.device_id,
            mode,
            temperature: temperature_from_byte(frame.temperature),
            outlet_flow,
        })
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |index: usize| match self.outlet_on(index) {
            Some(true) => "on",
            _ => "off",
        };
        write!(
            f,
            "Mode: {}, Temperature: {:.1} °C, Outlet 1: {} ({}%), Outlet 2: {} ({}%)",
            self.mode,
            self.temperature,
            on_off(0),
            self.outlet_flow[0],
            on_off(1),
            self.outlet_flow[1]
        )
    }
}

/// Anything the device may push on the notify characteristic.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Status(DeviceStatus),
    /// Frame kind without outlet information, passed through undecoded
    Auxiliary(Bytes),
}

/// Decodes a status notification.
///
/// Any length other than a full or truncated status frame is rejected, as is
/// a field outside its domain. A status is never partially populated.
pub fn decode_status(raw: &[u8]) -> Result<DeviceStatus, MiraError> {
    let mut buffer = [0u8; STATUS_FRAME_SIZE];
    match raw.len() {
        STATUS_FRAME_SIZE => buffer.copy_from_slice(raw),
        // The device id byte is missing; realign the remaining fields.
        STATUS_FRAME_SIZE_TRUNCATED => buffer[1..].copy_from_slice(raw),
        other => {
            return Err(MiraError::MalformedNotification(format!(
                "{other} bytes, expected {STATUS_FRAME_SIZE} (or {STATUS_FRAME_SIZE_TRUNCATED})"
            )));
        }
    }

    let frame = StatusFrame::read_from_bytes(&buffer[..])
        .map_err(|_| MiraError::MalformedNotification("status frame layout mismatch".to_string()))?;

    DeviceStatus::try_from(frame)
}

/// Classifies and decodes any notification.
pub fn decode_notification(raw: &[u8]) -> Result<Notification, MiraError> {
    if raw.len() == AUXILIARY_FRAME_SIZE {
        return Ok(Notification::Auxiliary(Bytes::copy_from_slice(raw)));
    }
    decode_status(raw).map(Notification::Status)
}
