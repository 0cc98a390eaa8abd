//! Builders for the commands a controller can send.
//!
//! | action family                   | opcode  | payload bytes | layout                                                    |
//! |---------------------------------|---------|---------------|-----------------------------------------------------------|
//! | status request                  | `07 00` | 0             | -                                                         |
//! | outlet, mode, temperature, flow | `87 05` | 5             | `[mode][0x01][temperature][outlet 1 flow][outlet 2 flow]` |
//!
//! Value ranges: mode `0x01` running or `0x03` paused; temperature byte
//! `round(celsius * 10.4 - 268)`, so 25.77..=50.29 °C; flow 0..=100 per
//! outlet, where 100 is fully open and counts as "on".
//!
//! The control command always carries the complete state, so every outlet,
//! mode, temperature or flow change is applied on top of the state the
//! device last reported.

use crate::constants::{CONTROL_FIXED_BYTE, OUTLET_COUNT, OUTLET_FLOW_MAX};
use crate::error::MiraError;
use crate::identity::DeviceIdentity;
use crate::packet::{CommandPacket, Opcode};
use crate::status::{
    DeviceStatus, Mode, TEMPERATURE_MAX_C, TEMPERATURE_MIN_C, temperature_from_byte, temperature_to_byte,
};

/// Everything a control command carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub mode: Mode,
    /// Encoded temperature byte
    pub temperature: u8,
    pub outlet_flow: [u8; OUTLET_COUNT],
}

impl ControlState {
    pub fn temperature_celsius(&self) -> f64 {
        temperature_from_byte(self.temperature)
    }

    /// Control payload bytes, after checking every field.
    pub fn payload(&self) -> Result<[u8; 5], MiraError> {
        for (index, &flow) in self.outlet_flow.iter().enumerate() {
            check_flow(index, flow)?;
        }

        Ok([
            self.mode.into(),
            CONTROL_FIXED_BYTE,
            self.temperature,
            self.outlet_flow[0],
            self.outlet_flow[1],
        ])
    }
}

impl Default for ControlState {
    /// Paused, both outlets closed, at the lowest temperature.
    fn default() -> Self {
        Self {
            mode: Mode::Paused,
            temperature: 0,
            outlet_flow: [0; OUTLET_COUNT],
        }
    }
}

impl From<&DeviceStatus> for ControlState {
    /// Resending an unchanged status reproduces the byte the device reported.
    fn from(status: &DeviceStatus) -> Self {
        Self {
            mode: status.mode,
            temperature: status.temperature_byte(),
            outlet_flow: status.outlet_flow,
        }
    }
}

/// One high-level request, per action family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    SetOutlet { outlet: usize, on: bool },
    SetMode(Mode),
    /// Degrees Celsius
    SetTemperature(f64),
    SetFlow { outlet: usize, percent: u8 },
    RequestStatus,
}

impl Action {
    /// The control state after this action, validated.
    pub fn apply(&self, current: &ControlState) -> Result<ControlState, MiraError> {
        let mut next = *current;
        match *self {
            Action::SetOutlet { outlet, on } => {
                check_outlet(outlet)?;
                next.outlet_flow[outlet] = if on { OUTLET_FLOW_MAX } else { 0 };
            }
            Action::SetMode(mode) => next.mode = mode,
            Action::SetTemperature(celsius) => next.temperature = celsius_to_byte(celsius)?,
            Action::SetFlow { outlet, percent } => {
                check_outlet(outlet)?;
                check_flow(outlet, percent)?;
                next.outlet_flow[outlet] = percent;
            }
            Action::RequestStatus => {}
        }
        Ok(next)
    }

    /// The packet that carries this action out, given the current state.
    pub fn build(&self, identity: &DeviceIdentity, current: &ControlState) -> Result<CommandPacket, MiraError> {
        match self {
            Action::RequestStatus => status_request(identity),
            _ => control_command(identity, &self.apply(current)?),
        }
    }
}

pub fn status_request(identity: &DeviceIdentity) -> Result<CommandPacket, MiraError> {
    CommandPacket::new(identity.device_id, Opcode::RequestStatus, &[], identity.client_id)
}

pub fn control_command(identity: &DeviceIdentity, state: &ControlState) -> Result<CommandPacket, MiraError> {
    CommandPacket::new(identity.device_id, Opcode::Control, &state.payload()?, identity.client_id)
}

pub fn outlet_command(
    identity: &DeviceIdentity,
    current: &ControlState,
    outlet: usize,
    on: bool,
) -> Result<CommandPacket, MiraError> {
    Action::SetOutlet { outlet, on }.build(identity, current)
}

pub fn mode_command(identity: &DeviceIdentity, current: &ControlState, mode: Mode) -> Result<CommandPacket, MiraError> {
    Action::SetMode(mode).build(identity, current)
}

pub fn temperature_command(
    identity: &DeviceIdentity,
    current: &ControlState,
    celsius: f64,
) -> Result<CommandPacket, MiraError> {
    Action::SetTemperature(celsius).build(identity, current)
}

pub fn flow_command(
    identity: &DeviceIdentity,
    current: &ControlState,
    outlet: usize,
    percent: u8,
) -> Result<CommandPacket, MiraError> {
    Action::SetFlow { outlet, percent }.build(identity, current)
}

fn celsius_to_byte(celsius: f64) -> Result<u8, MiraError> {
    if !(TEMPERATURE_MIN_C..=TEMPERATURE_MAX_C).contains(&celsius) {
        return Err(out_of_range("temperature", celsius, TEMPERATURE_MIN_C, TEMPERATURE_MAX_C));
    }
    Ok(temperature_to_byte(celsius))
}

fn check_outlet(outlet: usize) -> Result<(), MiraError> {
    if outlet >= OUTLET_COUNT {
        return Err(out_of_range("outlet", outlet as f64, 0.0, (OUTLET_COUNT - 1) as f64));
    }
    Ok(())
}

fn check_flow(outlet: usize, percent: u8) -> Result<(), MiraError> {
    if percent > OUTLET_FLOW_MAX {
        let parameter = if outlet == 0 { "outlet 1 flow" } else { "outlet 2 flow" };
        return Err(out_of_range(parameter, f64::from(percent), 0.0, f64::from(OUTLET_FLOW_MAX)));
    }
    Ok(())
}

fn out_of_range(parameter: &'static str, value: f64, min: f64, max: f64) -> MiraError {
    MiraError::OutOfRange {
        parameter,
        value,
        min,
        max,
    }
}
