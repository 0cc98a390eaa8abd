//! Common test utilities and shared imports

// Shared across test files; not every item is used in every file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use hex;
#[allow(unused_imports)]
pub use mira_lib::command::{Action, ControlState};
#[allow(unused_imports)]
pub use mira_lib::error::MiraError;
#[allow(unused_imports)]
pub use mira_lib::identity::{ClientId, DeviceIdentity, MacAddress};
#[allow(unused_imports)]
pub use mira_lib::packet::{CommandPacket, Opcode};
#[allow(unused_imports)]
pub use mira_lib::status::{DeviceStatus, Mode};

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

/// Client id of the installation behind device 1
#[allow(dead_code)]
pub const CLIENT_ID_DEVICE_1: u16 = 24829;

/// Client id of the installation behind device 2
#[allow(dead_code)]
pub const CLIENT_ID_DEVICE_2: u16 = 32683;

/// Captured commands as (checksum-free data, full packet)
#[allow(dead_code)]
pub const CAPTURED_COMMANDS: &[(&str, &str)] = &[
    ("01870503019a0000", "01870503019a0000d528"),
    ("0287050101e00064", "0287050101e00064d85b"),
    ("0287050101e00000", "0287050101e000004881"),
    ("020700", "020700458a"),
];

// Status notifications below are synthetic: laid out by the status frame
// format (mode at byte 3, temperature at byte 6, outlet flows at bytes 9 and
// 10) with arbitrary reserved and checksum bytes.

/// Device 2, running, 40.0 °C (`0x94`), outlet 1 fully open
#[allow(dead_code)]
pub const STATUS_RUNNING_OUTLET_1: &str = "02870a0100019400006400001234";

/// Device 2, running, 45.0 °C (`0xc8`), outlet 1 fully open
#[allow(dead_code)]
pub const STATUS_RUNNING_45C_OUTLET_1: &str = "02870a010001c80000640000beef";

/// Device 2, paused, 45.0 °C (`0xc8`), both outlets closed
#[allow(dead_code)]
pub const STATUS_PAUSED_CLOSED: &str = "02870a030001c80000000000abcd";

/// Notification kind without outlet information
#[allow(dead_code)]
pub const AUXILIARY_NOTIFICATION: &str = "0287100000000000000000000000000000beef";

#[allow(dead_code)]
pub fn identity(device_id: u8, client_id: u16) -> DeviceIdentity {
    DeviceIdentity::new(
        device_id,
        ClientId(client_id),
        "FD:93:5A:A8:EC:93".parse().expect("valid MAC address"),
    )
}

#[allow(dead_code)]
pub fn running_state(temperature: u8, outlet_flow: [u8; 2]) -> ControlState {
    ControlState {
        mode: Mode::Running,
        temperature,
        outlet_flow,
    }
}
