// Protocol constants for Mira Mode showers

/// Device id byte at the start of every packet
pub const DEVICE_ID_SIZE: usize = 1;

/// Command byte plus payload length byte
pub const OPCODE_SIZE: usize = 2;

/// Trailing checksum (big-endian)
pub const CHECKSUM_SIZE: usize = 2;

/// Smallest valid command packet: device id, opcode, empty payload, checksum
pub const MIN_PACKET_SIZE: usize = DEVICE_ID_SIZE + OPCODE_SIZE + CHECKSUM_SIZE;

/// The length byte bounds every payload
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Payload size of the control command
pub const CONTROL_PAYLOAD_SIZE: usize = 5;

/// Full status notification
pub const STATUS_FRAME_SIZE: usize = 14;

/// Status notification with the leading device id byte missing
pub const STATUS_FRAME_SIZE_TRUNCATED: usize = 13;

/// Notification kind that carries no outlet information
pub const AUXILIARY_FRAME_SIZE: usize = 19;

/// Number of outlets addressed by the control command
pub const OUTLET_COUNT: usize = 2;

/// Flow value of a fully open outlet
pub const OUTLET_FLOW_MAX: u8 = 0x64;

/// Second control payload byte, always sent as-is
pub const CONTROL_FIXED_BYTE: u8 = 0x01;

/// Temperature byte = celsius * scale - offset, clamped to a byte
pub const TEMPERATURE_SCALE: f64 = 10.4;
pub const TEMPERATURE_OFFSET: f64 = 268.0;

/// BLE advertised names of supported showers start with this
pub const DEVICE_NAME_PREFIX: &str = "Mira";

/// Label prefix some units put in front of the user-assigned name
pub const DEVICE_LABEL_PREFIX: &str = "Mira N86Sd: ";
