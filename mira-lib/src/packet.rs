//! Command packet framing.
//!
//! ```text
//! [device id:1][command:1][length:1][payload:length][checksum:2 BE]
//! ```
//!
//! The command and length bytes together form the opcode. The checksum
//! covers everything before it plus the client id, which is never sent.

use crate::checksum::keyed_checksum;
use crate::constants::{
    CHECKSUM_SIZE, CONTROL_PAYLOAD_SIZE, DEVICE_ID_SIZE, MAX_PAYLOAD_SIZE, MIN_PACKET_SIZE, OPCODE_SIZE,
};
use crate::error::MiraError;
use crate::identity::ClientId;
use bytes::{BufMut, Bytes, BytesMut};
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    /// Mode, target temperature and both outlet flows in one command
    Control = 0x87,
    /// Ask the device to emit a status notification
    RequestStatus = 0x07,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Control => write!(f, "Control"),
            Opcode::RequestStatus => write!(f, "RequestStatus"),
            Opcode::Unknown(command) => write!(f, "Unknown(0x{command:02x})"),
        }
    }
}

impl Opcode {
    /// Payload size required by a known command, `None` when the framing of
    /// the command is not known.
    pub fn fixed_payload_len(&self) -> Option<usize> {
        match self {
            Opcode::Control => Some(CONTROL_PAYLOAD_SIZE),
            Opcode::RequestStatus => Some(0),
            Opcode::Unknown(_) => None,
        }
    }

    /// Checks a payload length against this opcode's framing.
    pub fn check_payload_len(&self, actual: usize) -> Result<(), MiraError> {
        let (fits, expected) = match self.fixed_payload_len() {
            Some(fixed) => (actual == fixed, fixed),
            None => (actual <= MAX_PAYLOAD_SIZE, MAX_PAYLOAD_SIZE),
        };
        if fits {
            return Ok(());
        }
        Err(MiraError::InvalidPayloadLength {
            opcode: *self,
            expected,
            actual,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPacket {
    pub device_id: u8,
    pub opcode: Opcode,
    pub payload: Bytes,
    pub checksum: u16,
}

impl CommandPacket {
    /// Frames a command and signs it with `client_id`.
    pub fn new(device_id: u8, opcode: Opcode, payload: &[u8], client_id: ClientId) -> Result<Self, MiraError> {
        opcode.check_payload_len(payload.len())?;

        let mut packet = Self {
            device_id,
            opcode,
            payload: Bytes::copy_from_slice(payload),
            checksum: 0,
        };
        packet.checksum = keyed_checksum(&packet.data(), client_id);
        Ok(packet)
    }

    /// The transmitted bytes that feed the checksum: device id, opcode and
    /// payload.
    pub fn data(&self) -> Bytes {
        let mut data = BytesMut::with_capacity(DEVICE_ID_SIZE + OPCODE_SIZE + self.payload.len());
        data.put_u8(self.device_id);
        data.put_u8(self.opcode.into());
        // Lengths above 255 never get past `check_payload_len` or `decode`.
        data.put_u8(self.payload.len() as u8);
        data.extend_from_slice(&self.payload);
        data.freeze()
    }

    /// Complete wire representation.
    pub fn to_bytes(&self) -> Bytes {
        let mut bytes = BytesMut::with_capacity(self.wire_len());
        bytes.extend_from_slice(&self.data());
        bytes.put_u16(self.checksum);
        bytes.freeze()
    }

    /// Number of bytes on the wire.
    pub fn wire_len(&self) -> usize {
        MIN_PACKET_SIZE + self.payload.len()
    }

    pub fn checksum_bytes(&self) -> [u8; 2] {
        self.checksum.to_be_bytes()
    }

    /// True when the checksum field matches what `client_id` produces.
    pub fn verify(&self, client_id: ClientId) -> bool {
        keyed_checksum(&self.data(), client_id) == self.checksum
    }
}

impl TryFrom<Bytes> for CommandPacket {
    type Error = MiraError;

    /// Splits a raw packet into its fields. The checksum is not validated;
    /// that needs the client id, see [`CommandPacket::verify`].
    fn try_from(mut bytes: Bytes) -> Result<Self, Self::Error> {
        if bytes.len() < MIN_PACKET_SIZE {
            return Err(MiraError::InsufficientData {
                expected: MIN_PACKET_SIZE,
                actual: bytes.len(),
            });
        }

        let checksum_bytes = bytes.split_off(bytes.len() - CHECKSUM_SIZE);
        let checksum = u16::from_be_bytes([checksum_bytes[0], checksum_bytes[1]]);

        let header = bytes.split_to(DEVICE_ID_SIZE + OPCODE_SIZE);
        let device_id = header[0];
        let opcode = Opcode::from_primitive(header[1]);
        let declared_len = header[2] as usize;

        let payload = bytes;
        if payload.len() != declared_len {
            return Err(MiraError::InvalidPacket(format!(
                "length byte says {declared_len} payload bytes, packet carries {}",
                payload.len()
            )));
        }

        Ok(Self {
            device_id,
            opcode,
            payload,
            checksum,
        })
    }
}

impl From<CommandPacket> for Bytes {
    fn from(packet: CommandPacket) -> Self {
        packet.to_bytes()
    }
}

impl fmt::Display for CommandPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

/// Builds the wire bytes for a command.
pub fn encode(device_id: u8, opcode: Opcode, payload: &[u8], client_id: ClientId) -> Result<Bytes, MiraError> {
    CommandPacket::new(device_id, opcode, payload, client_id).map(Bytes::from)
}

/// Pure framing split of a raw command packet.
pub fn decode(raw: &[u8]) -> Result<CommandPacket, MiraError> {
    CommandPacket::try_from(Bytes::copy_from_slice(raw))
}

pub fn verify(packet: &CommandPacket, client_id: ClientId) -> bool {
    packet.verify(client_id)
}
