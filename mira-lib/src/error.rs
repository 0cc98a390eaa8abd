use crate::packet::Opcode;
use thiserror::Error;

/// The primary error type for the `mira-lib` library.
#[derive(Error, Debug)]
pub enum MiraError {
    #[error("Invalid payload length for {opcode}: expected {expected} bytes, got {actual}")]
    InvalidPayloadLength {
        opcode: Opcode,
        expected: usize,
        actual: usize,
    },

    #[error("{parameter} {value} is out of range ({min}..={max})")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("No client id reproduces the observed checksum - is the checksum model right for this device?")]
    NoCandidateFound,

    #[error("Malformed notification: {0}")]
    MalformedNotification(String),

    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("Insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Invalid device identity: {0}")]
    InvalidIdentity(String),

    #[error("Transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    #[error("Timeout waiting for the shower: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("No status notification received - is the device id correct?")]
    NoResponse,
}
