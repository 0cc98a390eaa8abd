//! Tests for command packet framing

mod common;

use common::*;
use mira_lib::packet::{decode, encode, verify};

#[test]
fn test_status_request_encoding() {
    let bytes = encode(2, Opcode::RequestStatus, &[], ClientId(CLIENT_ID_DEVICE_2)).expect("Failed to encode");
    assert_eq!(bytes, hex_to_bytes("020700458a"));

    let bytes = encode(1, Opcode::RequestStatus, &[], ClientId(CLIENT_ID_DEVICE_1)).expect("Failed to encode");
    assert_eq!(bytes, hex_to_bytes("010700b476"));
}

#[test]
fn test_captured_commands_reencode_byte_identical() {
    for (data, packet) in CAPTURED_COMMANDS {
        let data = hex_to_bytes(data);
        let client_id = if data[0] == 1 { CLIENT_ID_DEVICE_1 } else { CLIENT_ID_DEVICE_2 };

        let bytes = encode(data[0], Opcode::from(data[1]), &data[3..], ClientId(client_id)).expect("Failed to encode");
        assert_eq!(hex::encode(&bytes), *packet, "re-encoding {}", hex::encode(&data));
    }
}

#[test]
fn test_decode_control_packet() {
    let packet = decode(&hex_to_bytes("01870503019a0000d528")).expect("Failed to decode");

    assert_eq!(packet.device_id, 1);
    assert_eq!(packet.opcode, Opcode::Control);
    assert_eq!(packet.payload, Bytes::from_static(&[0x03, 0x01, 0x9a, 0x00, 0x00]));
    assert_eq!(packet.checksum, 0xd528);
    assert_eq!(packet.wire_len(), 10);
}

#[test]
fn test_decode_recovers_encoded_fields() {
    let payload = [0x01, 0x01, 0x81, 0x64, 0x00];
    let bytes = encode(2, Opcode::Control, &payload, ClientId(CLIENT_ID_DEVICE_2)).expect("Failed to encode");
    assert_eq!(hex::encode(&bytes), "02870501018164001a43");

    let packet = decode(&bytes).expect("Failed to decode");
    assert_eq!(packet.device_id, 2);
    assert_eq!(packet.opcode, Opcode::Control);
    assert_eq!(packet.payload.as_ref(), &payload);
    assert_eq!(packet.to_bytes(), bytes);
}

#[test]
fn test_encoded_packets_verify_only_with_their_key() {
    let client_ids = [0u16, 1, 4660, CLIENT_ID_DEVICE_1, CLIENT_ID_DEVICE_2, u16::MAX];
    for client_id in client_ids {
        let bytes =
            encode(5, Opcode::Control, &[0x01, 0x01, 0x90, 0x64, 0x00], ClientId(client_id)).expect("Failed to encode");
        let packet = decode(&bytes).expect("Failed to decode");

        assert!(verify(&packet, ClientId(client_id)), "client id {client_id}");
        assert!(!verify(&packet, ClientId(client_id.wrapping_add(1))), "client id {client_id} + 1");
    }
}

#[test]
fn test_unknown_opcode_round_trips() {
    let bytes = encode(3, Opcode::Unknown(0x42), &[0xaa, 0xbb], ClientId(7)).expect("Failed to encode");
    let packet = decode(&bytes).expect("Failed to decode");

    assert_eq!(packet.opcode, Opcode::Unknown(0x42));
    assert_eq!(packet.payload.as_ref(), &[0xaau8, 0xbb]);
    assert!(packet.verify(ClientId(7)));
    assert_eq!(packet.opcode.to_string(), "Unknown(0x42)");
}

#[test]
fn test_invalid_payload_length_is_rejected_before_encoding() {
    let result = encode(2, Opcode::Control, &[0x01, 0x01, 0xe0], ClientId(1));
    assert!(matches!(
        result,
        Err(MiraError::InvalidPayloadLength {
            opcode: Opcode::Control,
            expected: 5,
            actual: 3
        })
    ));

    let result = encode(2, Opcode::RequestStatus, &[0x00], ClientId(1));
    assert!(matches!(result, Err(MiraError::InvalidPayloadLength { expected: 0, actual: 1, .. })));

    let oversized = vec![0u8; 256];
    let result = encode(2, Opcode::Unknown(0x10), &oversized, ClientId(1));
    assert!(matches!(result, Err(MiraError::InvalidPayloadLength { expected: 255, actual: 256, .. })));
}

#[test]
fn test_decode_short_packet() {
    let result = decode(&hex_to_bytes("020745"));
    assert!(matches!(result, Err(MiraError::InsufficientData { expected: 5, actual: 3 })));
}

#[test]
fn test_decode_length_byte_mismatch() {
    // Length byte claims 5 payload bytes, only 4 present
    let result = decode(&hex_to_bytes("02870501019a00d528"));
    assert!(matches!(result, Err(MiraError::InvalidPacket(_))));
}

#[test]
fn test_packet_display_is_hex() {
    let packet = decode(&hex_to_bytes("020700458a")).expect("Failed to decode");
    assert_eq!(packet.to_string(), "020700458a");
    assert_eq!(packet.checksum_bytes(), [0x45, 0x8a]);
}
