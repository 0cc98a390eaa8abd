//! Tests for status notification decoding

mod common;

use common::*;
use mira_lib::status::{Notification, decode_notification, decode_status};

#[test]
fn test_decode_running_status() {
    let status = decode_status(&hex_to_bytes(STATUS_RUNNING_OUTLET_1)).expect("Failed to decode");

    assert_eq!(status.device_id, 2);
    assert_eq!(status.mode, Mode::Running);
    assert_eq!(status.temperature, 40.0);
    assert_eq!(status.outlet_flow, [100, 0]);
    assert_eq!(status.outlet_on(0), Some(true));
    assert_eq!(status.outlet_on(1), Some(false));
    assert_eq!(status.outlet_on(2), None);
    assert_eq!(status.flow_rate(), 100);
    assert_eq!(status.outlet_states().collect::<Vec<_>>(), vec![(0, true), (1, false)]);
}

#[test]
fn test_decode_paused_status() {
    let status = decode_status(&hex_to_bytes(STATUS_PAUSED_CLOSED)).expect("Failed to decode");

    assert_eq!(status.mode, Mode::Paused);
    assert_eq!(status.temperature, 45.0);
    assert_eq!(status.flow_rate(), 0);
    assert_eq!(
        status.to_string(),
        "Mode: paused, Temperature: 45.0 °C, Outlet 1: off (0%), Outlet 2: off (0%)"
    );
}

#[test]
fn test_temperature_is_read_from_byte_6() {
    let mut raw = hex_to_bytes(STATUS_RUNNING_OUTLET_1).to_vec();
    assert_eq!(raw[6], 0x94);
    assert_eq!(decode_status(&raw).expect("Failed to decode").temperature, 40.0);

    // Neighbouring reserved bytes carry no temperature information
    raw[5] = 0xff;
    raw[7] = 0xff;
    assert_eq!(decode_status(&raw).expect("Failed to decode").temperature, 40.0);

    raw[6] = 0x9a;
    assert_eq!(decode_status(&raw).expect("Failed to decode").temperature, 40.58);

    raw[6] = 0x00;
    assert_eq!(decode_status(&raw).expect("Failed to decode").temperature, 25.77);

    raw[6] = 0xff;
    assert_eq!(decode_status(&raw).expect("Failed to decode").temperature, 50.29);
}

#[test]
fn test_partly_open_outlet_reads_as_off() {
    let mut raw = hex_to_bytes(STATUS_RUNNING_OUTLET_1).to_vec();
    raw[9] = 0x32;
    raw[10] = 0x63;
    let status = decode_status(&raw).expect("Failed to decode");

    assert_eq!(status.outlet_on(0), Some(false));
    assert_eq!(status.outlet_on(1), Some(false));
    assert_eq!(status.flow_rate(), 0x63);
    assert_eq!(status.outlet_flow, [0x32, 0x63]);
}

#[test]
fn test_truncated_frame_is_realigned() {
    let full = hex_to_bytes(STATUS_RUNNING_OUTLET_1);
    let truncated = decode_status(&full[1..]).expect("Failed to decode");
    let status = decode_status(&full).expect("Failed to decode");

    assert_eq!(truncated.device_id, 0);
    assert_eq!(truncated.mode, status.mode);
    assert_eq!(truncated.temperature, status.temperature);
    assert_eq!(truncated.outlet_flow, status.outlet_flow);
}

#[test]
fn test_short_notification_is_malformed() {
    let full = hex_to_bytes(STATUS_RUNNING_OUTLET_1);
    for len in [0, 1, 5, 12] {
        let result = decode_status(&full[..len]);
        assert!(matches!(result, Err(MiraError::MalformedNotification(_))), "{len} bytes");
    }
}

#[test]
fn test_long_notification_is_malformed() {
    let mut raw = hex_to_bytes(STATUS_RUNNING_OUTLET_1).to_vec();
    raw.push(0x00);
    assert!(matches!(decode_status(&raw), Err(MiraError::MalformedNotification(_))));
}

#[test]
fn test_unknown_mode_is_malformed() {
    let mut raw = hex_to_bytes(STATUS_RUNNING_OUTLET_1).to_vec();
    raw[3] = 0x02;
    assert!(matches!(decode_status(&raw), Err(MiraError::MalformedNotification(_))));
}

#[test]
fn test_flow_above_fully_open_is_malformed() {
    let mut raw = hex_to_bytes(STATUS_RUNNING_OUTLET_1).to_vec();
    raw[10] = 0x65;
    assert!(matches!(decode_status(&raw), Err(MiraError::MalformedNotification(_))));
}

#[test]
fn test_auxiliary_notification_passes_through() {
    let raw = hex_to_bytes(AUXILIARY_NOTIFICATION);
    assert_eq!(decode_notification(&raw).expect("Failed to decode"), Notification::Auxiliary(raw.clone()));
    assert!(matches!(decode_status(&raw), Err(MiraError::MalformedNotification(_))));
}

#[test]
fn test_notification_status() {
    let raw = hex_to_bytes(STATUS_PAUSED_CLOSED);
    match decode_notification(&raw).expect("Failed to decode") {
        Notification::Status(status) => assert_eq!(status.mode, Mode::Paused),
        other => panic!("expected a status, got {other:?}"),
    }
}

#[test]
fn test_status_serializes_to_json() {
    let status = decode_status(&hex_to_bytes(STATUS_RUNNING_OUTLET_1)).expect("Failed to decode");
    let json = serde_json::to_value(status).expect("Failed to serialize");

    assert_eq!(json["mode"], "running");
    assert_eq!(json["temperature"], 40.0);
    assert_eq!(json["outlet_flow"], serde_json::json!([100, 0]));
}
