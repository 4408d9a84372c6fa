//! Behaviour of the stateful decoder across consecutive frames.

use intergas_rs::telemetry::channel::ChannelValue;
use intergas_rs::{
    BoilerDecoder, BoilerState, ChannelId, Command, IntergasError, JsonLinesSink, RecordingSink,
};

fn primary(status: u8, pressure: i16, tail: Option<[u8; 4]>) -> Vec<u8> {
    let mut f = vec![0u8; 25];
    f[0..2].copy_from_slice(&5500i16.to_le_bytes());
    f[2..4].copy_from_slice(&4800i16.to_le_bytes());
    f[4..6].copy_from_slice(&3900i16.to_le_bytes());
    f[6..8].copy_from_slice(&2500i16.to_le_bytes());
    f[12..14].copy_from_slice(&pressure.to_le_bytes());
    f[14..16].copy_from_slice(&5800i16.to_le_bytes());
    f[16..18].copy_from_slice(&2400i16.to_le_bytes());
    f[18..20].copy_from_slice(&2390i16.to_le_bytes());
    f[20..22].copy_from_slice(&250i16.to_le_bytes());
    f[22..24].copy_from_slice(&200i16.to_le_bytes());
    f[24] = status;
    if let Some(t) = tail {
        f.push(0);
        f.extend_from_slice(&t);
    }
    f
}

#[test]
fn test_repeated_frame_reports_no_change() {
    let frame = primary(0x00, 160, Some([0, 0, 0, 0]));
    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();

    decoder.decode(Command::Status1, &frame, &mut sink).unwrap();
    assert!(sink.updates.iter().all(|u| u.changed));
    let first = decoder.registry().snapshot();

    sink.clear();
    decoder.decode(Command::Status1, &frame, &mut sink).unwrap();
    assert!(!sink.updates.is_empty());
    assert!(sink.updates.iter().all(|u| !u.changed));
    assert!(!sink.last_state().unwrap().changed);
    assert_eq!(decoder.registry().snapshot(), first);
}

#[test]
fn test_short_frame_mutates_nothing() {
    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();
    decoder
        .decode(Command::Status1, &primary(0x7E, 150, None), &mut sink)
        .unwrap();
    let before = decoder.registry().snapshot();
    sink.clear();

    let err = decoder
        .decode(Command::Status1, &[0x10; 24], &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        IntergasError::ShortFrame {
            command: Command::Status1,
            length: 24,
            required: 25
        }
    ));
    assert!(sink.updates.is_empty());
    assert!(sink.states.is_empty());
    assert_eq!(decoder.registry().snapshot(), before);
    assert_eq!(decoder.state().unwrap().state, BoilerState::Idle);
    assert!(decoder.diagnostic().unwrap().contains("too short"));
}

#[test]
fn test_rejection_latches_channel() {
    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();

    decoder
        .decode(Command::Status1, &primary(0x7E, 150, None), &mut sink)
        .unwrap();
    assert_eq!(
        decoder.registry().value(ChannelId::Pressure),
        Some(ChannelValue::Float(1.5))
    );

    // 6 bar is outside the sensor range
    sink.clear();
    let outcome = decoder
        .decode(Command::Status1, &primary(0x7E, 600, None), &mut sink)
        .unwrap();
    assert_eq!(outcome.rejected, vec![ChannelId::Pressure]);
    assert!(sink.last(ChannelId::Pressure).is_none());
    assert_eq!(
        decoder.registry().value(ChannelId::Pressure),
        Some(ChannelValue::Float(0.0))
    );
    assert!(decoder.registry().float(ChannelId::Pressure).unwrap().is_latched());

    // The same value as before the rejection is published as a change
    sink.clear();
    decoder
        .decode(Command::Status1, &primary(0x7E, 150, None), &mut sink)
        .unwrap();
    let update = sink.last(ChannelId::Pressure).unwrap();
    assert!(update.changed);
    assert_eq!(update.value, ChannelValue::Float(1.5));

    // A zero reading after a rejection is a change too
    decoder
        .decode(Command::Status1, &primary(0x7E, 600, None), &mut sink)
        .unwrap();
    sink.clear();
    decoder
        .decode(Command::Status1, &primary(0x7E, 0, None), &mut sink)
        .unwrap();
    assert!(sink.last(ChannelId::Pressure).unwrap().changed);
}

#[test]
fn test_active_fault_keeps_last_fault() {
    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();

    // byte 27 != 0x80: byte 29 is the last fault
    decoder
        .decode(Command::Status1, &primary(0x7E, 150, Some([0, 0, 0, 12])), &mut sink)
        .unwrap();
    assert_eq!(decoder.registry().value(ChannelId::LastFault), Some(ChannelValue::Integer(12)));
    assert_eq!(decoder.registry().value(ChannelId::FaultCode), Some(ChannelValue::Integer(0)));

    // byte 27 == 0x80: byte 29 is the active fault, last fault untouched
    sink.clear();
    decoder
        .decode(
            Command::Status1,
            &primary(0x7E, 150, Some([0x04, 0x80, 0x00, 29])),
            &mut sink,
        )
        .unwrap();
    assert_eq!(decoder.registry().value(ChannelId::FaultCode), Some(ChannelValue::Integer(29)));
    assert_eq!(decoder.registry().value(ChannelId::LastFault), Some(ChannelValue::Integer(12)));
    assert!(sink.last(ChannelId::LastFault).is_none());

    let alarm = sink.flags.last().unwrap();
    assert!(alarm.active);
    assert!(alarm.changed);
    assert!(decoder.registry().alarm().current());
}

#[test]
fn test_lock_overrides_status_code() {
    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();
    let outcome = decoder
        .decode(Command::Status1, &primary(0xCC, 150, Some([0, 0, 0x02, 0])), &mut sink)
        .unwrap();
    assert_eq!(outcome.state.unwrap().state, BoilerState::Lock);
    assert_eq!(sink.last_state().unwrap().label, "lock");
}

#[test]
fn test_unrecognized_status_code_label() {
    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();
    decoder
        .decode(Command::Status1, &primary(0x33, 150, None), &mut sink)
        .unwrap();
    let state = sink.last_state().unwrap();
    assert_eq!(state.state, BoilerState::Unknown);
    assert_eq!(state.label, "code 0x33");
}

#[test]
fn test_commands_without_layout() {
    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();
    for command in [Command::ProductCode, Command::Params, Command::Settings] {
        let err = decoder.decode(command, &[0u8; 32], &mut sink).unwrap_err();
        assert!(matches!(err, IntergasError::UnsupportedCommand(c) if c == command));
    }
}

#[test]
fn test_json_lines_sink_output() {
    let mut decoder = BoilerDecoder::default();
    let mut sink = JsonLinesSink::new(Vec::new());
    let frame = primary(0x7E, 150, None);
    decoder.decode(Command::Status1, &frame, &mut sink).unwrap();
    decoder.decode(Command::Status1, &frame, &mut sink).unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    // Ten channels plus the mode, once: the repeat changes nothing
    assert_eq!(lines.len(), 11);
    let pressure = lines
        .iter()
        .find(|l| l["channel"] == "pressure")
        .unwrap();
    assert_eq!(pressure["value"], 1.5);
    assert_eq!(pressure["unit"], "bar");
    let mode = lines.iter().find(|l| l["channel"] == "mode").unwrap();
    assert_eq!(mode["value"], "idle");
}
