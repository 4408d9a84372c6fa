//! Decoding of responses captured from an HRE 28/24 service port.

use approx::assert_relative_eq;
use intergas_rs::protocol::frame::{parse_frame, DecodedFrame, FaultRecord};
use intergas_rs::util::hex::decode_hex;
use intergas_rs::{BoilerDecoder, BoilerState, ChannelId, Command, RecordingSink};

/// Burner on for central heating, pump running, gas valve open, last fault 29.
const STATUS_1_HEATING_HEX: &str =
    "0218 9411 AC0D C40B 27EC 27EC AA00 7017 800C 6C0C FE01 2C01 00 00 10 00 80 1D";

/// Only the first 25 bytes; older firmware stops after the status code.
const STATUS_1_SHORT_TAIL_HEX: &str =
    "0218 9411 AC0D C40B 27EC 27EC AA00 7017 0000 0000 0000 0000 7E";

/// Tap running, pump at 60 %, room thermostat at 20.5 °C.
const STATUS_2_HEX: &str = "0802 50 00 0000 0208 C307 00000000 FF7F 00000000";

const STATISTICS_HEX: &str =
    "7856 1000 000A 0003 204E 0300 0700 0200 6F683803 6D4D0C00 000000000000 01 02";

fn value(sink: &RecordingSink, id: ChannelId) -> f64 {
    sink.last(id)
        .unwrap_or_else(|| panic!("{id} not published"))
        .value
        .as_f64()
}

#[test]
fn test_status_1_heating() {
    let data = decode_hex(STATUS_1_HEATING_HEX).unwrap();
    assert_eq!(data.len(), 30);

    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();
    let outcome = decoder.decode(Command::Status1, &data, &mut sink).unwrap();
    assert!(outcome.is_success(), "{:?}", outcome.rejected);

    assert_relative_eq!(value(&sink, ChannelId::BoilerTemp), 61.46);
    assert_relative_eq!(value(&sink, ChannelId::BoilerOutletTemp), 45.0);
    assert_relative_eq!(value(&sink, ChannelId::BoilerInletTemp), 35.0);
    assert_relative_eq!(value(&sink, ChannelId::HotWaterOutletTemp), 30.12);
    assert_relative_eq!(value(&sink, ChannelId::Pressure), 1.7);
    assert_relative_eq!(value(&sink, ChannelId::TargetTemp), 60.0);
    assert_eq!(value(&sink, ChannelId::FanTarget), 3200.0);
    assert_eq!(value(&sink, ChannelId::FanCurrent), 3180.0);
    assert_relative_eq!(value(&sink, ChannelId::FanDuty), 51.0, epsilon = 1e-9);
    assert_relative_eq!(value(&sink, ChannelId::Power), 4.083, epsilon = 1e-9);
    assert_eq!(value(&sink, ChannelId::LastFault), 29.0);
    assert_eq!(value(&sink, ChannelId::FaultCode), 0.0);

    assert_eq!(decoder.state().unwrap().state, BoilerState::Heating);
    assert_eq!(sink.last_state().unwrap().label, "heating");
    assert!(!sink.flags.last().unwrap().active);
}

#[test]
fn test_status_1_without_tail() {
    let data = decode_hex(STATUS_1_SHORT_TAIL_HEX).unwrap();
    assert_eq!(data.len(), 25);

    match parse_frame(Command::Status1, &data).unwrap() {
        DecodedFrame::Primary(p) => {
            assert!(p.tail.is_none());
            assert!(!p.locked());
        }
        other => panic!("unexpected frame {other:?}"),
    }

    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();
    let outcome = decoder.decode(Command::Status1, &data, &mut sink).unwrap();
    assert!(outcome.tail_missing);
    assert!(sink.flags.is_empty());
    assert!(sink.last(ChannelId::FaultCode).is_none());
    assert_eq!(decoder.state().unwrap().state, BoilerState::Idle);
}

#[test]
fn test_status_1_fault_block() {
    let data = decode_hex(STATUS_1_HEATING_HEX).unwrap();
    match parse_frame(Command::Status1, &data).unwrap() {
        DecodedFrame::Primary(p) => {
            let tail = p.tail.unwrap();
            assert_eq!(tail.fault(), FaultRecord::Last(29));
            assert!(!tail.alarm());
        }
        other => panic!("unexpected frame {other:?}"),
    }
}

#[test]
fn test_status_2() {
    let data = decode_hex(STATUS_2_HEX).unwrap();
    assert_eq!(data.len(), 20);

    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();
    let outcome = decoder.decode(Command::Status2, &data, &mut sink).unwrap();
    assert!(outcome.is_success());

    assert_relative_eq!(value(&sink, ChannelId::TapFlow), 5.2);
    assert_relative_eq!(value(&sink, ChannelId::PumpDuty), 60.0);
    assert_relative_eq!(value(&sink, ChannelId::RoomTarget), 20.5);
    assert_relative_eq!(value(&sink, ChannelId::RoomCurrent), 19.87);
}

#[test]
fn test_statistics() {
    let data = decode_hex(STATISTICS_HEX).unwrap();
    assert_eq!(data.len(), 32);

    match parse_frame(Command::Statistics, &data).unwrap() {
        DecodedFrame::Statistics(s) => {
            assert_eq!(s.line_power_connected, 0x01_5678);
            assert_eq!(s.line_power_disconnects, 16);
            assert_eq!(s.ch_function, 0x0A00);
            assert_eq!(s.dhw_function, 0x0300);
            assert_eq!(s.burner_starts, 0x02_4E20);
            assert_eq!(s.ignition_failed, 3);
            assert_eq!(s.flame_lost, 7);
            assert_eq!(s.resets, 2);
            assert_eq!(s.gas_heating_raw, 54_028_399);
            assert_eq!(s.gas_hot_water_raw, 806_253);
        }
        other => panic!("unexpected frame {other:?}"),
    }

    let mut decoder = BoilerDecoder::default();
    let mut sink = RecordingSink::new();
    assert!(decoder
        .decode(Command::Statistics, &data, &mut sink)
        .unwrap()
        .is_success());
    assert_relative_eq!(value(&sink, ChannelId::GasHeating), 4686.8);
    assert_relative_eq!(value(&sink, ChannelId::GasHotWater), 69.94);
}

#[test]
fn test_statistics_without_high_bytes() {
    let mut data = decode_hex(STATISTICS_HEX).unwrap();
    data.truncate(24);
    match parse_frame(Command::Statistics, &data).unwrap() {
        DecodedFrame::Statistics(s) => {
            assert_eq!(s.line_power_connected, 0x5678);
            assert_eq!(s.burner_starts, 0x4E20);
        }
        other => panic!("unexpected frame {other:?}"),
    }
}
