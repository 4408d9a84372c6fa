//! # Frame Layouts
//!
//! Parsers for the three decodable responses: `S?` primary status, `S2`
//! secondary status and `HN` statistics. Parsing is pure; range checks and
//! publishing happen in [`crate::decoder`].

use crate::constants::*;
use crate::error::IntergasError;
use crate::protocol::codec::{counter_u16, counter_u32, signed_100, signed_raw};
use crate::protocol::command::Command;
use crate::protocol::flags::{OperationFlags, StatusFlags};
use crate::protocol::state::StatusCode;
use nom::bytes::complete::take;
use nom::combinator::opt;
use nom::number::complete::be_u8;
use nom::sequence::tuple;
use nom::IResult;
use serde::Serialize;

/// Decoded `S?` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimaryStatus {
    pub boiler_temp: f64,
    pub boiler_outlet_temp: f64,
    pub boiler_inlet_temp: f64,
    pub hot_water_outlet_temp: f64,
    pub pressure: f64,
    pub target_temp: f64,
    /// Fan target in rpm, straight from the signed word
    pub fan_target_raw: i16,
    /// Fan speed in rpm, straight from the signed word
    pub fan_current_raw: i16,
    /// Fan PWM word; ×10 gives percent
    pub fan_pwm: f64,
    /// Ionisation current, proportional to gas flow
    pub io_current: f64,
    pub status_code: StatusCode,
    /// Bytes 26..=29, absent on truncated frames
    pub tail: Option<StatusTail>,
}

/// Flag and fault block of the `S?` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusTail {
    pub status_flags: StatusFlags,
    pub fault_select: u8,
    pub operation_flags: OperationFlags,
    pub fault_byte: u8,
}

/// Which fault slot byte 29 belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultRecord {
    /// Byte 27 is 0x80: byte 29 is the active fault
    Active(u8),
    /// Anything else: byte 29 is the last fault and nothing is active
    Last(u8),
}

impl StatusTail {
    pub fn fault(&self) -> FaultRecord {
        if self.fault_select == FAULT_ACTIVE_MARKER {
            FaultRecord::Active(self.fault_byte)
        } else {
            FaultRecord::Last(self.fault_byte)
        }
    }

    pub fn alarm(&self) -> bool {
        self.status_flags.alarm()
    }

    pub fn locked(&self) -> bool {
        self.operation_flags.locked()
    }
}

impl PrimaryStatus {
    /// Fan target in rpm; `None` when the word is negative.
    pub fn fan_target_rpm(&self) -> Option<u16> {
        u16::try_from(self.fan_target_raw).ok()
    }

    pub fn fan_current_rpm(&self) -> Option<u16> {
        u16::try_from(self.fan_current_raw).ok()
    }

    pub fn fan_duty_percent(&self) -> f64 {
        self.fan_pwm * 10.0
    }

    /// Burner power estimated from the ionisation current.
    pub fn power_kw(&self, gas_watt: f64) -> f64 {
        self.io_current * gas_watt / 1000.0
    }

    pub fn locked(&self) -> bool {
        self.tail.map(|t| t.locked()).unwrap_or(false)
    }
}

/// Decoded `S2` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondaryStatus {
    pub tap_flow: f64,
    pub pump_raw: u8,
    pub room_target: f64,
    pub room_current: f64,
}

impl SecondaryStatus {
    /// Pump duty in percent; the controller reports `200 - 2 × duty`.
    pub fn pump_duty(&self) -> f64 {
        (200.0 - f64::from(self.pump_raw)) / 2.0
    }
}

/// Decoded `HN` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub line_power_connected: u32,
    pub line_power_disconnects: u16,
    pub ch_function: u16,
    pub dhw_function: u16,
    pub burner_starts: u32,
    pub ignition_failed: u16,
    pub flame_lost: u16,
    pub resets: u16,
    pub gas_heating_raw: u32,
    pub gas_hot_water_raw: u32,
}

/// A parsed response of any decodable command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum DecodedFrame {
    Primary(PrimaryStatus),
    Secondary(SecondaryStatus),
    Statistics(Statistics),
}

/// Parses the response to `command`.
///
/// Fails with `UnsupportedCommand` for commands without a layout and with
/// `ShortFrame` when `data` is shorter than the layout's minimum.
pub fn parse_frame(command: Command, data: &[u8]) -> Result<DecodedFrame, IntergasError> {
    let required = command
        .min_response_len()
        .ok_or(IntergasError::UnsupportedCommand(command))?;
    if data.len() < required {
        return Err(IntergasError::ShortFrame {
            command,
            length: data.len(),
            required,
        });
    }

    let parsed = match command {
        Command::Status1 => primary_status(data).map(|(_, f)| DecodedFrame::Primary(f)),
        Command::Status2 => secondary_status(data).map(|(_, f)| DecodedFrame::Secondary(f)),
        Command::Statistics => statistics(data).map(|(_, f)| DecodedFrame::Statistics(f)),
        _ => return Err(IntergasError::UnsupportedCommand(command)),
    };
    parsed.map_err(|e| IntergasError::FrameParseError(format!("{command}: {e:?}")))
}

fn primary_status(input: &[u8]) -> IResult<&[u8], PrimaryStatus> {
    let (input, (boiler_temp, boiler_outlet_temp, boiler_inlet_temp, hot_water_outlet_temp)) =
        tuple((signed_100, signed_100, signed_100, signed_100))(input)?;
    // Bytes 8..12: hot-water inlet and outside NTC, not connected (-50.81)
    let (input, _) = take(S1_PRESSURE - 8)(input)?;
    let (input, (pressure, target_temp, fan_target_raw, fan_current_raw, fan_pwm, io_current)) =
        tuple((
            signed_100, signed_100, signed_raw, signed_raw, signed_100, signed_100,
        ))(input)?;
    let (input, status) = be_u8(input)?;
    let (input, tail) = opt(status_tail)(input)?;

    Ok((
        input,
        PrimaryStatus {
            boiler_temp,
            boiler_outlet_temp,
            boiler_inlet_temp,
            hot_water_outlet_temp,
            pressure,
            target_temp,
            fan_target_raw,
            fan_current_raw,
            fan_pwm,
            io_current,
            status_code: StatusCode::from(status),
            tail,
        },
    ))
}

fn status_tail(input: &[u8]) -> IResult<&[u8], StatusTail> {
    let (input, (_, status_flags, fault_select, operation_flags, fault_byte)) =
        tuple((be_u8, be_u8, be_u8, be_u8, be_u8))(input)?;
    Ok((
        input,
        StatusTail {
            status_flags: StatusFlags::from_bits_retain(status_flags),
            fault_select,
            operation_flags: OperationFlags::from_bits_retain(operation_flags),
            fault_byte,
        },
    ))
}

fn secondary_status(input: &[u8]) -> IResult<&[u8], SecondaryStatus> {
    let (input, tap_flow) = signed_100(input)?;
    let (input, pump_raw) = be_u8(input)?;
    // Byte 3: OpenTherm master member id, bytes 4,5: zone 1 override
    let (input, _) = take(S2_ROOM_TARGET - S2_PUMP_RAW - 1)(input)?;
    let (input, (room_target, room_current)) = tuple((signed_100, signed_100))(input)?;
    // Bytes 10..20 hold zone 2, an outside-temperature override that always
    // reads 327.67, and the thermostat product id; none carry signal here.
    Ok((
        input,
        SecondaryStatus {
            tap_flow,
            pump_raw,
            room_target,
            room_current,
        },
    ))
}

fn statistics(data: &[u8]) -> IResult<&[u8], Statistics> {
    let (input, (line_lo, line_power_disconnects, ch_function, dhw_function, starts_lo)) =
        tuple((counter_u16, counter_u16, counter_u16, counter_u16, counter_u16))(data)?;
    let (input, (ignition_failed, flame_lost, resets)) =
        tuple((counter_u16, counter_u16, counter_u16))(input)?;
    let (input, (gas_heating_raw, gas_hot_water_raw)) =
        tuple((counter_u32, counter_u32))(input)?;

    // Third bytes of the two 24-bit counters sit past the gas counters.
    let high = |offset: usize| u32::from(data.get(offset).copied().unwrap_or(0)) << 16;

    Ok((
        input,
        Statistics {
            line_power_connected: u32::from(line_lo) | high(HN_LINE_POWER_HIGH),
            line_power_disconnects,
            ch_function,
            dhw_function,
            burner_starts: u32::from(starts_lo) | high(HN_BURNER_STARTS_HIGH),
            ignition_failed,
            flame_lost,
            resets,
            gas_heating_raw,
            gas_hot_water_raw,
        },
    ))
}
