//! # Boiler Decoder
//!
//! [`BoilerDecoder`] owns the channel registry of one boiler. Every call to
//! [`BoilerDecoder::decode`] parses one response, offers each field to its
//! channel's value gate, derives the operating state and forwards every
//! accepted value to a [`TelemetrySink`].
//!
//! A short or undecodable frame mutates nothing. An out-of-range field
//! resets only its own channel; the remaining fields are still decoded and
//! the frame is reported as unsuccessful.

use crate::constants::GAS_WATT;
use crate::error::IntergasError;
use crate::protocol::command::Command;
use crate::protocol::frame::{
    parse_frame, DecodedFrame, FaultRecord, PrimaryStatus, SecondaryStatus, Statistics,
};
use crate::protocol::state::{derive_state, BoilerState, StateReading};
use crate::telemetry::calibration::GasUsageCalibrator;
use crate::telemetry::channel::{ChannelId, ChannelRegistry, ChannelValue, GateOutcome};
use crate::telemetry::sink::{ChannelUpdate, FlagId, FlagUpdate, StateUpdate, TelemetrySink};
use crate::util::logging::log_frame_hex;
use log::{debug, info, warn};
use std::fmt;

/// What one successful parse produced.
#[derive(Debug, Clone)]
pub struct DecodeOutcome {
    pub command: Command,
    pub frame: DecodedFrame,
    /// Channels whose reading was out of range
    pub rejected: Vec<ChannelId>,
    /// State derived from a primary status frame
    pub state: Option<StateReading>,
    /// Primary status frame ended before the flag/fault block
    pub tail_missing: bool,
    /// The sink reported a failed transmission
    pub sink_failed: bool,
    /// Raw readings behind `rejected`, as `name=value`
    rejected_readings: Vec<String>,
}

impl DecodeOutcome {
    fn new(command: Command, frame: DecodedFrame) -> Self {
        Self {
            command,
            frame,
            rejected: Vec::new(),
            state: None,
            tail_missing: false,
            sink_failed: false,
            rejected_readings: Vec::new(),
        }
    }

    fn reject(&mut self, id: ChannelId, reading: &dyn fmt::Display) {
        debug!("{id} rejected: {reading} outside {:?}", id.range());
        self.rejected.push(id);
        self.rejected_readings.push(format!("{id}={reading}"));
    }

    /// AND of every field and publication outcome.
    pub fn is_success(&self) -> bool {
        self.rejected.is_empty() && !self.sink_failed
    }

    fn diagnostic(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        let mut parts = Vec::new();
        if !self.rejected_readings.is_empty() {
            parts.push(format!("out of range: {}", self.rejected_readings.join(", ")));
        }
        if self.sink_failed {
            parts.push("telemetry publish failed".to_string());
        }
        Some(format!("{} response: {}", self.command, parts.join("; ")))
    }
}

/// Stateful decoder for one boiler.
#[derive(Debug, Clone)]
pub struct BoilerDecoder {
    registry: ChannelRegistry,
    calibrator: GasUsageCalibrator,
    gas_watt: f64,
    state: Option<StateReading>,
    diagnostic: Option<String>,
}

impl Default for BoilerDecoder {
    fn default() -> Self {
        Self::new(GasUsageCalibrator::default(), GAS_WATT)
    }
}

impl BoilerDecoder {
    pub fn new(calibrator: GasUsageCalibrator, gas_watt: f64) -> Self {
        Self {
            registry: ChannelRegistry::new(),
            calibrator,
            gas_watt,
            state: None,
            diagnostic: None,
        }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// State derived from the last primary status frame.
    pub fn state(&self) -> Option<&StateReading> {
        self.state.as_ref()
    }

    /// Message describing why the last decode failed; cleared on every call.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Decodes the response to `command` and publishes accepted values.
    ///
    /// Returns an error only when the frame could not be parsed at all; a
    /// parsed frame with rejected fields is an `Ok` whose outcome is not
    /// successful.
    pub fn decode<S: TelemetrySink + ?Sized>(
        &mut self,
        command: Command,
        data: &[u8],
        sink: &mut S,
    ) -> Result<DecodeOutcome, IntergasError> {
        self.diagnostic = None;
        log_frame_hex(&format!("{command} response"), data);

        let frame = match parse_frame(command, data) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("{e}");
                self.diagnostic = Some(e.to_string());
                return Err(e);
            }
        };

        let mut outcome = DecodeOutcome::new(command, frame.clone());
        match &frame {
            DecodedFrame::Primary(p) => self.apply_primary(p, sink, &mut outcome),
            DecodedFrame::Secondary(s) => self.apply_secondary(s, sink, &mut outcome),
            DecodedFrame::Statistics(s) => self.apply_statistics(s, sink, &mut outcome),
        }

        self.diagnostic = outcome.diagnostic();
        if let Some(msg) = &self.diagnostic {
            debug!("{msg}");
        }
        Ok(outcome)
    }

    fn apply_primary<S: TelemetrySink + ?Sized>(
        &mut self,
        p: &PrimaryStatus,
        sink: &mut S,
        outcome: &mut DecodeOutcome,
    ) {
        self.gate_float(ChannelId::BoilerTemp, p.boiler_temp, sink, outcome);
        self.gate_float(ChannelId::BoilerOutletTemp, p.boiler_outlet_temp, sink, outcome);
        self.gate_float(ChannelId::BoilerInletTemp, p.boiler_inlet_temp, sink, outcome);
        self.gate_float(ChannelId::HotWaterOutletTemp, p.hot_water_outlet_temp, sink, outcome);
        self.gate_float(ChannelId::Pressure, p.pressure, sink, outcome);
        self.gate_float(ChannelId::TargetTemp, p.target_temp, sink, outcome);
        self.gate_integer(ChannelId::FanTarget, p.fan_target_raw.into(), sink, outcome);
        self.gate_integer(ChannelId::FanCurrent, p.fan_current_raw.into(), sink, outcome);
        self.gate_float(ChannelId::FanDuty, p.fan_duty_percent(), sink, outcome);
        self.gate_float(ChannelId::Power, p.power_kw(self.gas_watt), sink, outcome);

        match &p.tail {
            Some(tail) => {
                let active = tail.alarm();
                let changed = self.registry.alarm_mut().set(active);
                let update = FlagUpdate {
                    flag: FlagId::Alarm,
                    active,
                    changed,
                };
                outcome.sink_failed |= !sink.publish_flag(&update);

                match tail.fault() {
                    FaultRecord::Active(code) => {
                        self.gate_integer(ChannelId::FaultCode, code.into(), sink, outcome);
                    }
                    FaultRecord::Last(code) => {
                        self.gate_integer(ChannelId::LastFault, code.into(), sink, outcome);
                        self.gate_integer(ChannelId::FaultCode, 0, sink, outcome);
                    }
                }
            }
            None => {
                debug!("S? response without flag block, lock and faults not updated");
                outcome.tail_missing = true;
            }
        }

        // A negative fan word means no fan demand for state purposes.
        let fan_target = p.fan_target_rpm().unwrap_or(0);
        let reading = derive_state(p.locked(), p.status_code, fan_target);
        let changed = self.state.as_ref() != Some(&reading);
        if changed && reading.state == BoilerState::Unknown {
            info!("unrecognized status byte, mode {}", reading.label);
        }
        let update = StateUpdate {
            state: reading.state,
            label: reading.label.clone(),
            changed,
        };
        outcome.sink_failed |= !sink.publish_state(&update);
        outcome.state = Some(reading.clone());
        self.state = Some(reading);
    }

    fn apply_secondary<S: TelemetrySink + ?Sized>(
        &mut self,
        s: &SecondaryStatus,
        sink: &mut S,
        outcome: &mut DecodeOutcome,
    ) {
        self.gate_float(ChannelId::TapFlow, s.tap_flow, sink, outcome);
        self.gate_float(ChannelId::PumpDuty, s.pump_duty(), sink, outcome);
        self.gate_float(ChannelId::RoomTarget, s.room_target, sink, outcome);
        self.gate_float(ChannelId::RoomCurrent, s.room_current, sink, outcome);
    }

    fn apply_statistics<S: TelemetrySink + ?Sized>(
        &mut self,
        s: &Statistics,
        sink: &mut S,
        outcome: &mut DecodeOutcome,
    ) {
        debug!(
            "statistics: burner starts {}, ignition failures {}, flame lost {}, resets {}, line power {} h",
            s.burner_starts, s.ignition_failed, s.flame_lost, s.resets, s.line_power_connected
        );
        let heating = self.calibrator.calibrate(s.gas_heating_raw, true);
        let hot_water = self.calibrator.calibrate(s.gas_hot_water_raw, false);
        self.gate_float(ChannelId::GasHeating, heating, sink, outcome);
        self.gate_float(ChannelId::GasHotWater, hot_water, sink, outcome);
    }

    fn gate_float<S: TelemetrySink + ?Sized>(
        &mut self,
        id: ChannelId,
        value: f64,
        sink: &mut S,
        outcome: &mut DecodeOutcome,
    ) {
        let Some(channel) = self.registry.float_mut(id) else {
            return;
        };
        let gate = channel.accept(value);
        Self::forward(id, value.into(), gate, sink, outcome);
    }

    /// A raw word that does not fit the channel's `u16` is rejected as is.
    fn gate_integer<S: TelemetrySink + ?Sized>(
        &mut self,
        id: ChannelId,
        raw: i32,
        sink: &mut S,
        outcome: &mut DecodeOutcome,
    ) {
        let Some(channel) = self.registry.integer_mut(id) else {
            return;
        };
        match u16::try_from(raw) {
            Ok(v) => {
                let gate = channel.accept(v);
                Self::forward(id, v.into(), gate, sink, outcome);
            }
            Err(_) => {
                channel.reject();
                outcome.reject(id, &raw);
            }
        }
    }

    fn forward<S: TelemetrySink + ?Sized>(
        id: ChannelId,
        value: ChannelValue,
        gate: GateOutcome,
        sink: &mut S,
        outcome: &mut DecodeOutcome,
    ) {
        match gate {
            GateOutcome::Accepted { changed } => {
                let update = ChannelUpdate {
                    channel: id,
                    value,
                    changed,
                };
                outcome.sink_failed |= !sink.publish(&update);
            }
            GateOutcome::Rejected => outcome.reject(id, &value),
        }
    }
}
