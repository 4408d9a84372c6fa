//! # Telemetry Sinks
//!
//! The decoder hands every accepted reading to a [`TelemetrySink`]. Each
//! update carries a `changed` flag computed against the channel's held
//! value; the sink decides whether an unchanged value is worth sending.

use crate::protocol::state::BoilerState;
use crate::telemetry::channel::{ChannelId, ChannelValue};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Write;

/// An accepted reading of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelUpdate {
    pub channel: ChannelId,
    pub value: ChannelValue,
    pub changed: bool,
}

/// Binary sensors published by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagId {
    Alarm,
}

impl FlagId {
    pub fn name(&self) -> &'static str {
        match self {
            FlagId::Alarm => "alarm",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagUpdate {
    pub flag: FlagId,
    pub active: bool,
    pub changed: bool,
}

/// Operating state derived from one primary status frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub state: BoilerState,
    pub label: String,
    pub changed: bool,
}

/// Receiver of validated telemetry.
///
/// Every method returns `false` only when the sink tried to transmit and
/// failed; skipping an unchanged value counts as success.
pub trait TelemetrySink {
    fn publish(&mut self, update: &ChannelUpdate) -> bool;

    fn publish_flag(&mut self, update: &FlagUpdate) -> bool;

    fn publish_state(&mut self, update: &StateUpdate) -> bool;
}

/// Logs changed values at info level.
#[derive(Debug, Default, Clone)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn publish(&mut self, update: &ChannelUpdate) -> bool {
        if update.changed {
            info!(
                "{} = {} {}",
                update.channel,
                update.value,
                update.channel.unit()
            );
        }
        true
    }

    fn publish_flag(&mut self, update: &FlagUpdate) -> bool {
        if update.changed {
            info!("{} = {}", update.flag.name(), update.active);
        }
        true
    }

    fn publish_state(&mut self, update: &StateUpdate) -> bool {
        if update.changed {
            info!("mode = {}", update.label);
        }
        true
    }
}

/// Writes one JSON object per changed value.
///
/// ```
/// use intergas_rs::{ChannelId, ChannelUpdate, JsonLinesSink, TelemetrySink};
///
/// let mut sink = JsonLinesSink::new(Vec::new());
/// sink.publish(&ChannelUpdate {
///     channel: ChannelId::BoilerTemp,
///     value: 61.46.into(),
///     changed: true,
/// });
/// let line = String::from_utf8(sink.into_inner()).unwrap();
/// assert_eq!(line, "{\"channel\":\"boiler_temp\",\"unit\":\"°C\",\"value\":61.46}\n");
/// ```
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    /// Also write values that did not change
    pub force_update: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            force_update: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, line: serde_json::Value) -> bool {
        let written = serde_json::to_writer(&mut self.writer, &line)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"))
            .and_then(|_| self.writer.flush());
        match written {
            Ok(()) => true,
            Err(e) => {
                warn!("telemetry write failed: {e}");
                false
            }
        }
    }
}

impl<W: Write> TelemetrySink for JsonLinesSink<W> {
    fn publish(&mut self, update: &ChannelUpdate) -> bool {
        if !update.changed && !self.force_update {
            return true;
        }
        self.emit(json!({
            "channel": update.channel,
            "unit": update.channel.unit(),
            "value": update.value,
        }))
    }

    fn publish_flag(&mut self, update: &FlagUpdate) -> bool {
        if !update.changed && !self.force_update {
            return true;
        }
        self.emit(json!({ "channel": update.flag, "value": update.active }))
    }

    fn publish_state(&mut self, update: &StateUpdate) -> bool {
        if !update.changed && !self.force_update {
            return true;
        }
        self.emit(json!({
            "channel": "mode",
            "value": update.label,
            "state": update.state,
        }))
    }
}

/// Keeps every update in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub updates: Vec<ChannelUpdate>,
    pub flags: Vec<FlagUpdate>,
    pub states: Vec<StateUpdate>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent update of `channel`.
    pub fn last(&self, channel: ChannelId) -> Option<&ChannelUpdate> {
        self.updates.iter().rev().find(|u| u.channel == channel)
    }

    pub fn last_state(&self) -> Option<&StateUpdate> {
        self.states.last()
    }

    pub fn clear(&mut self) {
        self.updates.clear();
        self.flags.clear();
        self.states.clear();
    }
}

impl TelemetrySink for RecordingSink {
    fn publish(&mut self, update: &ChannelUpdate) -> bool {
        self.updates.push(update.clone());
        true
    }

    fn publish_flag(&mut self, update: &FlagUpdate) -> bool {
        self.flags.push(update.clone());
        true
    }

    fn publish_state(&mut self, update: &StateUpdate) -> bool {
        self.states.push(update.clone());
        true
    }
}
