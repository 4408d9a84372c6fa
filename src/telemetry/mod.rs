//! The telemetry module holds the validated side of the bridge: channels
//! with their value gate, gas-usage calibration, and the sinks that
//! receive accepted readings.

pub mod calibration;
pub mod channel;
pub mod sink;

pub use calibration::{GasCalibration, GasUsageCalibrator};
pub use channel::{
    Channel, ChannelId, ChannelKind, ChannelRegistry, ChannelValue, FlagChannel, GateOutcome,
    Scalar,
};
pub use sink::{
    ChannelUpdate, FlagId, FlagUpdate, JsonLinesSink, LogSink, RecordingSink, StateUpdate,
    TelemetrySink,
};
