//! # intergas-rs - Telemetry Bridge for Intergas Boilers
//!
//! The intergas-rs crate talks to the service port of an Intergas
//! condensing boiler (HRE / Kombi Kompakt), decodes its binary status
//! responses into validated telemetry channels and forwards them to a sink.
//!
//! ## Features
//!
//! - Query the boiler over a serial port with the `S?`, `S2` and `HN` commands
//! - Decode little-endian fixed-point temperatures, pressure, fan and pump data
//! - Range-gate every reading; an out-of-range value resets its channel and
//!   forces the next valid reading to be published
//! - Derive the operating state (idle, heating, hot water, lock, ...)
//! - Convert the raw gas counters to cubic metres with a two-point calibration
//! - Read the installation's 1-Wire DS18B20 probes
//! - Publish to the log, JSON lines, or an in-memory recorder
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! intergas-rs = "1.0.0"
//! ```
//!
//! Decoding a captured response needs no hardware:
//!
//! ```rust
//! use intergas_rs::{BoilerDecoder, ChannelId, Command, RecordingSink};
//!
//! let mut decoder = BoilerDecoder::default();
//! let mut sink = RecordingSink::new();
//! let frame = [
//!     0xDC, 0x05, 0x64, 0x00, 0x00, 0x00, 0xD0, 0x07, 0x6A, 0x08,
//!     0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
//! ];
//! let outcome = decoder.decode(Command::Status2, &frame, &mut sink).unwrap();
//! assert!(outcome.is_success());
//! assert_eq!(sink.last(ChannelId::RoomCurrent).unwrap().value.as_f64(), 21.54);
//! ```

pub mod bridge;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod sensors;
pub mod serial;
pub mod serial_mock;
pub mod telemetry;
pub mod util;

pub use crate::error::IntergasError;
pub use crate::logging::{init_logger, log_info};

pub use bridge::{BoilerBridge, CommandResult, PollReport};
pub use config::BridgeConfig;
pub use decoder::{BoilerDecoder, DecodeOutcome};
pub use protocol::{BoilerState, Command, DecodedFrame};
pub use sensors::{SensorAddress, SysfsOneWireBus, TemperatureBus, TemperatureProbes};
pub use serial::{BoilerSerialHandle, BoilerTransport};
pub use telemetry::{
    ChannelId, ChannelUpdate, ChannelValue, JsonLinesSink, LogSink, RecordingSink, TelemetrySink,
};

/// Connect to a boiler's service port.
///
/// # Arguments
/// * `settings` - Port name, baud rate and response timing
///
/// # Returns
/// * `Ok(BoilerSerialHandle)` - Open handle ready for requests
/// * `Err(IntergasError)` - The port could not be opened
pub async fn connect(
    settings: &config::SerialSettings,
) -> Result<BoilerSerialHandle, IntergasError> {
    BoilerSerialHandle::connect(settings).await
}
