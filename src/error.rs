//! # Intergas Error Handling
//!
//! This module defines the IntergasError enum, which represents the different error
//! types that can occur in the intergas-rs crate.

use crate::protocol::command::Command;
use thiserror::Error;

/// Represents the different error types that can occur in the Intergas crate.
#[derive(Debug, Error)]
pub enum IntergasError {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// No response byte arrived within the response timeout.
    #[error("Timeout waiting for {0} response")]
    Timeout(Command),

    /// The port reported end of stream before any response byte.
    #[error("Empty response to {0}")]
    EmptyResponse(Command),

    /// The response is shorter than the layout of its command requires.
    #[error("{command} response too short: {length} bytes, need {required}")]
    ShortFrame {
        command: Command,
        length: usize,
        required: usize,
    },

    /// The command is valid on the wire but has no decoder.
    #[error("No decoder for {0} responses")]
    UnsupportedCommand(Command),

    /// The text does not name a known command.
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),

    /// Indicates an error when parsing a frame.
    #[error("Error parsing frame: {0}")]
    FrameParseError(String),

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string")]
    InvalidHexString,

    /// Configuration could not be read, written or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A temperature probe could not be enumerated or read.
    #[error("Sensor error: {0}")]
    SensorError(String),

    /// A catch‑all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}

impl From<std::io::Error> for IntergasError {
    fn from(e: std::io::Error) -> Self {
        IntergasError::SerialPortError(e.to_string())
    }
}

impl From<serde_json::Error> for IntergasError {
    fn from(e: serde_json::Error) -> Self {
        IntergasError::ConfigError(e.to_string())
    }
}

impl From<tokio_serial::Error> for IntergasError {
    fn from(e: tokio_serial::Error) -> Self {
        IntergasError::SerialPortError(e.to_string())
    }
}
