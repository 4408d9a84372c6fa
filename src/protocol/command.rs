//! Service-port commands
//!
//! The boiler only ever answers a request, so the command that was sent is
//! the sole indication of which layout the response follows.

use crate::constants::*;
use crate::error::IntergasError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A request understood by the boiler's service port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// `B?` product code
    ProductCode,
    /// `S?` primary status
    Status1,
    /// `S2` secondary status
    Status2,
    /// `V?` parameters
    Params,
    /// `V1` settings
    Settings,
    /// `HN` lifetime statistics
    Statistics,
}

impl Command {
    /// Commands issued on every poll cycle, in order.
    pub const POLLED: [Command; 3] = [Command::Status1, Command::Status2, Command::Statistics];

    /// Wire form including the terminating carriage return.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::ProductCode => CMD_PRODUCT_CODE,
            Command::Status1 => CMD_STATUS_1,
            Command::Status2 => CMD_STATUS_2,
            Command::Params => CMD_PARAMS,
            Command::Settings => CMD_SETTINGS,
            Command::Statistics => CMD_STATISTICS,
        }
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Two-letter mnemonic without the carriage return.
    pub fn mnemonic(&self) -> &'static str {
        self.as_str().trim_end_matches('\r')
    }

    /// Minimum response length for commands that have a decoder.
    pub fn min_response_len(&self) -> Option<usize> {
        match self {
            Command::Status1 => Some(STATUS_1_MIN_LEN),
            Command::Status2 => Some(STATUS_2_MIN_LEN),
            Command::Statistics => Some(STATISTICS_MIN_LEN),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Command {
    type Err = IntergasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.trim_end_matches(['\r', '\n']).trim();
        [
            Command::ProductCode,
            Command::Status1,
            Command::Status2,
            Command::Params,
            Command::Settings,
            Command::Statistics,
        ]
        .into_iter()
        .find(|c| c.mnemonic().eq_ignore_ascii_case(bare))
        .ok_or_else(|| IntergasError::UnknownCommand(s.to_string()))
    }
}
