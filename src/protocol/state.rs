//! # Boiler Operating State
//!
//! Derives the operating state from one primary status frame. The burner
//! block flag overrides everything; otherwise the status byte (byte 24) is
//! looked up in a fixed code table, with the fan target breaking the tie
//! for code 0x00.

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known values of the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// 0x00: heat requested; burning or waiting for the return to cool down
    Burner,
    /// 0x7E: temperature reached
    Idle,
    /// 0xCC: hot-water demand
    HotWater,
    /// 0xE7: pump overrun after a burn cycle
    Spindown,
    /// Any code not in the table
    Unrecognized(u8),
}

impl From<u8> for StatusCode {
    fn from(byte: u8) -> Self {
        match byte {
            STATUS_CODE_BURNER => StatusCode::Burner,
            STATUS_CODE_IDLE => StatusCode::Idle,
            STATUS_CODE_HOT_WATER => StatusCode::HotWater,
            STATUS_CODE_SPINDOWN => StatusCode::Spindown,
            other => StatusCode::Unrecognized(other),
        }
    }
}

impl From<StatusCode> for u8 {
    fn from(code: StatusCode) -> Self {
        match code {
            StatusCode::Burner => STATUS_CODE_BURNER,
            StatusCode::Idle => STATUS_CODE_IDLE,
            StatusCode::HotWater => STATUS_CODE_HOT_WATER,
            StatusCode::Spindown => STATUS_CODE_SPINDOWN,
            StatusCode::Unrecognized(byte) => byte,
        }
    }
}

/// Operating state of the boiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoilerState {
    #[default]
    Unknown,
    Idle,
    Standby,
    Spindown,
    Lock,
    Heating,
    HotWater,
}

impl BoilerState {
    /// Published label for the known states.
    pub fn label(&self) -> &'static str {
        match self {
            BoilerState::Unknown => "unknown",
            BoilerState::Idle => "idle",
            BoilerState::Standby => "standby",
            BoilerState::Spindown => "spindown",
            BoilerState::Lock => "lock",
            BoilerState::Heating => "heating",
            BoilerState::HotWater => "hot_water",
        }
    }
}

impl fmt::Display for BoilerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A derived state together with the label to publish for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReading {
    pub state: BoilerState,
    pub label: String,
}

/// Derives the operating state from the lock flag, the raw status byte and
/// the commanded fan speed of the same frame. First match wins.
pub fn derive_state(locked: bool, status: StatusCode, fan_target: u16) -> StateReading {
    let state = if locked {
        BoilerState::Lock
    } else {
        match status {
            StatusCode::Idle => BoilerState::Idle,
            StatusCode::Spindown => BoilerState::Spindown,
            StatusCode::Burner if fan_target > 0 => BoilerState::Heating,
            StatusCode::Burner => BoilerState::Standby,
            StatusCode::HotWater => BoilerState::HotWater,
            StatusCode::Unrecognized(byte) => {
                return StateReading {
                    state: BoilerState::Unknown,
                    label: format!("code 0x{byte:x}"),
                };
            }
        }
    };

    StateReading {
        state,
        label: state.label().to_string(),
    }
}
