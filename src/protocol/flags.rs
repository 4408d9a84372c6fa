//! Flag bytes of the primary status frame

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Byte 26 of the S? response: inputs and relay outputs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StatusFlags: u8 {
        const OPENTHERM = 1 << 0;
        const CH_CASCADE_RELAY = 1 << 1;
        const ALARM = 1 << 2;
        /// Three-way valve towards the hot-water heat exchanger
        const DWK = 1 << 3;
        const PUMP = 1 << 4;
        const ROOM_THERMOSTAT = 1 << 5;
        const TAP_SWITCH = 1 << 6;
        const GP_SWITCH = 1 << 7;
    }
}

bitflags! {
    /// Byte 28 of the S? response: burner and safety chain.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct OperationFlags: u8 {
        const GRADIENT = 1 << 0;
        /// Anti-cycling lock after a burn cycle
        const BURNER_BLOCK = 1 << 1;
        const PRESSURE_SENSOR = 1 << 2;
        const LOW_WATER_PRESSURE = 1 << 3;
        const CH_OPENTHERM_DISABLED = 1 << 4;
        /// Flame detected on the ionisation electrode
        const IO_SIGNAL = 1 << 5;
        const SPARK = 1 << 6;
        const GAS_VALVE = 1 << 7;
    }
}

impl StatusFlags {
    pub fn alarm(&self) -> bool {
        self.contains(StatusFlags::ALARM)
    }
}

impl OperationFlags {
    pub fn locked(&self) -> bool {
        self.contains(OperationFlags::BURNER_BLOCK)
    }
}
