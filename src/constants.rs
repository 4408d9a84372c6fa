//! Intergas Service-Port Constants
//!
//! Command strings, fixed frame layouts and physical constants of the
//! Intergas HRE service port. Offsets are byte indices into the response
//! buffer; two-byte quantities are stored LSB first.

// ----------------------------------------------------------------------------
// Commands (ASCII, terminated by carriage return)
// ----------------------------------------------------------------------------

pub const CMD_PRODUCT_CODE: &str = "B?\r";
pub const CMD_STATUS_1: &str = "S?\r";
pub const CMD_STATUS_2: &str = "S2\r";
pub const CMD_PARAMS: &str = "V?\r";
pub const CMD_SETTINGS: &str = "V1\r";
pub const CMD_STATISTICS: &str = "HN\r";

// ----------------------------------------------------------------------------
// Frame minimum lengths
// ----------------------------------------------------------------------------

/// Minimum S? response length
pub const STATUS_1_MIN_LEN: usize = 25;

/// S? length needed to also carry the flag/fault block (bytes 26..=29)
pub const STATUS_1_TAIL_LEN: usize = 30;

/// Minimum S2 response length
pub const STATUS_2_MIN_LEN: usize = 20;

/// Minimum HN response length
pub const STATISTICS_MIN_LEN: usize = 24;

/// Largest response the transport will buffer
pub const MAX_RESPONSE_LEN: usize = 64;

/// How long the line must stay quiet before stale input counts as drained
pub const STALE_INPUT_QUIET_MS: u64 = 2;

// ----------------------------------------------------------------------------
// Primary status (S?) layout
// ----------------------------------------------------------------------------

pub const S1_BOILER_TEMP: usize = 0;
pub const S1_BOILER_OUT: usize = 2;
pub const S1_BOILER_IN: usize = 4;
pub const S1_HOT_WATER_OUT: usize = 6;
pub const S1_PRESSURE: usize = 12;
pub const S1_TARGET_TEMP: usize = 14;
pub const S1_FAN_TARGET: usize = 16;
pub const S1_FAN_CURRENT: usize = 18;
pub const S1_FAN_DUTY: usize = 20;
pub const S1_IO_CURRENT: usize = 22;
pub const S1_STATUS_CODE: usize = 24;
pub const S1_STATUS_FLAGS: usize = 26;
pub const S1_FAULT_SELECT: usize = 27;
pub const S1_OPERATION_FLAGS: usize = 28;
pub const S1_FAULT_CODE: usize = 29;

/// Byte 27 value marking byte 29 as the active fault
pub const FAULT_ACTIVE_MARKER: u8 = 0x80;

// ----------------------------------------------------------------------------
// Secondary status (S2) layout
// ----------------------------------------------------------------------------

pub const S2_TAP_FLOW: usize = 0;
pub const S2_PUMP_RAW: usize = 2;
pub const S2_ROOM_TARGET: usize = 6;
pub const S2_ROOM_CURRENT: usize = 8;

// ----------------------------------------------------------------------------
// Statistics (HN) layout
// ----------------------------------------------------------------------------

pub const HN_LINE_POWER_CONNECTED: usize = 0;
pub const HN_LINE_POWER_DISCONNECT: usize = 2;
pub const HN_CH_FUNCTION: usize = 4;
pub const HN_DHW_FUNCTION: usize = 6;
pub const HN_BURNER_STARTS: usize = 8;
pub const HN_IGNITION_FAILED: usize = 10;
pub const HN_FLAME_LOST: usize = 12;
pub const HN_RESETS: usize = 14;
pub const HN_GAS_HEATING: usize = 16;
pub const HN_GAS_HOT_WATER: usize = 20;
pub const HN_LINE_POWER_HIGH: usize = 30;
pub const HN_BURNER_STARTS_HIGH: usize = 31;

// ----------------------------------------------------------------------------
// Status byte codes (byte 24 of S?)
// ----------------------------------------------------------------------------

pub const STATUS_CODE_BURNER: u8 = 0x00;
pub const STATUS_CODE_IDLE: u8 = 0x7E;
pub const STATUS_CODE_HOT_WATER: u8 = 0xCC;
pub const STATUS_CODE_SPINDOWN: u8 = 0xE7;

// ----------------------------------------------------------------------------
// Physical constants
// ----------------------------------------------------------------------------

/// Watts per unit of ionisation current (1 cm3 gas = 35.17 J)
pub const GAS_WATT: f64 = 1361.0;

/// Accepted 1-Wire probe range in °C
pub const PROBE_MIN_CELSIUS: f64 = -5.0;
pub const PROBE_MAX_CELSIUS: f64 = 100.0;

/// Number of 1-Wire probes fitted to the installation
pub const PROBE_COUNT: usize = 8;
