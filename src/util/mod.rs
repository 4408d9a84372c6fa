//! # Utility Modules
//!
//! Hex helpers for captured frames and logging helpers shared by the
//! decoder and the bridge.

pub mod hex;
pub mod logging;

pub use hex::{decode_hex, encode_hex, format_hex_compact};
pub use logging::{log_frame_hex, LogThrottle};
