//! # Logging Utilities
//!
//! Hex dumps of raw frames and a rate limiter for errors that repeat on
//! every poll cycle, such as a disconnected serial cable.

use std::time::{Duration, Instant};

/// Log frame data in hex format at debug level, truncated to 64 bytes.
pub fn log_frame_hex(prefix: &str, data: &[u8]) {
    const MAX_LOG_BYTES: usize = 64;

    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let shown = &data[..data.len().min(MAX_LOG_BYTES)];
    let hex_str = crate::util::hex::format_hex_compact(shown);
    if data.len() > MAX_LOG_BYTES {
        log::debug!("{prefix}: {hex_str} ... ({} bytes total)", data.len());
    } else {
        log::debug!("{prefix} ({} bytes): {hex_str}", data.len());
    }
}

/// Rate limiter for repeated log messages.
///
/// Allows `cap` messages per `window`; messages beyond that are counted and
/// reported by the first message of the next window.
#[derive(Debug)]
pub struct LogThrottle {
    window: Duration,
    cap: u32,
    count: u32,
    suppressed: u32,
    t0: Instant,
}

impl LogThrottle {
    pub fn new(window: Duration, cap: u32) -> Self {
        Self {
            window,
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Returns `Some(suppressed)` when the message may be logged, where
    /// `suppressed` is the number of messages dropped since the last one.
    pub fn allow(&mut self) -> Option<u32> {
        let now = Instant::now();
        if now.duration_since(self.t0) > self.window {
            self.t0 = now;
            self.count = 0;
        }

        self.count += 1;
        if self.count <= self.cap {
            Some(std::mem::take(&mut self.suppressed))
        } else {
            self.suppressed += 1;
            None
        }
    }

    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
        self.suppressed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_caps_messages() {
        let mut throttle = LogThrottle::new(Duration::from_secs(60), 2);
        assert_eq!(throttle.allow(), Some(0));
        assert_eq!(throttle.allow(), Some(0));
        assert_eq!(throttle.allow(), None);
        assert_eq!(throttle.allow(), None);
    }

    #[test]
    fn test_throttle_reports_suppressed_after_window() {
        let mut throttle = LogThrottle::new(Duration::from_millis(10), 1);
        assert_eq!(throttle.allow(), Some(0));
        assert_eq!(throttle.allow(), None);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(throttle.allow(), Some(1));
    }

    #[test]
    fn test_log_frame_hex_handles_long_frames() {
        log_frame_hex("S? response", &[0u8; 100]);
        log_frame_hex("S? response", &[]);
    }
}
