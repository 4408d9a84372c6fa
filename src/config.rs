//! # Bridge Configuration
//!
//! Serial settings, poll interval, gas calibration and 1-Wire probe
//! settings, stored as JSON. Every field has a default so a partial file
//! only needs to name what differs.

use crate::constants::{GAS_WATT, PROBE_COUNT};
use crate::error::IntergasError;
use crate::telemetry::calibration::{GasCalibration, GasUsageCalibrator};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Serial port settings. The service port runs 8N1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub port: String,
    pub baudrate: u32,
    /// Wait for the first response byte
    pub response_timeout_ms: u64,
    /// Silence that ends a response
    pub idle_gap_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baudrate: 9600,
            response_timeout_ms: 1000,
            idle_gap_ms: 50,
        }
    }
}

impl SerialSettings {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn idle_gap(&self) -> Duration {
        Duration::from_millis(self.idle_gap_ms)
    }
}

/// Gas counter calibration and the date it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    pub heating: GasCalibration,
    pub hot_water: GasCalibration,
    pub calibrated_on: NaiveDate,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            heating: GasCalibration::HEATING,
            hot_water: GasCalibration::HOT_WATER,
            calibrated_on: NaiveDate::from_ymd_opt(2023, 3, 6).unwrap_or_default(),
        }
    }
}

impl CalibrationSettings {
    pub fn calibrator(&self) -> GasUsageCalibrator {
        GasUsageCalibrator::new(self.heating, self.hot_water)
    }
}

/// 1-Wire probe settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub enabled: bool,
    pub w1_path: PathBuf,
    pub expected_count: usize,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            w1_path: PathBuf::from("/sys/bus/w1/devices"),
            expected_count: PROBE_COUNT,
        }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub serial: SerialSettings,
    pub poll_interval_secs: u64,
    pub gas_watt: f64,
    pub calibration: CalibrationSettings,
    pub sensors: SensorSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            serial: SerialSettings::default(),
            poll_interval_secs: 10,
            gas_watt: GAS_WATT,
            calibration: CalibrationSettings::default(),
            sensors: SensorSettings::default(),
        }
    }
}

impl BridgeConfig {
    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IntergasError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| IntergasError::ConfigError(format!("{}: {e}", path.display())))?;
        let config: BridgeConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IntergasError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)
            .map_err(|e| IntergasError::ConfigError(format!("{}: {e}", path.display())))
    }

    pub fn to_json(&self) -> Result<String, IntergasError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Rejects values the bridge cannot run with.
    pub fn validate(&self) -> Result<(), IntergasError> {
        if self.serial.baudrate == 0 {
            return Err(IntergasError::ConfigError("baudrate must be non-zero".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(IntergasError::ConfigError(
                "poll_interval_secs must be non-zero".into(),
            ));
        }
        for (name, cal) in [
            ("heating", &self.calibration.heating),
            ("hot_water", &self.calibration.hot_water),
        ] {
            if cal.slope == 0.0 || !cal.slope.is_finite() {
                return Err(IntergasError::ConfigError(format!(
                    "calibration.{name}.slope must be a non-zero number"
                )));
            }
        }
        Ok(())
    }
}
