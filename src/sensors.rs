//! # 1-Wire Temperature Probes
//!
//! Eight DS18B20 probes around the boiler, bound to bus indices 0..7 at
//! startup. Readings outside -5..=100 °C are read failures: they are not
//! published and, unlike boiler fields, do not reset the probe's channel.

use crate::constants::PROBE_COUNT;
use crate::error::IntergasError;
use crate::telemetry::channel::{Channel, ChannelId, GateOutcome};
use crate::telemetry::sink::{ChannelUpdate, TelemetrySink};
use log::{debug, warn};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// 1-Wire ROM address: family code plus 48-bit serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorAddress {
    pub family: u8,
    pub serial: [u8; 6],
}

impl fmt::Display for SensorAddress {
    /// Linux w1 device name, e.g. `28-0316a2795cff`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}-{}", self.family, hex::encode(self.serial))
    }
}

impl FromStr for SensorAddress {
    type Err = IntergasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IntergasError::SensorError(format!("invalid 1-Wire address {s:?}"));
        let (family, serial) = s.split_once('-').ok_or_else(invalid)?;
        let family = u8::from_str_radix(family, 16).map_err(|_| invalid())?;
        let bytes = hex::decode(serial).map_err(|_| invalid())?;
        let serial: [u8; 6] = bytes.try_into().map_err(|_| invalid())?;
        Ok(SensorAddress { family, serial })
    }
}

/// Temperature bus collaborator.
pub trait TemperatureBus {
    /// Number of devices found on the bus.
    fn device_count(&mut self) -> usize;

    /// Address of the device at `index`, if present.
    fn enumerate_channel(&mut self, index: usize) -> Option<SensorAddress>;

    /// Temperature in °C of the device at `address`.
    fn read_channel(&mut self, address: &SensorAddress) -> Result<f64, IntergasError>;
}

/// DS18B20 probes exposed by the Linux `w1_therm` driver.
#[derive(Debug, Clone)]
pub struct SysfsOneWireBus {
    root: PathBuf,
    devices: Vec<SensorAddress>,
}

/// DS18B20 family code
const DS18B20_FAMILY: u8 = 0x28;

impl SysfsOneWireBus {
    /// Scans `root` (normally `/sys/bus/w1/devices`) for DS18B20 probes,
    /// ordered by address.
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self, IntergasError> {
        let root = root.into();
        let entries = fs::read_dir(&root)
            .map_err(|e| IntergasError::SensorError(format!("{}: {e}", root.display())))?;

        let mut devices: Vec<SensorAddress> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str()?.parse::<SensorAddress>().ok())
            .filter(|addr| addr.family == DS18B20_FAMILY)
            .collect();
        devices.sort();
        debug!("found {} 1-Wire probes under {}", devices.len(), root.display());
        Ok(Self { root, devices })
    }
}

impl TemperatureBus for SysfsOneWireBus {
    fn device_count(&mut self) -> usize {
        self.devices.len()
    }

    fn enumerate_channel(&mut self, index: usize) -> Option<SensorAddress> {
        self.devices.get(index).copied()
    }

    fn read_channel(&mut self, address: &SensorAddress) -> Result<f64, IntergasError> {
        let path = self.root.join(address.to_string()).join("temperature");
        let text = fs::read_to_string(&path)
            .map_err(|e| IntergasError::SensorError(format!("{}: {e}", path.display())))?;
        let millidegrees: i32 = text
            .trim()
            .parse()
            .map_err(|_| IntergasError::SensorError(format!("{address}: bad reading {text:?}")))?;
        Ok(f64::from(millidegrees) / 1000.0)
    }
}

#[derive(Debug, Clone)]
struct ProbeSlot {
    channel: Channel<f64>,
    address: Option<SensorAddress>,
}

/// The installation's probes and their bus bindings.
#[derive(Debug, Clone)]
pub struct TemperatureProbes {
    slots: Vec<ProbeSlot>,
    expected_count: usize,
    diagnostic: Option<String>,
}

impl Default for TemperatureProbes {
    fn default() -> Self {
        Self::new(PROBE_COUNT)
    }
}

impl TemperatureProbes {
    pub fn new(expected_count: usize) -> Self {
        let slots = ChannelId::PROBES
            .iter()
            .map(|&id| ProbeSlot {
                channel: Channel::new(id),
                address: None,
            })
            .collect();
        Self {
            slots,
            expected_count,
            diagnostic: None,
        }
    }

    /// Binds each probe to the bus device with the same index.
    ///
    /// Returns false when a probe has no device; the diagnostic then says
    /// whether the bus reported too few devices or an index was missing.
    pub fn begin<B: TemperatureBus + ?Sized>(&mut self, bus: &mut B) -> bool {
        self.diagnostic = None;
        let found = bus.device_count();
        if found < self.expected_count {
            self.diagnostic = Some(format!(
                "found {found} 1-Wire probes, expected {}",
                self.expected_count
            ));
        }

        let mut result = true;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.address = bus.enumerate_channel(index);
            if slot.address.is_none() {
                result = false;
            }
        }
        if !result && self.diagnostic.is_none() {
            self.diagnostic = Some("one of the probes did not report its address".to_string());
        }
        if let Some(msg) = &self.diagnostic {
            warn!("{msg}");
        }
        result
    }

    /// Reads every bound probe and publishes the accepted readings.
    /// Returns the AND of all probe outcomes.
    pub fn poll<B, S>(&mut self, bus: &mut B, sink: &mut S) -> bool
    where
        B: TemperatureBus + ?Sized,
        S: TelemetrySink + ?Sized,
    {
        self.diagnostic = None;
        let mut result = true;

        for slot in &mut self.slots {
            let id = slot.channel.id();
            let Some(address) = slot.address else {
                result = false;
                continue;
            };
            let reading = match bus.read_channel(&address) {
                Ok(t) if slot.channel.in_range(t) => t,
                Ok(t) => {
                    debug!("{id} ({address}) read {t} °C, outside probe range");
                    result = false;
                    continue;
                }
                Err(e) => {
                    debug!("{id}: {e}");
                    result = false;
                    continue;
                }
            };
            if let GateOutcome::Accepted { changed } = slot.channel.accept(reading) {
                result &= sink.publish(&ChannelUpdate {
                    channel: id,
                    value: reading.into(),
                    changed,
                });
            }
        }

        if !result {
            self.diagnostic = Some("getting one of the probe temperatures failed".to_string());
        }
        result
    }

    pub fn address(&self, id: ChannelId) -> Option<SensorAddress> {
        self.slots
            .iter()
            .find(|s| s.channel.id() == id)
            .and_then(|s| s.address)
    }

    pub fn current(&self, id: ChannelId) -> Option<f64> {
        self.slots
            .iter()
            .find(|s| s.channel.id() == id)
            .map(|s| s.channel.current())
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }
}
