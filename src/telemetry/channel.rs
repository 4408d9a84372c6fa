//! # Telemetry Channels
//!
//! A channel is one named telemetry slot: the last accepted value, its valid
//! range, and a latch that is set whenever a reading is rejected. Rejection
//! resets the held value to zero and latches the channel, so the next
//! accepted reading is always reported as a change, even when it equals
//! the value held before the glitch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of every telemetry channel the bridge publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelId {
    // S? frame
    BoilerTemp,
    BoilerOutletTemp,
    BoilerInletTemp,
    HotWaterOutletTemp,
    Pressure,
    TargetTemp,
    FanTarget,
    FanCurrent,
    FanDuty,
    Power,
    FaultCode,
    LastFault,
    // S2 frame
    TapFlow,
    PumpDuty,
    RoomTarget,
    RoomCurrent,
    // HN frame
    GasHeating,
    GasHotWater,
    // 1-Wire probes
    WaterIn,
    WaterOut,
    AirIn,
    AirOut,
    Mixed,
    Exhaust,
    CvOut,
    CvIn,
}

/// Numeric representation of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Float,
    Integer,
}

impl ChannelId {
    /// Channels fed by the boiler's service port.
    pub const BOILER: [ChannelId; 18] = [
        ChannelId::BoilerTemp,
        ChannelId::BoilerOutletTemp,
        ChannelId::BoilerInletTemp,
        ChannelId::HotWaterOutletTemp,
        ChannelId::Pressure,
        ChannelId::TargetTemp,
        ChannelId::FanTarget,
        ChannelId::FanCurrent,
        ChannelId::FanDuty,
        ChannelId::Power,
        ChannelId::FaultCode,
        ChannelId::LastFault,
        ChannelId::TapFlow,
        ChannelId::PumpDuty,
        ChannelId::RoomTarget,
        ChannelId::RoomCurrent,
        ChannelId::GasHeating,
        ChannelId::GasHotWater,
    ];

    /// 1-Wire probes in bus index order.
    pub const PROBES: [ChannelId; 8] = [
        ChannelId::WaterIn,
        ChannelId::WaterOut,
        ChannelId::AirIn,
        ChannelId::AirOut,
        ChannelId::Mixed,
        ChannelId::Exhaust,
        ChannelId::CvOut,
        ChannelId::CvIn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChannelId::BoilerTemp => "boiler_temp",
            ChannelId::BoilerOutletTemp => "boiler_outlet_temp",
            ChannelId::BoilerInletTemp => "boiler_inlet_temp",
            ChannelId::HotWaterOutletTemp => "hot_water_outlet_temp",
            ChannelId::Pressure => "pressure",
            ChannelId::TargetTemp => "target_temp",
            ChannelId::FanTarget => "fan_target",
            ChannelId::FanCurrent => "fan_current",
            ChannelId::FanDuty => "fan_duty",
            ChannelId::Power => "power",
            ChannelId::FaultCode => "fault_code",
            ChannelId::LastFault => "last_fault",
            ChannelId::TapFlow => "tap_flow",
            ChannelId::PumpDuty => "pump_duty",
            ChannelId::RoomTarget => "room_target",
            ChannelId::RoomCurrent => "room_current",
            ChannelId::GasHeating => "gas_heating",
            ChannelId::GasHotWater => "gas_hot_water",
            ChannelId::WaterIn => "water_in",
            ChannelId::WaterOut => "water_out",
            ChannelId::AirIn => "air_in",
            ChannelId::AirOut => "air_out",
            ChannelId::Mixed => "mixed",
            ChannelId::Exhaust => "exhaust",
            ChannelId::CvOut => "cv_out",
            ChannelId::CvIn => "cv_in",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ChannelId::Pressure => "bar",
            ChannelId::FanTarget | ChannelId::FanCurrent => "rpm",
            ChannelId::FanDuty | ChannelId::PumpDuty => "%",
            ChannelId::Power => "kW",
            ChannelId::TapFlow => "l/min",
            ChannelId::GasHeating | ChannelId::GasHotWater => "m³",
            ChannelId::FaultCode | ChannelId::LastFault => "",
            _ => "°C",
        }
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            ChannelId::FanTarget
            | ChannelId::FanCurrent
            | ChannelId::FaultCode
            | ChannelId::LastFault => ChannelKind::Integer,
            _ => ChannelKind::Float,
        }
    }

    /// Inclusive valid range as `(min, max)`.
    pub fn range(&self) -> (f64, f64) {
        match self {
            ChannelId::BoilerTemp => (10.0, 100.0),
            ChannelId::BoilerOutletTemp => (20.0, 70.0),
            ChannelId::BoilerInletTemp => (15.0, 70.0),
            ChannelId::HotWaterOutletTemp => (20.0, 70.0),
            ChannelId::Pressure => (0.0, 5.0),
            ChannelId::TargetTemp => (20.0, 70.0),
            // 6500 rpm for an HRE 36/40, 4600 for the 24/18 and 28/24
            ChannelId::FanTarget | ChannelId::FanCurrent => (0.0, 7000.0),
            ChannelId::FanDuty => (0.0, 100.0),
            ChannelId::Power => (0.0, 30.0),
            ChannelId::FaultCode | ChannelId::LastFault => (0.0, 255.0),
            ChannelId::TapFlow => (0.0, 20.0),
            ChannelId::PumpDuty => (0.0, 100.0),
            ChannelId::RoomTarget => (10.0, 30.0),
            ChannelId::RoomCurrent => (10.0, 40.0),
            ChannelId::GasHeating => (0.0, 15_000.0),
            ChannelId::GasHotWater => (0.0, 1_000.0),
            _ => (
                crate::constants::PROBE_MIN_CELSIUS,
                crate::constants::PROBE_MAX_CELSIUS,
            ),
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value carried by a channel update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelValue {
    Integer(u16),
    Float(f64),
}

impl ChannelValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ChannelValue::Integer(v) => f64::from(*v),
            ChannelValue::Float(v) => *v,
        }
    }
}

impl From<f64> for ChannelValue {
    fn from(v: f64) -> Self {
        ChannelValue::Float(v)
    }
}

impl From<u16> for ChannelValue {
    fn from(v: u16) -> Self {
        ChannelValue::Integer(v)
    }
}

impl fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelValue::Integer(v) => write!(f, "{v}"),
            ChannelValue::Float(v) => write!(f, "{v:.2}"),
        }
    }
}

/// Numeric types a channel can hold.
pub trait Scalar: Copy + PartialOrd + fmt::Debug + Into<ChannelValue> {
    /// Sentinel a rejected channel is reset to.
    const ZERO: Self;

    fn from_f64_bound(bound: f64) -> Self;
}

impl Scalar for f64 {
    const ZERO: Self = 0.0;

    fn from_f64_bound(bound: f64) -> Self {
        bound
    }
}

impl Scalar for u16 {
    const ZERO: Self = 0;

    fn from_f64_bound(bound: f64) -> Self {
        bound as u16
    }
}

/// Result of offering a reading to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// In range and stored; `changed` tells the sink whether to transmit.
    Accepted { changed: bool },
    /// Out of range; the channel was reset and latched.
    Rejected,
}

impl GateOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateOutcome::Accepted { .. })
    }

    pub fn changed(&self) -> bool {
        matches!(self, GateOutcome::Accepted { changed: true })
    }
}

/// One telemetry slot with its valid range and latch state.
#[derive(Debug, Clone)]
pub struct Channel<T: Scalar> {
    id: ChannelId,
    min: T,
    max: T,
    current: T,
    latched: bool,
}

impl<T: Scalar> Channel<T> {
    /// Creates a channel with the range registered for `id`. New channels
    /// start latched so their first reading is always reported.
    pub fn new(id: ChannelId) -> Self {
        let (min, max) = id.range();
        Self::with_range(id, T::from_f64_bound(min), T::from_f64_bound(max))
    }

    pub fn with_range(id: ChannelId, min: T, max: T) -> Self {
        Self {
            id,
            min,
            max,
            current: T::ZERO,
            latched: true,
        }
    }

    /// Value gate: stores `value` when `min <= value <= max`, otherwise
    /// resets the channel to zero and latches it.
    pub fn accept(&mut self, value: T) -> GateOutcome {
        if value >= self.min && value <= self.max {
            let changed = self.latched || value != self.current;
            self.current = value;
            self.latched = false;
            GateOutcome::Accepted { changed }
        } else {
            self.reject();
            GateOutcome::Rejected
        }
    }

    /// Resets the channel as if an out-of-range reading arrived.
    pub fn reject(&mut self) {
        self.current = T::ZERO;
        self.latched = true;
    }

    /// Whether `value` lies inside the valid range, without storing it.
    pub fn in_range(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn range(&self) -> (T, T) {
        (self.min, self.max)
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }
}

/// Boolean channel, latched until its first reading.
#[derive(Debug, Clone)]
pub struct FlagChannel {
    current: bool,
    latched: bool,
}

impl Default for FlagChannel {
    fn default() -> Self {
        Self {
            current: false,
            latched: true,
        }
    }
}

impl FlagChannel {
    /// Stores `active`, returning whether it differs from the held state.
    pub fn set(&mut self, active: bool) -> bool {
        let changed = self.latched || active != self.current;
        self.current = active;
        self.latched = false;
        changed
    }

    pub fn current(&self) -> bool {
        self.current
    }
}

/// All boiler channels owned by one decoder instance.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    floats: BTreeMap<ChannelId, Channel<f64>>,
    integers: BTreeMap<ChannelId, Channel<u16>>,
    alarm: FlagChannel,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    /// Creates every boiler channel with its registered range.
    pub fn new() -> Self {
        let mut floats = BTreeMap::new();
        let mut integers = BTreeMap::new();
        for id in ChannelId::BOILER {
            match id.kind() {
                ChannelKind::Float => {
                    floats.insert(id, Channel::new(id));
                }
                ChannelKind::Integer => {
                    integers.insert(id, Channel::new(id));
                }
            }
        }
        Self {
            floats,
            integers,
            alarm: FlagChannel::default(),
        }
    }

    pub fn float(&self, id: ChannelId) -> Option<&Channel<f64>> {
        self.floats.get(&id)
    }

    pub fn float_mut(&mut self, id: ChannelId) -> Option<&mut Channel<f64>> {
        self.floats.get_mut(&id)
    }

    pub fn integer(&self, id: ChannelId) -> Option<&Channel<u16>> {
        self.integers.get(&id)
    }

    pub fn integer_mut(&mut self, id: ChannelId) -> Option<&mut Channel<u16>> {
        self.integers.get_mut(&id)
    }

    pub fn alarm(&self) -> &FlagChannel {
        &self.alarm
    }

    pub fn alarm_mut(&mut self) -> &mut FlagChannel {
        &mut self.alarm
    }

    /// Current value of any registered channel.
    pub fn value(&self, id: ChannelId) -> Option<ChannelValue> {
        match id.kind() {
            ChannelKind::Float => self.float(id).map(|c| c.current().into()),
            ChannelKind::Integer => self.integer(id).map(|c| c.current().into()),
        }
    }

    /// Current values of all channels in identity order.
    pub fn snapshot(&self) -> Vec<(ChannelId, ChannelValue)> {
        let mut values: Vec<_> = self
            .floats
            .values()
            .map(|c| (c.id(), c.current().into()))
            .chain(self.integers.values().map(|c| (c.id(), c.current().into())))
            .collect();
        values.sort_by_key(|(id, _)| *id);
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_range_bounds_are_inclusive() {
        let mut pressure: Channel<f64> = Channel::new(ChannelId::Pressure);
        assert!(pressure.accept(0.0).is_accepted());
        assert!(pressure.accept(5.0).is_accepted());
        assert_eq!(pressure.current(), 5.0);

        assert_eq!(pressure.accept(5.01), GateOutcome::Rejected);
        assert_eq!(pressure.current(), 0.0);
        assert_eq!(pressure.accept(-0.01), GateOutcome::Rejected);

        let mut fan: Channel<u16> = Channel::new(ChannelId::FanTarget);
        assert!(fan.accept(7000).is_accepted());
        assert_eq!(fan.accept(7001), GateOutcome::Rejected);
        assert_eq!(fan.current(), 0);
    }

    #[test]
    fn test_unchanged_value_is_not_a_change() {
        let mut temp: Channel<f64> = Channel::new(ChannelId::BoilerTemp);
        assert_eq!(temp.accept(55.0), GateOutcome::Accepted { changed: true });
        assert_eq!(temp.accept(55.0), GateOutcome::Accepted { changed: false });
        assert_eq!(temp.accept(55.5), GateOutcome::Accepted { changed: true });
    }

    #[test]
    fn test_latch_forces_change_after_rejection() {
        let mut temp: Channel<f64> = Channel::new(ChannelId::BoilerTemp);
        temp.accept(55.0);
        assert_eq!(temp.accept(-50.81), GateOutcome::Rejected);
        assert!(temp.is_latched());
        assert_eq!(temp.accept(55.0), GateOutcome::Accepted { changed: true });
        assert!(!temp.is_latched());
    }

    #[test]
    fn test_latch_forces_change_for_zero() {
        let mut pressure: Channel<f64> = Channel::new(ChannelId::Pressure);
        pressure.accept(0.0);
        assert_eq!(pressure.accept(9.0), GateOutcome::Rejected);
        assert_eq!(pressure.accept(0.0), GateOutcome::Accepted { changed: true });
    }

    #[test]
    fn test_registry_holds_every_boiler_channel() {
        let registry = ChannelRegistry::new();
        for id in ChannelId::BOILER {
            assert!(registry.value(id).is_some(), "missing {id}");
        }
        assert!(registry.value(ChannelId::WaterIn).is_none());
        assert_eq!(registry.snapshot().len(), ChannelId::BOILER.len());
        assert_eq!(registry.integer(ChannelId::FanTarget).unwrap().range(), (0, 7000));
    }

    #[test]
    fn test_flag_channel() {
        let mut alarm = FlagChannel::default();
        assert!(alarm.set(false));
        assert!(!alarm.set(false));
        assert!(alarm.set(true));
        assert!(alarm.current());
    }

    proptest! {
        #[test]
        fn prop_gate_stores_only_in_range(value in -100.0f64..200.0) {
            let mut temp: Channel<f64> = Channel::new(ChannelId::BoilerTemp);
            let outcome = temp.accept(value);
            if (10.0..=100.0).contains(&value) {
                prop_assert!(outcome.is_accepted());
                prop_assert_eq!(temp.current(), value);
            } else {
                prop_assert_eq!(outcome, GateOutcome::Rejected);
                prop_assert_eq!(temp.current(), 0.0);
            }
        }

        #[test]
        fn prop_first_reading_after_rejection_is_change(value in 10.0f64..=100.0) {
            let mut temp: Channel<f64> = Channel::new(ChannelId::BoilerTemp);
            temp.accept(value);
            temp.accept(1000.0);
            prop_assert_eq!(temp.accept(value), GateOutcome::Accepted { changed: true });
        }
    }
}
