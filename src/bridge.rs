//! # Boiler Bridge
//!
//! Drives one poll cycle after another: query the boiler over its transport,
//! decode each response into the channel registry, sweep the 1-Wire probes
//! and hand every accepted value to the telemetry sink.

use crate::config::BridgeConfig;
use crate::decoder::BoilerDecoder;
use crate::protocol::command::Command;
use crate::sensors::{TemperatureBus, TemperatureProbes};
use crate::serial::BoilerTransport;
use crate::telemetry::sink::TelemetrySink;
use crate::util::logging::LogThrottle;
use serde::Serialize;
use std::time::Duration;

/// Result of one command within a poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResult {
    pub command: Command,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollReport {
    pub commands: Vec<CommandResult>,
    /// Probe sweep outcome; `None` when no bus is attached
    pub probes: Option<bool>,
    pub diagnostics: Vec<String>,
}

impl PollReport {
    pub fn is_success(&self) -> bool {
        self.commands.iter().all(|c| c.success) && self.probes.unwrap_or(true)
    }

    pub fn result(&self, command: Command) -> Option<&CommandResult> {
        self.commands.iter().find(|c| c.command == command)
    }
}

struct ProbeBus {
    probes: TemperatureProbes,
    bus: Box<dyn TemperatureBus + Send>,
}

/// Polls one boiler and its probes into a telemetry sink.
pub struct BoilerBridge<T: BoilerTransport, S: TelemetrySink> {
    transport: T,
    sink: S,
    decoder: BoilerDecoder,
    probes: Option<ProbeBus>,
    poll_interval: Duration,
    error_throttle: LogThrottle,
}

impl<T: BoilerTransport, S: TelemetrySink> BoilerBridge<T, S> {
    pub fn new(transport: T, sink: S, config: &BridgeConfig) -> Self {
        BoilerBridge {
            transport,
            sink,
            decoder: BoilerDecoder::new(config.calibration.calibrator(), config.gas_watt),
            probes: None,
            poll_interval: config.poll_interval(),
            error_throttle: LogThrottle::new(Duration::from_secs(300), 5),
        }
    }

    /// Attaches a probe bus and binds the probes to it.
    ///
    /// Returns false when not every probe was found; the bridge still polls
    /// the probes that were.
    pub fn attach_probes(
        &mut self,
        mut bus: Box<dyn TemperatureBus + Send>,
        expected: usize,
    ) -> bool {
        let mut probes = TemperatureProbes::new(expected);
        let bound = probes.begin(bus.as_mut());
        self.probes = Some(ProbeBus { probes, bus });
        bound
    }

    pub fn decoder(&self) -> &BoilerDecoder {
        &self.decoder
    }

    pub fn probes(&self) -> Option<&TemperatureProbes> {
        self.probes.as_ref().map(|p| &p.probes)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Runs one cycle: S?, S2 and HN in that order, then the probe sweep.
    ///
    /// A failing command does not stop the cycle.
    pub async fn poll_once(&mut self) -> PollReport {
        let mut report = PollReport::default();

        for command in Command::POLLED {
            let result = match self.transport.request(command).await {
                Ok(data) => match self.decoder.decode(command, &data, &mut self.sink) {
                    Ok(outcome) => CommandResult {
                        command,
                        success: outcome.is_success(),
                        error: self.decoder.diagnostic().map(str::to_string),
                    },
                    Err(e) => CommandResult {
                        command,
                        success: false,
                        error: Some(e.to_string()),
                    },
                },
                Err(e) => CommandResult {
                    command,
                    success: false,
                    error: Some(e.to_string()),
                },
            };
            if let Some(err) = &result.error {
                report.diagnostics.push(err.clone());
            }
            report.commands.push(result);
        }

        if let Some(ProbeBus { probes, bus }) = &mut self.probes {
            let ok = probes.poll(bus.as_mut(), &mut self.sink);
            if let Some(msg) = probes.diagnostic() {
                report.diagnostics.push(msg.to_string());
            }
            report.probes = Some(ok);
        }

        self.log_report(&report);
        report
    }

    /// Polls forever at the configured interval.
    pub async fn run(&mut self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        log::info!("polling every {:?}", self.poll_interval);

        loop {
            interval.tick().await;
            self.poll_once().await;
        }
    }

    fn log_report(&mut self, report: &PollReport) {
        if report.is_success() {
            self.error_throttle.reset();
            log::debug!("poll cycle ok");
            return;
        }
        match self.error_throttle.allow() {
            Some(0) => log::warn!("poll cycle failed: {}", report.diagnostics.join("; ")),
            Some(suppressed) => log::warn!(
                "poll cycle failed: {} ({suppressed} similar messages suppressed)",
                report.diagnostics.join("; ")
            ),
            None => {}
        }
    }
}
