use thiserror::Error;
use tracing::info;

use crate::anomaly::AnomalyClassifier;
use crate::config::HealthyRanges;
use crate::fault::{FaultKind, MAX_FAULT_DURATION_S};
use crate::generator::TelemetryGenerator;
use crate::preventive::{PreventiveAction, PreventiveMonitor, TrendAnalyzer};
use crate::recovery::{Mode, RecoveryEngine, RecoveryRecord, RecoveryStatus};
use crate::telemetry::{CriticalReading, DownlinkView, TelemetryReading};
use crate::timeline::{EventTimeline, TimelineEntry};
use crate::twin::DigitalTwin;

pub const DEFAULT_TICK_PERIOD_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("unknown fault type: {0}")]
    UnknownFaultType(String),
    #[error("fault duration must be 1..={MAX_FAULT_DURATION_S} seconds, got {0}")]
    InvalidFaultDuration(i64),
    #[error("no telemetry available before the first tick")]
    StateUnavailable,
}

/// What one tick produced, for the host loop's logging and broadcast.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub reading: TelemetryReading,
    pub anomaly_count: usize,
    pub recovery_count: usize,
    pub preventive_count: usize,
}

/// Single-writer autonomy context owning the whole loop.
///
/// `tick` advances the generator, the twin/classifier/recovery pipeline,
/// and the preventive monitor in one `&mut self` call, so a host that
/// guards the agent behind one lock gets pre-tick or post-tick state from
/// every query, never a partially updated view. Nothing in here blocks on
/// I/O.
pub struct SatelliteAgent {
    generator: TelemetryGenerator,
    twin: DigitalTwin,
    classifier: AnomalyClassifier,
    recovery: RecoveryEngine,
    monitor: PreventiveMonitor,
    timeline: EventTimeline,
    tick_period_ms: u64,
    sim_time_ms: u64,
    tick_count: u64,
}

impl SatelliteAgent {
    pub fn new() -> Self {
        Self::with_tick_period(DEFAULT_TICK_PERIOD_MS)
    }

    pub fn with_tick_period(tick_period_ms: u64) -> Self {
        let ranges = HealthyRanges::standard();
        Self {
            generator: TelemetryGenerator::new(),
            twin: DigitalTwin::new(ranges.clone()),
            classifier: AnomalyClassifier::new(ranges),
            recovery: RecoveryEngine::new(),
            monitor: PreventiveMonitor::standard(),
            timeline: EventTimeline::new(),
            tick_period_ms,
            sim_time_ms: 0,
            tick_count: 0,
        }
    }

    /// Advance the whole autonomy loop by one tick.
    pub fn tick(&mut self) -> TickReport {
        self.tick_count += 1;
        self.sim_time_ms += self.tick_period_ms;

        let reading = self.generator.tick(self.sim_time_ms, self.tick_period_ms);
        let twin_report = self.twin.evaluate(&reading);

        let anomalies = self.classifier.classify(reading.timestamp_ms, &twin_report);
        let mut recovery_count = 0;
        for event in &anomalies {
            info!(
                parameter = %event.parameter,
                severity = %event.severity,
                observed = f64::from(event.observed),
                "anomaly detected"
            );
            self.timeline.push(TimelineEntry::Anomaly(event.clone()));
            if let Some(record) = self.recovery.handle_anomaly(event) {
                self.timeline.push(TimelineEntry::Recovery(record));
                recovery_count += 1;
            }
        }

        if let Some(record) = self.recovery.observe_tick(&twin_report, reading.timestamp_ms) {
            info!(mode = %record.resulting_mode, action = %record.action, "mode transition");
            self.timeline.push(TimelineEntry::Recovery(record));
            recovery_count += 1;
        }

        let preventive = self.monitor.scan(self.generator.history());
        for action in &preventive {
            self.timeline.push(TimelineEntry::Preventive(action.clone()));
        }

        TickReport {
            reading,
            anomaly_count: anomalies.len(),
            recovery_count,
            preventive_count: preventive.len(),
        }
    }

    pub fn latest_reading(&self) -> Result<&TelemetryReading, AgentError> {
        self.generator.latest().ok_or(AgentError::StateUnavailable)
    }

    /// Timeline entries, newest-last, optionally bounded to the most
    /// recent `limit`.
    pub fn timeline(&self, limit: Option<usize>) -> &[TimelineEntry] {
        self.timeline.tail(limit)
    }

    pub fn mode(&self) -> Mode {
        self.recovery.current_mode()
    }

    /// Mode-dependent downlink payload. SAFE restricts the frame to the
    /// fixed critical subset; NORMAL and RECOVERED downlink everything.
    pub fn downlink_view(&self) -> Result<DownlinkView, AgentError> {
        let reading = self.latest_reading()?;
        let view = match self.recovery.current_mode() {
            Mode::Safe => DownlinkView::Critical(CriticalReading::from(reading)),
            Mode::Normal | Mode::Recovered => DownlinkView::Full(reading.clone()),
        };
        Ok(view)
    }

    pub fn recovery_status(&self) -> RecoveryStatus {
        self.recovery.status()
    }

    pub fn recovery_history(&self) -> &[RecoveryRecord] {
        self.recovery.history()
    }

    pub fn preventive_actions(&self, limit: Option<usize>) -> &[PreventiveAction] {
        let actions = self.monitor.actions();
        match limit {
            Some(limit) if limit < actions.len() => &actions[actions.len() - limit..],
            _ => actions,
        }
    }

    /// Register a fault override. Rejects unknown types and non-positive or
    /// excessive durations before touching any state.
    pub fn inject_fault(&mut self, fault_type: &str, duration_s: i64) -> Result<FaultKind, AgentError> {
        let kind = FaultKind::parse(fault_type)
            .ok_or_else(|| AgentError::UnknownFaultType(fault_type.to_string()))?;

        if duration_s <= 0 || duration_s > i64::from(MAX_FAULT_DURATION_S) {
            return Err(AgentError::InvalidFaultDuration(duration_s));
        }

        let duration_ms = duration_s as u64 * 1000;
        let duration_ticks = duration_ms.div_ceil(self.tick_period_ms) as u32;
        self.generator.inject_fault(kind, duration_ticks, self.sim_time_ms);

        info!(%kind, duration_s, "fault injected");
        self.timeline.push(TimelineEntry::FaultInjected {
            timestamp_ms: self.sim_time_ms,
            kind,
            duration_s: duration_s as u32,
        });

        Ok(kind)
    }

    /// Extend the preventive monitor without touching the loop.
    pub fn add_analyzer(&mut self, analyzer: Box<dyn TrendAnalyzer>) {
        self.monitor.add_analyzer(analyzer);
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn sim_time_ms(&self) -> u64 {
        self.sim_time_ms
    }
}

impl Default for SatelliteAgent {
    fn default() -> Self {
        Self::new()
    }
}
