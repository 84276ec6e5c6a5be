use heapless::Vec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::anomaly::AnomalyEvent;
use crate::config::{AnomalyCategory, Severity};
use crate::telemetry::{Parameter, MONITORED_PARAMETER_COUNT};
use crate::twin::TwinReport;

/// Consecutive healthy ticks of every triggering parameter required before
/// SAFE relaxes to RECOVERED. A single good sample must never do it.
pub const SAFE_RECOVERY_DWELL_TICKS: u8 = 3;

const MAX_RECOVERY_HISTORY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "SAFE")]
    Safe,
    #[serde(rename = "RECOVERED")]
    Recovered,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Safe => "SAFE",
            Mode::Recovered => "RECOVERED",
        }
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectiveAction {
    /// Reorient toward the sun to restore charge (power safing).
    SunPointing,
    /// Cut payload power to shed heat (thermal safing).
    PayloadShutdown,
    /// Reduce downlink duty cycle; mode is left alone.
    DownlinkThrottle,
    /// SAFE -> RECOVERED: payload brought back up under observation.
    PayloadRestore,
    /// RECOVERED -> NORMAL: full operations resumed.
    ResumeNominalOps,
}

impl core::fmt::Display for CorrectiveAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            CorrectiveAction::SunPointing => "sun-pointing reorientation",
            CorrectiveAction::PayloadShutdown => "payload shutdown",
            CorrectiveAction::DownlinkThrottle => "downlink throttle",
            CorrectiveAction::PayloadRestore => "payload restore",
            CorrectiveAction::ResumeNominalOps => "resume nominal operations",
        };
        f.write_str(text)
    }
}

/// One applied corrective action, appended on every transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub timestamp_ms: u64,
    pub trigger: String,
    pub action: CorrectiveAction,
    pub resulting_mode: Mode,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecoveryStatus {
    pub mode: Mode,
    pub active_strategy: Option<CorrectiveAction>,
}

/// Autonomous NORMAL / SAFE / RECOVERED state machine.
///
/// The engine is the sole owner of the mode. Transitions happen only in
/// response to a critical anomaly or a recovery-condition evaluation;
/// preventive actions never reach this type.
#[derive(Debug)]
pub struct RecoveryEngine {
    mode: Mode,
    active_strategy: Option<CorrectiveAction>,
    radiation_throttle: bool,
    /// Parameters whose anomalies drove the current safing, still unresolved.
    triggering: [bool; MONITORED_PARAMETER_COUNT],
    dwell_ticks: u8,
    history: Vec<RecoveryRecord, MAX_RECOVERY_HISTORY>,
}

impl RecoveryEngine {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            active_strategy: None,
            radiation_throttle: false,
            triggering: [false; MONITORED_PARAMETER_COUNT],
            dwell_ticks: 0,
            history: Vec::new(),
        }
    }

    pub fn current_mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> RecoveryStatus {
        RecoveryStatus {
            mode: self.mode,
            active_strategy: self.active_strategy,
        }
    }

    /// Applied corrective actions, oldest first.
    pub fn history(&self) -> &[RecoveryRecord] {
        &self.history
    }

    /// React to one anomaly event. Returns the record of any corrective
    /// action applied, for the timeline.
    pub fn handle_anomaly(&mut self, event: &AnomalyEvent) -> Option<RecoveryRecord> {
        if event.severity != Severity::Critical {
            return None;
        }

        match event.category {
            AnomalyCategory::Power => self.apply_safing(CorrectiveAction::SunPointing, event),
            AnomalyCategory::Thermal => self.apply_safing(CorrectiveAction::PayloadShutdown, event),
            AnomalyCategory::Radiation => self.apply_throttle(event),
            AnomalyCategory::Uncategorized => {
                // Fail-safe default: no guess, no mode change.
                warn!(
                    parameter = %event.parameter,
                    "critical anomaly with unrecognized category, holding mode"
                );
                None
            }
        }
    }

    /// Per-tick recovery-condition evaluation against the twin report.
    pub fn observe_tick(&mut self, report: &TwinReport, timestamp_ms: u64) -> Option<RecoveryRecord> {
        if self.radiation_throttle && report.is_in_range(Parameter::RadiationRate) {
            info!("radiation back in range, downlink throttle released");
            self.radiation_throttle = false;
            if self.active_strategy == Some(CorrectiveAction::DownlinkThrottle) {
                self.active_strategy = None;
            }
        }

        match self.mode {
            Mode::Normal => None,
            Mode::Safe => {
                let causes_healthy = Parameter::ALL
                    .iter()
                    .filter(|parameter| self.triggering[parameter.index()])
                    .all(|parameter| report.is_in_range(*parameter));

                if causes_healthy {
                    self.dwell_ticks = self.dwell_ticks.saturating_add(1);
                } else {
                    self.dwell_ticks = 0;
                }

                if self.dwell_ticks < SAFE_RECOVERY_DWELL_TICKS {
                    return None;
                }

                self.mode = Mode::Recovered;
                self.dwell_ticks = 0;
                Some(self.record(
                    timestamp_ms,
                    format!(
                        "triggering parameters healthy for {SAFE_RECOVERY_DWELL_TICKS} consecutive ticks"
                    ),
                    CorrectiveAction::PayloadRestore,
                ))
            }
            Mode::Recovered => {
                if !report.all_in_range() {
                    return None;
                }

                self.mode = Mode::Normal;
                self.triggering = [false; MONITORED_PARAMETER_COUNT];
                self.active_strategy = None;
                Some(self.record(
                    timestamp_ms,
                    "stable tick with no active anomaly".to_string(),
                    CorrectiveAction::ResumeNominalOps,
                ))
            }
        }
    }

    fn apply_safing(
        &mut self,
        action: CorrectiveAction,
        event: &AnomalyEvent,
    ) -> Option<RecoveryRecord> {
        let index = event.parameter.index();
        let already_triggering = self.triggering[index];
        self.triggering[index] = true;
        self.dwell_ticks = 0;

        // Idempotent re-safing: identical action for a still-unresolved
        // cause is not logged again.
        if self.mode == Mode::Safe && self.active_strategy == Some(action) && already_triggering {
            return None;
        }

        let previous_mode = self.mode;
        self.mode = Mode::Safe;
        self.active_strategy = Some(action);

        info!(
            from = %previous_mode,
            action = %action,
            parameter = %event.parameter,
            "entering safe mode"
        );

        Some(self.record(event.timestamp_ms, event.description(), action))
    }

    fn apply_throttle(&mut self, event: &AnomalyEvent) -> Option<RecoveryRecord> {
        if self.radiation_throttle {
            return None;
        }
        self.radiation_throttle = true;

        // Radiation alone never safes the satellite; throttle and log only.
        if self.active_strategy.is_none() {
            self.active_strategy = Some(CorrectiveAction::DownlinkThrottle);
        }

        info!(rad_cps = f64::from(event.observed), "radiation critical, throttling downlink");
        Some(self.record(
            event.timestamp_ms,
            event.description(),
            CorrectiveAction::DownlinkThrottle,
        ))
    }

    fn record(
        &mut self,
        timestamp_ms: u64,
        trigger: String,
        action: CorrectiveAction,
    ) -> RecoveryRecord {
        let record = RecoveryRecord {
            timestamp_ms,
            trigger,
            action,
            resulting_mode: self.mode,
        };

        if self.history.is_full() {
            self.history.remove(0);
        }
        let _ = self.history.push(record.clone());

        record
    }
}

impl Default for RecoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}
