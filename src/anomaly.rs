use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::config::{AnomalyCategory, HealthyRanges, Severity};
use crate::telemetry::{Parameter, MONITORED_PARAMETER_COUNT};
use crate::twin::{BoundViolation, TwinReport};

/// A discrete out-of-range event, reported once per violation episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub timestamp_ms: u64,
    pub parameter: Parameter,
    pub observed: f32,
    pub violation: BoundViolation,
    pub severity: Severity,
    pub category: AnomalyCategory,
}

impl AnomalyEvent {
    pub fn description(&self) -> String {
        format!(
            "{} {} anomaly: {} = {:.2}, {}",
            self.severity, self.category, self.parameter, self.observed, self.violation
        )
    }
}

/// Edge-triggered anomaly detection over twin reports.
///
/// A parameter that leaves its healthy range produces exactly one event and
/// latches; the latch re-arms only once the parameter is back in range, so
/// a sustained violation never floods the timeline.
#[derive(Debug)]
pub struct AnomalyClassifier {
    ranges: HealthyRanges,
    latched: [bool; MONITORED_PARAMETER_COUNT],
}

impl AnomalyClassifier {
    pub fn new(ranges: HealthyRanges) -> Self {
        Self {
            ranges,
            latched: [false; MONITORED_PARAMETER_COUNT],
        }
    }

    /// True while the parameter is inside an unresolved violation episode.
    pub fn is_latched(&self, parameter: Parameter) -> bool {
        self.latched[parameter.index()]
    }

    pub fn classify(
        &mut self,
        timestamp_ms: u64,
        report: &TwinReport,
    ) -> Vec<AnomalyEvent, MONITORED_PARAMETER_COUNT> {
        let mut events = Vec::new();

        for check in report.checks() {
            let index = check.parameter.index();
            match check.violation {
                Some(violation) => {
                    if self.latched[index] {
                        continue;
                    }
                    self.latched[index] = true;

                    let spec = self.ranges.spec_for(check.parameter);
                    let severity = match violation {
                        BoundViolation::Below(_) => spec.low_severity,
                        BoundViolation::Above(_) => spec.high_severity,
                    };

                    // Capacity matches the parameter count; push cannot fail.
                    let _ = events.push(AnomalyEvent {
                        timestamp_ms,
                        parameter: check.parameter,
                        observed: check.value,
                        violation,
                        severity,
                        category: spec.category,
                    });
                }
                None => self.latched[index] = false,
            }
        }

        events
    }
}

impl Default for AnomalyClassifier {
    fn default() -> Self {
        Self::new(HealthyRanges::standard())
    }
}
