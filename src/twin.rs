use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::config::HealthyRanges;
use crate::telemetry::{Parameter, TelemetryReading, MONITORED_PARAMETER_COUNT};

/// Which healthy bound a value escaped, carrying the bound itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundViolation {
    Below(f32),
    Above(f32),
}

impl core::fmt::Display for BoundViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BoundViolation::Below(bound) => write!(f, "below minimum {bound}"),
            BoundViolation::Above(bound) => write!(f, "above maximum {bound}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParameterCheck {
    pub parameter: Parameter,
    pub value: f32,
    pub violation: Option<BoundViolation>,
}

impl ParameterCheck {
    pub fn in_range(&self) -> bool {
        self.violation.is_none()
    }
}

/// Result of comparing one reading against the expectation table. Contains
/// exactly the parameters with a defined healthy range.
#[derive(Debug, Clone)]
pub struct TwinReport {
    checks: Vec<ParameterCheck, MONITORED_PARAMETER_COUNT>,
}

impl TwinReport {
    pub fn checks(&self) -> &[ParameterCheck] {
        &self.checks
    }

    pub fn check_for(&self, parameter: Parameter) -> Option<&ParameterCheck> {
        self.checks.iter().find(|check| check.parameter == parameter)
    }

    pub fn is_in_range(&self, parameter: Parameter) -> bool {
        self.check_for(parameter).is_some_and(ParameterCheck::in_range)
    }

    pub fn all_in_range(&self) -> bool {
        self.checks.iter().all(ParameterCheck::in_range)
    }

    pub fn violations(&self) -> impl Iterator<Item = &ParameterCheck> {
        self.checks.iter().filter(|check| !check.in_range())
    }
}

/// Stateless comparison of readings against the healthy-range table.
#[derive(Debug, Clone, Default)]
pub struct DigitalTwin {
    ranges: HealthyRanges,
}

impl DigitalTwin {
    pub fn new(ranges: HealthyRanges) -> Self {
        Self { ranges }
    }

    pub fn standard() -> Self {
        Self::new(HealthyRanges::standard())
    }

    pub fn ranges(&self) -> &HealthyRanges {
        &self.ranges
    }

    /// Pure function of the reading and the static table; no side effects.
    pub fn evaluate(&self, reading: &TelemetryReading) -> TwinReport {
        let mut checks = Vec::new();

        for spec in self.ranges.specs() {
            let value = reading.value_of(spec.parameter);
            let violation = if value < spec.range.min {
                Some(BoundViolation::Below(spec.range.min))
            } else if value > spec.range.max {
                Some(BoundViolation::Above(spec.range.max))
            } else {
                None
            };

            // Capacity equals the table size; push cannot fail.
            let _ = checks.push(ParameterCheck {
                parameter: spec.parameter,
                value,
                violation,
            });
        }

        TwinReport { checks }
    }
}
