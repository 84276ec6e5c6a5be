use serde::{Deserialize, Serialize};

use crate::telemetry::{Parameter, MONITORED_PARAMETER_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recovery routing category for an anomaly.
///
/// `Uncategorized` never appears in the standard table; it exists so the
/// recovery engine has a defined fail-safe path for events produced outside
/// the table (logged, no mode change).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyCategory {
    Power,
    Thermal,
    Radiation,
    Uncategorized,
}

impl core::fmt::Display for AnomalyCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            AnomalyCategory::Power => "power",
            AnomalyCategory::Thermal => "thermal",
            AnomalyCategory::Radiation => "radiation",
            AnomalyCategory::Uncategorized => "uncategorized",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthyRange {
    pub min: f32,
    pub max: f32,
}

impl HealthyRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Per-parameter expectation: healthy range plus the fixed severity rule
/// applied when the lower or upper bound is violated.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    pub parameter: Parameter,
    pub range: HealthyRange,
    pub low_severity: Severity,
    pub high_severity: Severity,
    pub category: AnomalyCategory,
}

/// The digital twin's expectation table, loaded once at startup.
#[derive(Debug, Clone)]
pub struct HealthyRanges {
    specs: [ParameterSpec; MONITORED_PARAMETER_COUNT],
}

impl HealthyRanges {
    /// Standard flight table. The 80 cps radiation ceiling is the spike
    /// limit; the 0.1-5 cps quiet band is watched by the preventive
    /// monitor, not the twin.
    pub fn standard() -> Self {
        use AnomalyCategory::{Power, Radiation, Thermal};
        use Severity::{Critical, Warning};

        let spec = |parameter, min, max, low, high, category| ParameterSpec {
            parameter,
            range: HealthyRange::new(min, max),
            low_severity: low,
            high_severity: high,
            category,
        };

        Self {
            specs: [
                spec(Parameter::BatteryVoltage, 6.6, 8.4, Critical, Warning, Power),
                spec(Parameter::BatterySoc, 20.0, 100.0, Critical, Warning, Power),
                spec(Parameter::Bus5V, 4.9, 5.1, Warning, Warning, Power),
                spec(Parameter::Bus3V3, 3.25, 3.40, Warning, Warning, Power),
                spec(Parameter::BatteryTemp, -5.0, 45.0, Warning, Critical, Thermal),
                spec(Parameter::ObcBoardTemp, 0.0, 60.0, Warning, Critical, Thermal),
                spec(Parameter::PayloadTemp, -10.0, 55.0, Warning, Critical, Thermal),
                spec(Parameter::PanelTemp, -50.0, 60.0, Warning, Warning, Thermal),
                spec(Parameter::RadiationRate, 0.0, 80.0, Warning, Critical, Radiation),
            ],
        }
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    pub fn spec_for(&self, parameter: Parameter) -> &ParameterSpec {
        &self.specs[parameter.index()]
    }
}

impl Default for HealthyRanges {
    fn default() -> Self {
        Self::standard()
    }
}
