use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::Severity;
use crate::telemetry::TelemetryReading;

/// Lookback window of the battery trend analyzer.
pub const BATTERY_TREND_SAMPLES: usize = 5;
/// Voltage must still be above the safing threshold for the battery trend
/// to count as "early" warning.
pub const BATTERY_TREND_FLOOR_V: f32 = 6.6;

pub const THERMAL_RATE_LIMIT_C_PER_MIN: f32 = 2.0;
pub const THERMAL_EARLY_CEILING_C: f32 = 45.0;

pub const RADIATION_ELEVATED_MIN_CPS: f32 = 10.0;
pub const RADIATION_ELEVATED_MAX_CPS: f32 = 50.0;

const MAX_PREVENTIVE_LOG: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendKind {
    #[serde(rename = "BATTERY_TREND")]
    BatteryTrend,
    #[serde(rename = "THERMAL_TREND")]
    ThermalTrend,
    #[serde(rename = "RADIATION_TREND")]
    RadiationTrend,
}

impl core::fmt::Display for TrendKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            TrendKind::BatteryTrend => "BATTERY_TREND",
            TrendKind::ThermalTrend => "THERMAL_TREND",
            TrendKind::RadiationTrend => "RADIATION_TREND",
        };
        f.write_str(name)
    }
}

/// An early warning emitted before a hard threshold is crossed. Never
/// alters the satellite mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreventiveAction {
    pub timestamp_ms: u64,
    pub kind: TrendKind,
    pub description: String,
    pub snapshot: TelemetryReading,
    pub severity: Severity,
}

impl PreventiveAction {
    fn new(kind: TrendKind, description: String, snapshot: &TelemetryReading) -> Self {
        Self {
            timestamp_ms: snapshot.timestamp_ms,
            kind,
            description,
            snapshot: snapshot.clone(),
            severity: Severity::Warning,
        }
    }
}

#[derive(Debug, Error)]
#[error("analyzer {analyzer} failed: {reason}")]
pub struct AnalyzerError {
    pub analyzer: &'static str,
    pub reason: String,
}

/// A read-only inspector over the rolling telemetry history.
///
/// Implementations get no access to the satellite mode, by construction.
/// New analyzers (a learned model included) plug in here without touching
/// the control loop.
pub trait TrendAnalyzer: Send {
    fn name(&self) -> &'static str;

    fn inspect(
        &self,
        history: &[TelemetryReading],
    ) -> Result<Option<PreventiveAction>, AnalyzerError>;
}

/// Flags a battery discharging monotonically while voltage is still healthy.
#[derive(Debug, Default)]
pub struct BatteryTrendAnalyzer;

impl TrendAnalyzer for BatteryTrendAnalyzer {
    fn name(&self) -> &'static str {
        "battery-trend"
    }

    fn inspect(
        &self,
        history: &[TelemetryReading],
    ) -> Result<Option<PreventiveAction>, AnalyzerError> {
        if history.len() < BATTERY_TREND_SAMPLES {
            return Ok(None);
        }

        let window = &history[history.len() - BATTERY_TREND_SAMPLES..];
        let strictly_decreasing = window
            .windows(2)
            .all(|pair| pair[1].battery_voltage_v < pair[0].battery_voltage_v);

        let latest = &window[BATTERY_TREND_SAMPLES - 1];
        if !strictly_decreasing || latest.battery_voltage_v <= BATTERY_TREND_FLOOR_V {
            return Ok(None);
        }

        let description = format!(
            "battery voltage fell across {} consecutive samples ({:.2} V -> {:.2} V) while still above {:.1} V",
            BATTERY_TREND_SAMPLES,
            window[0].battery_voltage_v,
            latest.battery_voltage_v,
            BATTERY_TREND_FLOOR_V
        );
        Ok(Some(PreventiveAction::new(
            TrendKind::BatteryTrend,
            description,
            latest,
        )))
    }
}

/// Flags a fast payload temperature climb before it gets hot enough to safe.
#[derive(Debug, Default)]
pub struct ThermalTrendAnalyzer;

impl TrendAnalyzer for ThermalTrendAnalyzer {
    fn name(&self) -> &'static str {
        "thermal-trend"
    }

    fn inspect(
        &self,
        history: &[TelemetryReading],
    ) -> Result<Option<PreventiveAction>, AnalyzerError> {
        if history.len() < 2 {
            return Ok(None);
        }

        let window_start = history.len().saturating_sub(5);
        let window = &history[window_start..];
        let first = &window[0];
        let latest = &window[window.len() - 1];

        let elapsed_min = (latest.timestamp_ms.saturating_sub(first.timestamp_ms)) as f32 / 60_000.0;
        if elapsed_min <= 0.0 {
            return Ok(None);
        }

        let rate = (latest.payload_temp_c - first.payload_temp_c) / elapsed_min;
        if rate <= THERMAL_RATE_LIMIT_C_PER_MIN || latest.payload_temp_c >= THERMAL_EARLY_CEILING_C {
            return Ok(None);
        }

        let description = format!(
            "payload temperature climbing at {rate:.1} C/min, currently {:.1} C",
            latest.payload_temp_c
        );
        Ok(Some(PreventiveAction::new(
            TrendKind::ThermalTrend,
            description,
            latest,
        )))
    }
}

/// Flags elevated but sub-critical radiation.
#[derive(Debug, Default)]
pub struct RadiationTrendAnalyzer;

impl TrendAnalyzer for RadiationTrendAnalyzer {
    fn name(&self) -> &'static str {
        "radiation-trend"
    }

    fn inspect(
        &self,
        history: &[TelemetryReading],
    ) -> Result<Option<PreventiveAction>, AnalyzerError> {
        let Some(latest) = history.last() else {
            return Ok(None);
        };

        if latest.rad_cps <= RADIATION_ELEVATED_MIN_CPS
            || latest.rad_cps >= RADIATION_ELEVATED_MAX_CPS
        {
            return Ok(None);
        }

        let description = format!("radiation elevated at {:.1} cps, below spike ceiling", latest.rad_cps);
        Ok(Some(PreventiveAction::new(
            TrendKind::RadiationTrend,
            description,
            latest,
        )))
    }
}

/// Runs the analyzer collection once per tick, isolating failures.
pub struct PreventiveMonitor {
    analyzers: Vec<Box<dyn TrendAnalyzer>>,
    last_description: Vec<Option<String>>,
    log: heapless::Vec<PreventiveAction, MAX_PREVENTIVE_LOG>,
}

impl PreventiveMonitor {
    pub fn with_analyzers(analyzers: Vec<Box<dyn TrendAnalyzer>>) -> Self {
        let count = analyzers.len();
        Self {
            analyzers,
            last_description: vec![None; count],
            log: heapless::Vec::new(),
        }
    }

    /// The flight set: battery, thermal, radiation.
    pub fn standard() -> Self {
        Self::with_analyzers(vec![
            Box::new(BatteryTrendAnalyzer),
            Box::new(ThermalTrendAnalyzer),
            Box::new(RadiationTrendAnalyzer),
        ])
    }

    pub fn add_analyzer(&mut self, analyzer: Box<dyn TrendAnalyzer>) {
        self.analyzers.push(analyzer);
        self.last_description.push(None);
    }

    /// Inspect the rolling history with every analyzer. A failing analyzer
    /// is logged and skipped; it never blocks the others or the tick.
    ///
    /// Policy choice: a repeat of the exact same message from the same
    /// analyzer is suppressed to keep the timeline readable. Duplicate
    /// warnings with changed values still come through.
    pub fn scan(&mut self, history: &[TelemetryReading]) -> Vec<PreventiveAction> {
        let mut emitted = Vec::new();

        for (index, analyzer) in self.analyzers.iter().enumerate() {
            match analyzer.inspect(history) {
                Ok(Some(action)) => {
                    if self.last_description[index].as_deref() == Some(action.description.as_str()) {
                        continue;
                    }
                    self.last_description[index] = Some(action.description.clone());

                    if self.log.is_full() {
                        self.log.remove(0);
                    }
                    let _ = self.log.push(action.clone());
                    emitted.push(action);
                }
                Ok(None) => {
                    self.last_description[index] = None;
                }
                Err(error) => {
                    warn!(%error, "trend analyzer failed, continuing without it this tick");
                }
            }
        }

        emitted
    }

    /// Everything emitted so far, oldest first.
    pub fn actions(&self) -> &[PreventiveAction] {
        &self.log
    }
}

impl Default for PreventiveMonitor {
    fn default() -> Self {
        Self::standard()
    }
}
