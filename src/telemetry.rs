use serde::{Deserialize, Serialize};

use crate::fault::FaultKind;

/// Electrical power system mode, derived from the battery state of charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpsMode {
    #[serde(rename = "NOMINAL")]
    Nominal,
    #[serde(rename = "LOW_POWER")]
    LowPower,
    #[serde(rename = "FULL_CHARGE")]
    FullCharge,
}

pub const MONITORED_PARAMETER_COUNT: usize = 9;

/// Telemetry parameters the digital twin holds a healthy range for.
///
/// Solar array and payload power are intentionally absent: they have no
/// defined healthy range and must never appear in a twin report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "battery_voltage_v")]
    BatteryVoltage,
    #[serde(rename = "battery_soc_pct")]
    BatterySoc,
    #[serde(rename = "bus_5v_v")]
    Bus5V,
    #[serde(rename = "bus_3v3_v")]
    Bus3V3,
    #[serde(rename = "battery_temp_c")]
    BatteryTemp,
    #[serde(rename = "obc_board_temp_c")]
    ObcBoardTemp,
    #[serde(rename = "payload_temp_c")]
    PayloadTemp,
    #[serde(rename = "panel_temp_c")]
    PanelTemp,
    #[serde(rename = "rad_cps")]
    RadiationRate,
}

impl Parameter {
    pub const ALL: [Parameter; MONITORED_PARAMETER_COUNT] = [
        Parameter::BatteryVoltage,
        Parameter::BatterySoc,
        Parameter::Bus5V,
        Parameter::Bus3V3,
        Parameter::BatteryTemp,
        Parameter::ObcBoardTemp,
        Parameter::PayloadTemp,
        Parameter::PanelTemp,
        Parameter::RadiationRate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Parameter::BatteryVoltage => "battery_voltage_v",
            Parameter::BatterySoc => "battery_soc_pct",
            Parameter::Bus5V => "bus_5v_v",
            Parameter::Bus3V3 => "bus_3v3_v",
            Parameter::BatteryTemp => "battery_temp_c",
            Parameter::ObcBoardTemp => "obc_board_temp_c",
            Parameter::PayloadTemp => "payload_temp_c",
            Parameter::PanelTemp => "panel_temp_c",
            Parameter::RadiationRate => "rad_cps",
        }
    }

    /// Dense index for per-parameter bookkeeping arrays.
    pub fn index(self) -> usize {
        match self {
            Parameter::BatteryVoltage => 0,
            Parameter::BatterySoc => 1,
            Parameter::Bus5V => 2,
            Parameter::Bus3V3 => 3,
            Parameter::BatteryTemp => 4,
            Parameter::ObcBoardTemp => 5,
            Parameter::PayloadTemp => 6,
            Parameter::PanelTemp => 7,
            Parameter::RadiationRate => 8,
        }
    }
}

impl core::fmt::Display for Parameter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable telemetry snapshot, produced once per tick by the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryReading {
    /// Mission-elapsed time in milliseconds.
    pub timestamp_ms: u64,

    // Power / EPS
    pub battery_voltage_v: f32,
    pub battery_current_a: f32,
    pub battery_soc_pct: f32,
    pub bus_5v_v: f32,
    pub bus_3v3_v: f32,
    pub solar_array_power_w: f32,
    pub payload_power_w: f32,
    pub eps_mode: EpsMode,

    // Thermal
    pub battery_temp_c: f32,
    pub obc_board_temp_c: f32,
    pub payload_temp_c: f32,
    pub panel_temp_c: f32,

    // Radiation
    pub rad_cps: f32,

    /// Fault override in effect when this reading was generated.
    pub active_fault: Option<FaultKind>,
}

impl TelemetryReading {
    pub fn value_of(&self, parameter: Parameter) -> f32 {
        match parameter {
            Parameter::BatteryVoltage => self.battery_voltage_v,
            Parameter::BatterySoc => self.battery_soc_pct,
            Parameter::Bus5V => self.bus_5v_v,
            Parameter::Bus3V3 => self.bus_3v3_v,
            Parameter::BatteryTemp => self.battery_temp_c,
            Parameter::ObcBoardTemp => self.obc_board_temp_c,
            Parameter::PayloadTemp => self.payload_temp_c,
            Parameter::PanelTemp => self.panel_temp_c,
            Parameter::RadiationRate => self.rad_cps,
        }
    }
}

/// Fixed SAFE-mode downlink subset: battery health and the temperatures
/// needed to judge whether safing is still warranted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalReading {
    pub timestamp_ms: u64,
    pub battery_voltage_v: f32,
    pub battery_soc_pct: f32,
    pub battery_temp_c: f32,
    pub obc_board_temp_c: f32,
    pub payload_temp_c: f32,
    pub active_fault: Option<FaultKind>,
}

impl From<&TelemetryReading> for CriticalReading {
    fn from(reading: &TelemetryReading) -> Self {
        Self {
            timestamp_ms: reading.timestamp_ms,
            battery_voltage_v: reading.battery_voltage_v,
            battery_soc_pct: reading.battery_soc_pct,
            battery_temp_c: reading.battery_temp_c,
            obc_board_temp_c: reading.obc_board_temp_c,
            payload_temp_c: reading.payload_temp_c,
            active_fault: reading.active_fault,
        }
    }
}

/// Mode-dependent downlink payload (data prioritization policy).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", content = "telemetry")]
pub enum DownlinkView {
    #[serde(rename = "full")]
    Full(TelemetryReading),
    #[serde(rename = "critical")]
    Critical(CriticalReading),
}
