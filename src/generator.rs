use heapless::Vec;
use tracing::{debug, info};

use crate::fault::{FaultInjection, FaultKind};
use crate::telemetry::{EpsMode, TelemetryReading};

/// Rolling history depth; sized well past the longest analyzer lookback (5).
pub const HISTORY_CAPACITY: usize = 16;

const ORBITAL_PERIOD_S: f32 = 90.0 * 60.0;
const SUN_FRACTION: f32 = 0.6;
const PENUMBRA_FRACTION: f32 = 0.1;

const PEAK_SOLAR_POWER_W: f32 = 8.0;
const BUS_BASE_LOAD_W: f32 = 1.5;
const CHARGING_CURRENT_DEADBAND_A: f32 = 0.05;

// Exponential-lag time constants, seconds. The panel reacts fastest; the
// battery pack has the largest thermal mass.
const TAU_BATTERY_S: f32 = 300.0;
const TAU_OBC_S: f32 = 180.0;
const TAU_PAYLOAD_S: f32 = 240.0;
const TAU_PANEL_S: f32 = 60.0;

const RAD_QUIET_MIN_CPS: f32 = 0.1;
const RAD_QUIET_SPAN_CPS: f32 = 4.9;
const RAD_SPIKE_PROBABILITY: f32 = 0.002;
const RAD_SPIKE_DECAY: f32 = 0.72;

const DEFAULT_RNG_SEED: u64 = 0x1234_5678_9ABC_DEF0;

#[derive(Debug, Clone, Copy)]
struct ThermalNode {
    temp_c: f32,
    tau_s: f32,
}

impl ThermalNode {
    fn approach(&mut self, target_c: f32, dt_s: f32) {
        // First-order lag toward the target temperature.
        let alpha = 1.0 - (-dt_s / self.tau_s).exp();
        self.temp_c += alpha * (target_c - self.temp_c);
    }
}

/// Synthetic telemetry source.
///
/// Owns all generation state: orbital clock inputs arrive from the caller,
/// everything else (thermal lag, battery drift, radiation spikes, active
/// fault override, rolling history) lives here and is mutated only by
/// `tick`. Downstream components read the produced snapshots and never
/// reach back into this state.
#[derive(Debug)]
pub struct TelemetryGenerator {
    battery: ThermalNode,
    obc_board: ThermalNode,
    payload: ThermalNode,
    panel: ThermalNode,

    soc_pct: f32,
    spike_intensity_cps: Option<f32>,
    active_fault: Option<FaultInjection>,

    latest: Option<TelemetryReading>,
    history: Vec<TelemetryReading, HISTORY_CAPACITY>,

    // Linear congruential generator; fixed seed keeps runs reproducible.
    rng_state: u64,
}

impl TelemetryGenerator {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_RNG_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            battery: ThermalNode { temp_c: 20.0, tau_s: TAU_BATTERY_S },
            obc_board: ThermalNode { temp_c: 25.0, tau_s: TAU_OBC_S },
            payload: ThermalNode { temp_c: 22.0, tau_s: TAU_PAYLOAD_S },
            panel: ThermalNode { temp_c: -20.0, tau_s: TAU_PANEL_S },
            soc_pct: 75.0,
            spike_intensity_cps: None,
            active_fault: None,
            latest: None,
            history: Vec::new(),
            rng_state: seed,
        }
    }

    /// Produce the reading for mission-elapsed time `now_ms`, advancing all
    /// internal state by `dt_ms`. Never fails on a nominal tick: every
    /// random contribution is bounded so the unperturbed model stays inside
    /// the healthy ranges.
    pub fn tick(&mut self, now_ms: u64, dt_ms: u64) -> TelemetryReading {
        let dt_s = dt_ms as f32 / 1000.0;
        let solar_factor = self.solar_irradiance_factor(now_ms);
        let in_sunlight = self.is_in_sunlight(now_ms);

        let solar_array_power_w = PEAK_SOLAR_POWER_W * solar_factor
            + if solar_factor > 0.0 { self.random_range(0.0, 0.2) } else { 0.0 };
        let payload_power_w = self.random_range(2.0, 4.0);

        // Net battery current from the power balance; positive charges.
        let battery_voltage_nominal = 6.8 + 1.4 * self.soc_pct / 100.0;
        let battery_current_a =
            (solar_array_power_w - payload_power_w - BUS_BASE_LOAD_W) / battery_voltage_nominal;
        let charging = battery_current_a > CHARGING_CURRENT_DEADBAND_A;

        if charging {
            self.soc_pct += self.random_range(0.05, 0.25);
        } else {
            self.soc_pct -= self.random_range(0.02, 0.15);
        }
        self.soc_pct = self.soc_pct.clamp(20.0, 100.0);

        let battery_voltage_v = 6.8 + 1.4 * self.soc_pct / 100.0
            + if charging { 0.08 } else { -0.05 }
            + self.random_range(-0.04, 0.04);

        let bus_5v_v = 5.0 + self.random_range(-0.04, 0.04);
        let bus_3v3_v = 3.3 + self.random_range(-0.015, 0.015);

        self.advance_thermal(in_sunlight, dt_s);
        let rad_cps = self.advance_radiation();

        let eps_mode = if self.soc_pct < 30.0 {
            EpsMode::LowPower
        } else if self.soc_pct > 90.0 {
            EpsMode::FullCharge
        } else {
            EpsMode::Nominal
        };

        let mut reading = TelemetryReading {
            timestamp_ms: now_ms,
            battery_voltage_v,
            battery_current_a,
            battery_soc_pct: self.soc_pct,
            bus_5v_v,
            bus_3v3_v,
            solar_array_power_w,
            payload_power_w,
            eps_mode,
            battery_temp_c: self.battery.temp_c,
            obc_board_temp_c: self.obc_board.temp_c,
            payload_temp_c: self.payload.temp_c,
            panel_temp_c: self.panel.temp_c,
            rad_cps,
            active_fault: None,
        };

        self.apply_fault_override(&mut reading);

        debug_assert!((0.0..=100.0).contains(&reading.battery_soc_pct));

        if self.history.is_full() {
            self.history.remove(0);
        }
        let _ = self.history.push(reading.clone());
        self.latest = Some(reading.clone());

        reading
    }

    /// Register a fault override for the next `duration_ticks` ticks.
    ///
    /// Overwrite policy: a second injection while one is active replaces it
    /// outright; durations never accumulate.
    pub fn inject_fault(&mut self, kind: FaultKind, duration_ticks: u32, now_ms: u64) {
        if let Some(previous) = self.active_fault {
            info!(
                replaced = %previous.kind,
                by = %kind,
                "fault injection replaced before expiry"
            );
        }
        self.active_fault = Some(FaultInjection::new(kind, duration_ticks, now_ms));
    }

    pub fn active_fault(&self) -> Option<&FaultInjection> {
        self.active_fault.as_ref()
    }

    pub fn latest(&self) -> Option<&TelemetryReading> {
        self.latest.as_ref()
    }

    /// Rolling history, oldest first.
    pub fn history(&self) -> &[TelemetryReading] {
        &self.history
    }

    fn orbital_phase(&self, now_ms: u64) -> f32 {
        let elapsed_s = now_ms as f32 / 1000.0;
        (elapsed_s % ORBITAL_PERIOD_S) / ORBITAL_PERIOD_S
    }

    fn is_in_sunlight(&self, now_ms: u64) -> bool {
        self.orbital_phase(now_ms) < SUN_FRACTION
    }

    /// 0.0 in eclipse, 1.0 at full sun, linear ramps through the penumbra
    /// windows at both terminator crossings.
    fn solar_irradiance_factor(&self, now_ms: u64) -> f32 {
        let phase = self.orbital_phase(now_ms);
        if phase >= SUN_FRACTION {
            0.0
        } else if phase < PENUMBRA_FRACTION {
            phase / PENUMBRA_FRACTION
        } else if phase > SUN_FRACTION - PENUMBRA_FRACTION {
            (SUN_FRACTION - phase) / PENUMBRA_FRACTION
        } else {
            1.0
        }
    }

    fn advance_thermal(&mut self, in_sunlight: bool, dt_s: f32) {
        let (panel_t, battery_t, obc_t, payload_t) = if in_sunlight {
            (
                self.random_range(40.0, 59.0),
                self.random_range(25.0, 35.0),
                self.random_range(30.0, 45.0),
                self.random_range(25.0, 40.0),
            )
        } else {
            (
                self.random_range(-40.0, -20.0),
                self.random_range(5.0, 15.0),
                self.random_range(10.0, 25.0),
                self.random_range(5.0, 20.0),
            )
        };

        self.panel.approach(panel_t, dt_s);
        self.battery.approach(battery_t, dt_s);
        self.obc_board.approach(obc_t, dt_s);
        self.payload.approach(payload_t, dt_s);
    }

    /// Quiet-band radiation with rare multi-tick spikes that decay back
    /// down. Natural spikes stay below the 80 cps anomaly ceiling.
    fn advance_radiation(&mut self) -> f32 {
        if let Some(intensity) = self.spike_intensity_cps {
            let decayed = intensity * RAD_SPIKE_DECAY;
            if decayed > RAD_QUIET_MIN_CPS + RAD_QUIET_SPAN_CPS {
                self.spike_intensity_cps = Some(decayed);
                return decayed;
            }
            debug!("radiation spike decayed back to quiet band");
            self.spike_intensity_cps = None;
        } else if self.random_unit() < RAD_SPIKE_PROBABILITY {
            let intensity = self.random_range(30.0, 75.0);
            info!(intensity_cps = f64::from(intensity), "radiation spike onset");
            self.spike_intensity_cps = Some(intensity);
            return intensity;
        }

        // Skewed toward the low end of the quiet band.
        let unit = self.random_unit();
        RAD_QUIET_MIN_CPS + unit * unit * RAD_QUIET_SPAN_CPS
    }

    fn apply_fault_override(&mut self, reading: &mut TelemetryReading) {
        let Some(fault) = self.active_fault.as_mut() else {
            return;
        };

        if !fault.consume_tick() {
            self.active_fault = None;
            return;
        }

        reading.active_fault = Some(fault.kind);
        match fault.kind {
            FaultKind::LowVoltage => {
                reading.battery_voltage_v = 6.0;
            }
            FaultKind::HighTemp => {
                reading.battery_temp_c = 55.0;
                reading.obc_board_temp_c = 70.0;
            }
            FaultKind::RadiationSpike => {
                reading.rad_cps = 95.0;
            }
            FaultKind::PowerFailure => {
                reading.battery_voltage_v = 5.5;
                reading.solar_array_power_w *= 0.3;
                reading.payload_power_w *= 0.2;
            }
        }

        if fault.remaining_ticks == 0 {
            info!(kind = %fault.kind, "injected fault expired");
            self.active_fault = None;
        }
    }

    fn next_random(&mut self) -> u64 {
        self.rng_state = self.rng_state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        self.rng_state
    }

    fn random_unit(&mut self) -> f32 {
        ((self.next_random() >> 40) & 0xFF_FFFF) as f32 / 16_777_216.0
    }

    fn random_range(&mut self, low: f32, high: f32) -> f32 {
        low + self.random_unit() * (high - low)
    }
}

impl Default for TelemetryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HealthyRanges;

    #[test]
    fn test_orbital_duty_cycle() {
        let generator = TelemetryGenerator::new();

        // 30% into the orbit: full sun.
        let sun_ms = (ORBITAL_PERIOD_S * 0.3 * 1000.0) as u64;
        assert!(generator.is_in_sunlight(sun_ms));
        assert!((generator.solar_irradiance_factor(sun_ms) - 1.0).abs() < f32::EPSILON);

        // 80% into the orbit: eclipse, no irradiance.
        let eclipse_ms = (ORBITAL_PERIOD_S * 0.8 * 1000.0) as u64;
        assert!(!generator.is_in_sunlight(eclipse_ms));
        assert_eq!(generator.solar_irradiance_factor(eclipse_ms), 0.0);

        // Terminator ramp is partial.
        let ramp_ms = (ORBITAL_PERIOD_S * 0.05 * 1000.0) as u64;
        let factor = generator.solar_irradiance_factor(ramp_ms);
        assert!(factor > 0.0 && factor < 1.0);
    }

    #[test]
    fn test_nominal_ticks_stay_in_healthy_ranges() {
        let mut generator = TelemetryGenerator::new();
        let ranges = HealthyRanges::standard();

        for tick in 0..2000u64 {
            let reading = generator.tick(tick * 1000, 1000);
            for spec in ranges.specs() {
                let value = reading.value_of(spec.parameter);
                assert!(
                    spec.range.contains(value),
                    "tick {}: {} = {} escaped [{}, {}]",
                    tick,
                    spec.parameter,
                    value,
                    spec.range.min,
                    spec.range.max
                );
            }
            assert!(reading.active_fault.is_none());
        }
    }

    #[test]
    fn test_fault_expires_after_exact_tick_count() {
        let mut generator = TelemetryGenerator::new();
        generator.inject_fault(FaultKind::LowVoltage, 5, 0);

        for tick in 1..=5u64 {
            let reading = generator.tick(tick * 1000, 1000);
            assert_eq!(reading.active_fault, Some(FaultKind::LowVoltage));
            assert!((reading.battery_voltage_v - 6.0).abs() < f32::EPSILON);
        }

        let reading = generator.tick(6000, 1000);
        assert!(reading.active_fault.is_none());
        assert!(reading.battery_voltage_v > 6.6);
        assert!(generator.active_fault().is_none());
    }

    #[test]
    fn test_reinjection_replaces_active_fault() {
        let mut generator = TelemetryGenerator::new();
        generator.inject_fault(FaultKind::LowVoltage, 10, 0);
        generator.inject_fault(FaultKind::HighTemp, 2, 0);

        let reading = generator.tick(1000, 1000);
        assert_eq!(reading.active_fault, Some(FaultKind::HighTemp));
        assert!((reading.battery_voltage_v - 6.0).abs() > 0.1);
        assert!((reading.obc_board_temp_c - 70.0).abs() < f32::EPSILON);

        generator.tick(2000, 1000);
        let reading = generator.tick(3000, 1000);
        assert!(reading.active_fault.is_none());
    }

    #[test]
    fn test_history_is_bounded_and_ordered() {
        let mut generator = TelemetryGenerator::new();
        for tick in 0..40u64 {
            generator.tick(tick * 1000, 1000);
        }

        let history = generator.history();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        for pair in history.windows(2) {
            assert!(pair[0].timestamp_ms < pair[1].timestamp_ms);
        }
        assert_eq!(
            history.last().unwrap().timestamp_ms,
            generator.latest().unwrap().timestamp_ms
        );
    }

    #[test]
    fn test_eclipse_cools_panel() {
        let mut generator = TelemetryGenerator::new();

        // Run well into the eclipse segment of the first orbit.
        let eclipse_start_ms = (ORBITAL_PERIOD_S * SUN_FRACTION * 1000.0) as u64;
        let mut now_ms = eclipse_start_ms;
        for _ in 0..600 {
            now_ms += 1000;
            generator.tick(now_ms, 1000);
        }

        let reading = generator.latest().unwrap();
        assert!(reading.panel_temp_c < 0.0);
        assert_eq!(reading.solar_array_power_w, 0.0);
    }
}
