use satguard::anomaly::AnomalyEvent;
use satguard::config::{AnomalyCategory, Severity};
use satguard::recovery::{
    CorrectiveAction, Mode, RecoveryEngine, SAFE_RECOVERY_DWELL_TICKS,
};
use satguard::telemetry::{EpsMode, Parameter, TelemetryReading};
use satguard::twin::{BoundViolation, DigitalTwin, TwinReport};

fn nominal_reading(timestamp_ms: u64) -> TelemetryReading {
    TelemetryReading {
        timestamp_ms,
        battery_voltage_v: 7.5,
        battery_current_a: 0.3,
        battery_soc_pct: 75.0,
        bus_5v_v: 5.0,
        bus_3v3_v: 3.3,
        solar_array_power_w: 6.5,
        payload_power_w: 3.0,
        eps_mode: EpsMode::Nominal,
        battery_temp_c: 22.0,
        obc_board_temp_c: 28.0,
        payload_temp_c: 25.0,
        panel_temp_c: 10.0,
        rad_cps: 1.2,
        active_fault: None,
    }
}

fn healthy_report(timestamp_ms: u64) -> TwinReport {
    DigitalTwin::standard().evaluate(&nominal_reading(timestamp_ms))
}

fn low_voltage_report(timestamp_ms: u64) -> TwinReport {
    let mut reading = nominal_reading(timestamp_ms);
    reading.battery_voltage_v = 6.0;
    DigitalTwin::standard().evaluate(&reading)
}

fn critical_event(
    timestamp_ms: u64,
    parameter: Parameter,
    category: AnomalyCategory,
) -> AnomalyEvent {
    AnomalyEvent {
        timestamp_ms,
        parameter,
        observed: 0.0,
        violation: BoundViolation::Below(0.0),
        severity: Severity::Critical,
        category,
    }
}

#[test]
fn test_engine_starts_normal_with_no_strategy() {
    let engine = RecoveryEngine::new();
    assert_eq!(engine.current_mode(), Mode::Normal);
    assert!(engine.status().active_strategy.is_none());
    assert!(engine.history().is_empty());
}

#[test]
fn test_power_critical_safes_with_sun_pointing() {
    let mut engine = RecoveryEngine::new();
    let event = critical_event(1000, Parameter::BatteryVoltage, AnomalyCategory::Power);

    let record = engine.handle_anomaly(&event).expect("safing record");
    assert_eq!(engine.current_mode(), Mode::Safe);
    assert_eq!(record.action, CorrectiveAction::SunPointing);
    assert_eq!(record.resulting_mode, Mode::Safe);
    assert_eq!(engine.status().active_strategy, Some(CorrectiveAction::SunPointing));
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn test_thermal_critical_safes_with_payload_shutdown() {
    let mut engine = RecoveryEngine::new();
    let event = critical_event(1000, Parameter::BatteryTemp, AnomalyCategory::Thermal);

    let record = engine.handle_anomaly(&event).expect("safing record");
    assert_eq!(engine.current_mode(), Mode::Safe);
    assert_eq!(record.action, CorrectiveAction::PayloadShutdown);
}

#[test]
fn test_radiation_critical_throttles_without_mode_change() {
    let mut engine = RecoveryEngine::new();
    let event = critical_event(1000, Parameter::RadiationRate, AnomalyCategory::Radiation);

    let record = engine.handle_anomaly(&event).expect("throttle record");
    assert_eq!(engine.current_mode(), Mode::Normal);
    assert_eq!(record.action, CorrectiveAction::DownlinkThrottle);
    assert_eq!(record.resulting_mode, Mode::Normal);
    assert_eq!(
        engine.status().active_strategy,
        Some(CorrectiveAction::DownlinkThrottle)
    );

    // A repeat while still throttled is not logged again.
    assert!(engine.handle_anomaly(&event).is_none());
    assert_eq!(engine.history().len(), 1);

    // Radiation back in range releases the throttle silently.
    let transition = engine.observe_tick(&healthy_report(2000), 2000);
    assert!(transition.is_none());
    assert!(engine.status().active_strategy.is_none());
    assert_eq!(engine.current_mode(), Mode::Normal);
}

#[test]
fn test_warning_events_never_transition() {
    let mut engine = RecoveryEngine::new();
    let mut event = critical_event(1000, Parameter::Bus5V, AnomalyCategory::Power);
    event.severity = Severity::Warning;

    assert!(engine.handle_anomaly(&event).is_none());
    assert_eq!(engine.current_mode(), Mode::Normal);
    assert!(engine.history().is_empty());
}

#[test]
fn test_unrecognized_category_is_fail_safe() {
    let mut engine = RecoveryEngine::new();
    let event = critical_event(1000, Parameter::Bus3V3, AnomalyCategory::Uncategorized);

    assert!(engine.handle_anomaly(&event).is_none());
    assert_eq!(engine.current_mode(), Mode::Normal);
    assert!(engine.history().is_empty());
}

#[test]
fn test_normal_never_reaches_recovered_directly() {
    let mut engine = RecoveryEngine::new();

    // Healthy ticks in NORMAL must not drift the mode anywhere.
    for tick in 1..=20u64 {
        assert!(engine.observe_tick(&healthy_report(tick * 1000), tick * 1000).is_none());
        assert_eq!(engine.current_mode(), Mode::Normal);
    }
}

#[test]
fn test_dwell_gates_recovered_transition() {
    let mut engine = RecoveryEngine::new();
    let event = critical_event(1000, Parameter::BatteryVoltage, AnomalyCategory::Power);
    engine.handle_anomaly(&event).unwrap();

    // One healthy sample, then a relapse: dwell must reset.
    assert!(engine.observe_tick(&healthy_report(2000), 2000).is_none());
    assert!(engine.observe_tick(&low_voltage_report(3000), 3000).is_none());
    assert_eq!(engine.current_mode(), Mode::Safe);

    // Full dwell of healthy samples relaxes to RECOVERED.
    let mut transition = None;
    for tick in 4..4 + u64::from(SAFE_RECOVERY_DWELL_TICKS) {
        assert!(transition.is_none());
        transition = engine.observe_tick(&healthy_report(tick * 1000), tick * 1000);
    }
    let record = transition.expect("dwell satisfied");
    assert_eq!(engine.current_mode(), Mode::Recovered);
    assert_eq!(record.action, CorrectiveAction::PayloadRestore);

    // One further stable tick confirms full recovery.
    let record = engine
        .observe_tick(&healthy_report(9000), 9000)
        .expect("return to normal");
    assert_eq!(engine.current_mode(), Mode::Normal);
    assert_eq!(record.action, CorrectiveAction::ResumeNominalOps);
    assert!(engine.status().active_strategy.is_none());
}

#[test]
fn test_every_path_to_recovered_passes_through_safe() {
    let mut engine = RecoveryEngine::new();
    let event = critical_event(1000, Parameter::BatteryVoltage, AnomalyCategory::Power);
    engine.handle_anomaly(&event).unwrap();

    for tick in 2..=10u64 {
        engine.observe_tick(&healthy_report(tick * 1000), tick * 1000);
    }

    // Walk the recorded modes: RECOVERED only ever follows SAFE.
    let mut previous = Mode::Normal;
    for record in engine.history() {
        if record.resulting_mode == Mode::Recovered {
            assert_eq!(previous, Mode::Safe);
        }
        previous = record.resulting_mode;
    }
    assert_eq!(engine.current_mode(), Mode::Normal);
}

#[test]
fn test_resafing_is_idempotent_for_unresolved_cause() {
    let mut engine = RecoveryEngine::new();
    let event = critical_event(1000, Parameter::BatteryVoltage, AnomalyCategory::Power);
    engine.handle_anomaly(&event).unwrap();
    assert_eq!(engine.history().len(), 1);

    // The same parameter relapsing while still SAFE re-arms dwell but does
    // not duplicate the record.
    let mut relapse = event.clone();
    relapse.timestamp_ms = 5000;
    assert!(engine.handle_anomaly(&relapse).is_none());
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.current_mode(), Mode::Safe);
}

#[test]
fn test_new_critical_while_recovered_resafes() {
    let mut engine = RecoveryEngine::new();
    let voltage = critical_event(1000, Parameter::BatteryVoltage, AnomalyCategory::Power);
    engine.handle_anomaly(&voltage).unwrap();

    for tick in 2..=5u64 {
        engine.observe_tick(&healthy_report(tick * 1000), tick * 1000);
    }
    assert_eq!(engine.current_mode(), Mode::Recovered);

    // A fresh thermal critical drops straight back to SAFE with its own
    // safing action.
    let thermal = critical_event(6000, Parameter::ObcBoardTemp, AnomalyCategory::Thermal);
    let record = engine.handle_anomaly(&thermal).expect("re-safing record");
    assert_eq!(engine.current_mode(), Mode::Safe);
    assert_eq!(record.action, CorrectiveAction::PayloadShutdown);
}
