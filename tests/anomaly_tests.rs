use satguard::anomaly::AnomalyClassifier;
use satguard::config::{AnomalyCategory, Severity};
use satguard::telemetry::{EpsMode, Parameter, TelemetryReading};
use satguard::twin::{BoundViolation, DigitalTwin};

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

#[test]
fn test_sustained_violation_reports_one_event() {
    let twin = DigitalTwin::standard();
    let mut classifier = AnomalyClassifier::default();

    let mut total_events = 0;
    for tick in 1..=10u64 {
        let mut reading = nominal_reading(tick * 1000);
        reading.battery_voltage_v = 6.0;
        let report = twin.evaluate(&reading);
        total_events += classifier.classify(reading.timestamp_ms, &report).len();
    }

    // Ten out-of-range ticks, one continuous episode, exactly one event.
    assert_eq!(total_events, 1);
    assert!(classifier.is_latched(Parameter::BatteryVoltage));
}

#[test]
fn test_classifier_rearms_after_return_to_range() {
    let twin = DigitalTwin::standard();
    let mut classifier = AnomalyClassifier::default();

    let mut faulted = nominal_reading(1000);
    faulted.battery_voltage_v = 6.0;
    let events = classifier.classify(1000, &twin.evaluate(&faulted));
    assert_eq!(events.len(), 1);

    // Recovery re-arms the latch.
    let events = classifier.classify(2000, &twin.evaluate(&nominal_reading(2000)));
    assert!(events.is_empty());
    assert!(!classifier.is_latched(Parameter::BatteryVoltage));

    // A second episode produces a second event.
    faulted.timestamp_ms = 3000;
    let events = classifier.classify(3000, &twin.evaluate(&faulted));
    assert_eq!(events.len(), 1);
}

#[test]
fn test_severity_table_low_voltage_is_critical_power() {
    let twin = DigitalTwin::standard();
    let mut classifier = AnomalyClassifier::default();

    let mut reading = nominal_reading(1000);
    reading.battery_voltage_v = 6.0;
    let events = classifier.classify(1000, &twin.evaluate(&reading));

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.parameter, Parameter::BatteryVoltage);
    assert_eq!(event.severity, Severity::Critical);
    assert_eq!(event.category, AnomalyCategory::Power);
    assert_eq!(event.violation, BoundViolation::Below(6.6));
    assert_eq!(event.observed, 6.0);
}

#[test]
fn test_severity_table_high_voltage_is_warning_only() {
    let twin = DigitalTwin::standard();
    let mut classifier = AnomalyClassifier::default();

    let mut reading = nominal_reading(1000);
    reading.battery_voltage_v = 8.6;
    let events = classifier.classify(1000, &twin.evaluate(&reading));

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Warning);
    assert_eq!(events[0].violation, BoundViolation::Above(8.4));
}

#[test]
fn test_severity_table_radiation_ceiling_is_critical() {
    let twin = DigitalTwin::standard();
    let mut classifier = AnomalyClassifier::default();

    let mut reading = nominal_reading(1000);
    reading.rad_cps = 95.0;
    let events = classifier.classify(1000, &twin.evaluate(&reading));

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Critical);
    assert_eq!(events[0].category, AnomalyCategory::Radiation);
}

#[test]
fn test_severity_table_hot_battery_is_critical_thermal() {
    let twin = DigitalTwin::standard();
    let mut classifier = AnomalyClassifier::default();

    let mut reading = nominal_reading(1000);
    reading.battery_temp_c = 55.0;
    let events = classifier.classify(1000, &twin.evaluate(&reading));

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Critical);
    assert_eq!(events[0].category, AnomalyCategory::Thermal);

    // Cold battery only warns.
    let mut classifier = AnomalyClassifier::default();
    reading.battery_temp_c = -8.0;
    let events = classifier.classify(2000, &twin.evaluate(&reading));
    assert_eq!(events[0].severity, Severity::Warning);
}

#[test]
fn test_independent_episodes_per_parameter() {
    let twin = DigitalTwin::standard();
    let mut classifier = AnomalyClassifier::default();

    let mut reading = nominal_reading(1000);
    reading.battery_temp_c = 55.0;
    reading.obc_board_temp_c = 70.0;
    let events = classifier.classify(1000, &twin.evaluate(&reading));
    assert_eq!(events.len(), 2);

    // One parameter recovers, the other stays latched; only the recovered
    // one can fire again.
    let mut reading = nominal_reading(2000);
    reading.obc_board_temp_c = 70.0;
    let events = classifier.classify(2000, &twin.evaluate(&reading));
    assert!(events.is_empty());
    assert!(!classifier.is_latched(Parameter::BatteryTemp));
    assert!(classifier.is_latched(Parameter::ObcBoardTemp));
}
