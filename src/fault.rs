use serde::{Deserialize, Serialize};

/// Upper bound accepted by `inject_fault`, in seconds.
pub const MAX_FAULT_DURATION_S: u32 = 3600;

/// Ground-commandable fault overrides.
///
/// Each kind forces a fixed set of parameters outside their healthy range
/// for the duration of the injection; the generator's internal drift and
/// lag state is never touched, so expiry restores the unperturbed model on
/// the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    #[serde(rename = "LOW_VOLTAGE")]
    LowVoltage,
    #[serde(rename = "HIGH_TEMP")]
    HighTemp,
    #[serde(rename = "RADIATION_SPIKE")]
    RadiationSpike,
    #[serde(rename = "POWER_FAILURE")]
    PowerFailure,
}

impl FaultKind {
    pub const ALL: [FaultKind; 4] = [
        FaultKind::LowVoltage,
        FaultKind::HighTemp,
        FaultKind::RadiationSpike,
        FaultKind::PowerFailure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::LowVoltage => "LOW_VOLTAGE",
            FaultKind::HighTemp => "HIGH_TEMP",
            FaultKind::RadiationSpike => "RADIATION_SPIKE",
            FaultKind::PowerFailure => "POWER_FAILURE",
        }
    }

    pub fn parse(name: &str) -> Option<FaultKind> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }
}

impl core::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An active fault override held by the generator.
///
/// At most one injection is active at a time; a new request replaces the
/// current one outright (kind and remaining duration).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FaultInjection {
    pub kind: FaultKind,
    pub remaining_ticks: u32,
    pub injected_at_ms: u64,
}

impl FaultInjection {
    pub fn new(kind: FaultKind, duration_ticks: u32, injected_at_ms: u64) -> Self {
        Self {
            kind,
            remaining_ticks: duration_ticks,
            injected_at_ms,
        }
    }

    /// Consume one tick of the override. Returns false once expired.
    pub fn consume_tick(&mut self) -> bool {
        if self.remaining_ticks == 0 {
            return false;
        }
        self.remaining_ticks -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_kind_round_trip() {
        for kind in FaultKind::ALL {
            assert_eq!(FaultKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FaultKind::parse("THRUSTER_STUCK"), None);
        assert_eq!(FaultKind::parse("low_voltage"), None);
    }

    #[test]
    fn test_injection_expires_after_duration() {
        let mut injection = FaultInjection::new(FaultKind::LowVoltage, 3, 0);
        assert!(injection.consume_tick());
        assert!(injection.consume_tick());
        assert!(injection.consume_tick());
        assert!(!injection.consume_tick());
    }
}
