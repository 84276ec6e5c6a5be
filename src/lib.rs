//! # SatGuard
//!
//! A CubeSat onboard-autonomy simulator: physically plausible telemetry
//! generation, digital-twin deviation detection, autonomous fault recovery,
//! and preventive trend monitoring, wrapped in a small ground-command
//! protocol.
//!
//! ## Features
//!
//! - **Telemetry generation**: 90-minute orbital sun/eclipse cycling,
//!   exponential thermal lag, radiation spikes, bounded battery drift
//! - **Digital twin**: healthy-range evaluation of every monitored parameter
//! - **Anomaly classification**: edge-triggered, table-driven severity
//! - **Recovery engine**: NORMAL/SAFE/RECOVERED state machine with dwell
//! - **Preventive monitor**: pluggable trend analyzers with fault isolation
//! - **Fault injection**: bounded-duration overrides with validation
//!
//! ## Quick Start
//!
//! ```rust
//! use satguard::SatelliteAgent;
//!
//! let mut agent = SatelliteAgent::new();
//!
//! // Advance the autonomy loop and read the produced telemetry.
//! let report = agent.tick();
//! println!("battery: {:.2} V", report.reading.battery_voltage_v);
//!
//! // Drive a failure scenario.
//! agent.inject_fault("LOW_VOLTAGE", 30).unwrap();
//! agent.tick();
//! println!("mode: {}", agent.mode());
//! ```
//!
//! ## Architecture
//!
//! - [`agent`] - single-writer orchestrator and public query surface
//! - [`generator`] - synthetic telemetry source
//! - [`twin`] - healthy-range evaluation
//! - [`anomaly`] - violation-episode classification
//! - [`recovery`] - mode state machine and corrective actions
//! - [`preventive`] - trend analyzers and their monitor
//! - [`timeline`] - bounded, append-only event record
//! - [`protocol`] - ground-command parsing and dispatch

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod agent;
pub mod anomaly;
pub mod config;
pub mod fault;
pub mod generator;
pub mod preventive;
pub mod protocol;
pub mod recovery;
pub mod telemetry;
pub mod timeline;
pub mod twin;

// Re-export the main public types for convenience
pub use agent::{AgentError, SatelliteAgent};
pub use fault::FaultKind;
pub use recovery::Mode;
pub use telemetry::TelemetryReading;
