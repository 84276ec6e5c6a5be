use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::anomaly::AnomalyEvent;
use crate::fault::FaultKind;
use crate::preventive::PreventiveAction;
use crate::recovery::RecoveryRecord;

/// Generous in-memory cap; the oldest entry is dropped on overflow.
pub const TIMELINE_CAPACITY: usize = 256;

/// One event on the mission timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimelineEntry {
    #[serde(rename = "ANOMALY")]
    Anomaly(AnomalyEvent),
    #[serde(rename = "RECOVERY")]
    Recovery(RecoveryRecord),
    #[serde(rename = "PREVENTIVE")]
    Preventive(PreventiveAction),
    #[serde(rename = "FAULT_INJECTED")]
    FaultInjected {
        timestamp_ms: u64,
        kind: FaultKind,
        duration_s: u32,
    },
}

impl TimelineEntry {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            TimelineEntry::Anomaly(event) => event.timestamp_ms,
            TimelineEntry::Recovery(record) => record.timestamp_ms,
            TimelineEntry::Preventive(action) => action.timestamp_ms,
            TimelineEntry::FaultInjected { timestamp_ms, .. } => *timestamp_ms,
        }
    }

    pub fn description(&self) -> String {
        match self {
            TimelineEntry::Anomaly(event) => event.description(),
            TimelineEntry::Recovery(record) => format!(
                "{} applied, now {} ({})",
                record.action, record.resulting_mode, record.trigger
            ),
            TimelineEntry::Preventive(action) => {
                format!("{} warning: {}", action.kind, action.description)
            }
            TimelineEntry::FaultInjected {
                kind, duration_s, ..
            } => format!("fault {kind} injected for {duration_s} s"),
        }
    }
}

/// Append-only, time-ordered event record; the single source of truth for
/// reporting collaborators.
#[derive(Debug, Default)]
pub struct EventTimeline {
    entries: Vec<TimelineEntry, TIMELINE_CAPACITY>,
}

impl EventTimeline {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, entry: TimelineEntry) {
        if self.entries.is_full() {
            self.entries.remove(0);
        }
        let _ = self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// The most recent `limit` entries (all of them when `None`), still
    /// oldest-first so insertion order equals chronological order.
    pub fn tail(&self, limit: Option<usize>) -> &[TimelineEntry] {
        match limit {
            Some(limit) if limit < self.entries.len() => {
                &self.entries[self.entries.len() - limit..]
            }
            _ => &self.entries,
        }
    }
}
