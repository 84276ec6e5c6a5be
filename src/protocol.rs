use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{AgentError, SatelliteAgent};

pub const MAX_COMMAND_SIZE: usize = 512;

pub type CommandBuffer = ArrayString<MAX_COMMAND_SIZE>;

/// One line-delimited JSON command from a ground client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundCommand {
    pub id: u32,
    pub command: CommandKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommandKind {
    Ping,
    GetTelemetry,
    GetDownlink,
    GetMode,
    GetTimeline { limit: Option<usize> },
    GetRecoveryStatus,
    GetRecoveryHistory,
    GetPreventiveActions { limit: Option<usize> },
    InjectFault { fault_type: String, duration_s: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Success,
    Error,
    InvalidCommand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundResponse {
    pub id: u32,
    pub timestamp_ms: u64,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid JSON command")]
    InvalidJson,
    #[error("command exceeds {MAX_COMMAND_SIZE} byte limit")]
    MessageTooLarge,
    #[error("response serialization failed")]
    SerializationError,
}

/// Parses inbound command lines through a bounded scratch buffer and shapes
/// responses.
#[derive(Debug, Default)]
pub struct ProtocolHandler {
    command_buffer: CommandBuffer,
}

impl ProtocolHandler {
    pub fn new() -> Self {
        Self {
            command_buffer: ArrayString::new(),
        }
    }

    pub fn parse_command(&mut self, line: &str) -> Result<GroundCommand, ProtocolError> {
        if line.len() > MAX_COMMAND_SIZE {
            return Err(ProtocolError::MessageTooLarge);
        }
        self.command_buffer.clear();
        self.command_buffer.push_str(line);

        serde_json::from_str(&self.command_buffer).map_err(|_| ProtocolError::InvalidJson)
    }

    pub fn serialize_response(&self, response: &GroundResponse) -> Result<String, ProtocolError> {
        serde_json::to_string(response).map_err(|_| ProtocolError::SerializationError)
    }
}

/// Run one command against the agent and shape the outcome.
///
/// Validation and state-unavailable failures surface as `Error` responses;
/// they never panic the host loop.
pub fn execute(agent: &mut SatelliteAgent, command: &GroundCommand) -> GroundResponse {
    let timestamp_ms = agent.sim_time_ms();

    let payload = match &command.command {
        CommandKind::Ping => Ok(serde_json::json!({"pong": true, "tick": agent.tick_count()})),
        CommandKind::GetTelemetry => agent
            .latest_reading()
            .map_err(agent_error)
            .and_then(to_value),
        CommandKind::GetDownlink => agent
            .downlink_view()
            .map_err(agent_error)
            .and_then(|view| to_value(&view)),
        CommandKind::GetMode => Ok(serde_json::json!({"mode": agent.mode()})),
        CommandKind::GetTimeline { limit } => to_value(&agent.timeline(*limit)),
        CommandKind::GetRecoveryStatus => to_value(&agent.recovery_status()),
        CommandKind::GetRecoveryHistory => to_value(&agent.recovery_history()),
        CommandKind::GetPreventiveActions { limit } => to_value(&agent.preventive_actions(*limit)),
        CommandKind::InjectFault {
            fault_type,
            duration_s,
        } => agent
            .inject_fault(fault_type, *duration_s)
            .map_err(agent_error)
            .map(|kind| {
                serde_json::json!({
                    "injected": kind,
                    "duration_s": duration_s,
                })
            }),
    };

    match payload {
        Ok(value) => GroundResponse {
            id: command.id,
            timestamp_ms,
            status: ResponseStatus::Success,
            payload: Some(value),
            message: None,
        },
        Err(message) => GroundResponse {
            id: command.id,
            timestamp_ms,
            status: ResponseStatus::Error,
            payload: None,
            message: Some(message),
        },
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<serde_json::Value, String> {
    serde_json::to_value(value).map_err(|error| error.to_string())
}

fn agent_error(error: AgentError) -> String {
    error.to_string()
}
