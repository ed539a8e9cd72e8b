// Core types for the command lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::command::identity::Aseid;
use crate::lifecycle::Failure;

/// Command status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatus {
    /// Constructed, nothing run yet
    Created,
    /// Declared for compatibility; no transition enters or leaves it
    Compiled,
    Initialized,
    Executing,
    /// Terminal
    Completed,
    /// Terminal
    Failed,
}

impl CommandStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandStatus::Completed | CommandStatus::Failed)
    }

    /// State name used when deriving transition names
    pub fn state_name(&self) -> &'static str {
        match self {
            CommandStatus::Created => "created",
            CommandStatus::Compiled => "compiled",
            CommandStatus::Initialized => "initialized",
            CommandStatus::Executing => "executing",
            CommandStatus::Completed => "completed",
            CommandStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CommandStatus::Created => "CREATED",
            CommandStatus::Compiled => "COMPILED",
            CommandStatus::Initialized => "INITIALIZED",
            CommandStatus::Executing => "EXECUTING",
            CommandStatus::Completed => "COMPLETED",
            CommandStatus::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// Instance-level lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandEvent {
    OnInit,
    OnBeforeExecute,
    OnExecute,
    OnAfterExecute,
    OnComplete,
    OnFail,
    OnError,
}

impl CommandEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandEvent::OnInit => "onInit",
            CommandEvent::OnBeforeExecute => "onBeforeExecute",
            CommandEvent::OnExecute => "onExecute",
            CommandEvent::OnAfterExecute => "onAfterExecute",
            CommandEvent::OnComplete => "onComplete",
            CommandEvent::OnFail => "onFail",
            CommandEvent::OnError => "onError",
        }
    }
}

impl fmt::Display for CommandEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized form of a command.
///
/// `params` is written out but restoring from a snapshot does not bring it back:
/// a restored command is for reporting, and callers that want to run it again
/// re-supply the input with [`Command::with_params`](crate::command::Command::with_params).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSnapshot {
    pub aseid: Aseid,
    pub code: String,
    pub status: CommandStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
}

/// What a command can be constructed from
#[derive(Debug, Clone)]
pub enum CommandInput {
    /// Fresh input parameters
    Params(Value),
    /// A previously serialized command
    Snapshot(Box<CommandSnapshot>),
    /// Identifier only, no parameters
    Identifier(String),
}

impl From<Value> for CommandInput {
    fn from(params: Value) -> Self {
        CommandInput::Params(params)
    }
}

impl From<CommandSnapshot> for CommandInput {
    fn from(snapshot: CommandSnapshot) -> Self {
        CommandInput::Snapshot(Box::new(snapshot))
    }
}

impl From<&str> for CommandInput {
    fn from(aseid: &str) -> Self {
        CommandInput::Identifier(aseid.to_string())
    }
}

impl From<String> for CommandInput {
    fn from(aseid: String) -> Self {
        CommandInput::Identifier(aseid)
    }
}

impl From<Aseid> for CommandInput {
    fn from(aseid: Aseid) -> Self {
        CommandInput::Identifier(aseid.to_string())
    }
}
