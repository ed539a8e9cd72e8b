use thiserror::Error;

use crate::command::identity::AseidError;
use crate::command::types::CommandEvent;
use crate::lifecycle::state_machine::{Cause, EngineError};
use crate::lifecycle::Failure;

#[derive(Debug, Clone, Error)]
pub enum CommandError {
    #[error("Command {code} is not registered in a scope inheriting from '{expected}'")]
    ScopeBinding { code: String, expected: String },
    #[error("Command {code} was interrupted: {reason}")]
    Interrupted { code: String, reason: String },
    #[error("Command {code} failed during execution: {source}")]
    Execution {
        code: String,
        #[source]
        source: Cause,
    },
    #[error("Command {code} could not process its result: {message}")]
    ResultProcessing { code: String, message: String },
    #[error("Listener for {event} on command {code} failed: {source}")]
    Listener {
        code: String,
        event: CommandEvent,
        #[source]
        source: Cause,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Identity(#[from] AseidError),
}

impl CommandError {
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::ScopeBinding { .. } => "command-scope-binding-error",
            CommandError::Interrupted { .. } => "command-interrupted-error",
            CommandError::Execution { .. } => "execution-error",
            CommandError::ResultProcessing { .. } => "result-processing-error",
            CommandError::Listener { .. } => "listener-error",
            CommandError::Engine(err) => err.code(),
            CommandError::Identity(_) => "identity-error",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CommandError::ScopeBinding { .. } => "Command scope binding failed",
            CommandError::Interrupted { .. } => "Command interrupted",
            CommandError::Execution { .. } => "Command execution failed",
            CommandError::ResultProcessing { .. } => "Command result processing failed",
            CommandError::Listener { .. } => "Command listener failed",
            CommandError::Engine(err) => err.title(),
            CommandError::Identity(_) => "Invalid command identity",
        }
    }
}

impl From<&CommandError> for Failure {
    fn from(err: &CommandError) -> Self {
        let failure = Failure::new(err.code(), err.title(), err.to_string());
        match std::error::Error::source(err) {
            Some(source) => failure.with_cause(source.to_string()),
            None => failure,
        }
    }
}

impl From<CommandError> for Failure {
    fn from(err: CommandError) -> Self {
        Failure::from(&err)
    }
}
