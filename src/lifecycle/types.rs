// Core types for the hookable transition engine

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::command::{Aseid, CommandError};
use crate::lifecycle::state_machine::EngineError;
use crate::telemetry::generate_correlation_id;

/// Named extension points where registered hooks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookPhase {
    // Engine phases
    OnInitialize,
    OnBeforeTransition,
    OnAfterTransition,
    OnError,
    // Command phases
    OnInit,
    OnBeforeExecute,
    OnExecute,
    OnAfterExecute,
    OnComplete,
    OnFail,
}

impl HookPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::OnInitialize => "onInitialize",
            HookPhase::OnBeforeTransition => "onBeforeTransition",
            HookPhase::OnAfterTransition => "onAfterTransition",
            HookPhase::OnError => "onError",
            HookPhase::OnInit => "onInit",
            HookPhase::OnBeforeExecute => "onBeforeExecute",
            HookPhase::OnExecute => "onExecute",
            HookPhase::OnAfterExecute => "onAfterExecute",
            HookPhase::OnComplete => "onComplete",
            HookPhase::OnFail => "onFail",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The instance that owns a lifecycle, as seen by hook filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    kind: String,
    lineage: Vec<String>,
    id: Option<Aseid>,
}

impl Owner {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            lineage: Vec::new(),
            id: None,
        }
    }

    /// Ancestor kinds, nearest first
    pub fn with_lineage<I, S>(mut self, lineage: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lineage = lineage.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id(mut self, id: Aseid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    pub fn id(&self) -> Option<&Aseid> {
        self.id.as_ref()
    }

    /// True when `kind` names this owner's type or one of its ancestors
    pub fn is_a(&self, kind: &str) -> bool {
        self.kind == kind || self.lineage.iter().any(|k| k == kind)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}({})", self.kind, id),
            None => f.write_str(&self.kind),
        }
    }
}

/// Framework error record stored on failed transitions and commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{title}: {description}")]
pub struct Failure {
    pub code: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl Failure {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            description: description.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Wrap an arbitrary error, keeping framework errors' own codes
    pub fn wrap(err: &(dyn std::error::Error + 'static)) -> Self {
        if let Some(failure) = err.downcast_ref::<Failure>() {
            return failure.clone();
        }
        if let Some(command_err) = err.downcast_ref::<CommandError>() {
            return Failure::from(command_err);
        }
        if let Some(engine_err) = err.downcast_ref::<EngineError>() {
            return Failure::from(engine_err);
        }
        let failure = Failure::new("unexpected-error", "Unexpected error", err.to_string());
        match err.source() {
            Some(source) => failure.with_cause(source.to_string()),
            None => failure,
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        let root: &(dyn std::error::Error + 'static) = err.as_ref();
        let mut failure = Failure::wrap(root);
        if failure.cause.is_none() {
            failure.cause = err.chain().nth(1).map(|c| c.to_string());
        }
        failure
    }
}

impl From<&EngineError> for Failure {
    fn from(err: &EngineError) -> Self {
        let failure = Failure::new(err.code(), err.title(), err.to_string());
        match std::error::Error::source(err) {
            Some(source) => failure.with_cause(source.to_string()),
            None => failure,
        }
    }
}

impl From<EngineError> for Failure {
    fn from(err: EngineError) -> Self {
        Failure::from(&err)
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::new("unexpected-error", "Unexpected error", message)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::new("unexpected-error", "Unexpected error", message)
    }
}

/// Deterministic handler/audit name for a `from` -> `to` edge
pub fn transition_name(from: &str, to: &str) -> String {
    format!("{from}_{to}")
}

/// Input of one transition; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionParams {
    from: String,
    to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    props: Option<Value>,
}

impl TransitionParams {
    pub fn new(from: impl Into<String>, to: impl Into<String>, props: Option<Value>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            props,
        }
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn props(&self) -> Option<&Value> {
        self.props.as_ref()
    }
}

/// Outcome of a transition handler, written at most once
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Succeeded(Value),
    Failed(Failure),
}

/// Carrier of one transition's name, input and outcome
#[derive(Debug, Clone)]
pub struct TransitionContext {
    name: String,
    params: TransitionParams,
    correlation_id: String,
    outcome: Option<TransitionOutcome>,
}

impl TransitionContext {
    pub fn new(params: TransitionParams) -> Self {
        Self {
            name: transition_name(params.from(), params.to()),
            params,
            correlation_id: generate_correlation_id(),
            outcome: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &TransitionParams {
        &self.params
    }

    pub fn props(&self) -> Option<&Value> {
        self.params.props()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn outcome(&self) -> Option<&TransitionOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Some(TransitionOutcome::Succeeded(value)) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Failure> {
        match &self.outcome {
            Some(TransitionOutcome::Failed(failure)) => Some(failure),
            _ => None,
        }
    }

    pub fn succeed(&mut self, result: Value) -> Result<(), EngineError> {
        self.resolve(TransitionOutcome::Succeeded(result))
    }

    pub fn fail(&mut self, error: impl Into<Failure>) -> Result<(), EngineError> {
        self.resolve(TransitionOutcome::Failed(error.into()))
    }

    fn resolve(&mut self, outcome: TransitionOutcome) -> Result<(), EngineError> {
        if self.outcome.is_some() {
            return Err(EngineError::OutcomeAlreadySet {
                name: self.name.clone(),
            });
        }
        self.outcome = Some(outcome);
        Ok(())
    }
}
