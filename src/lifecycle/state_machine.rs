use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn, Instrument};

use crate::command::Aseid;
use crate::lifecycle::hooks::{HookArgs, HookRegistry};
use crate::lifecycle::traits::TransitionHandler;
use crate::lifecycle::types::{
    transition_name, Failure, HookPhase, Owner, TransitionContext, TransitionParams,
};
use crate::observability::{lifecycle_metrics, OperationTimer};
use crate::telemetry::transition_span;

/// Shareable error cause, so cached failures can be handed to every waiter
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

pub(crate) fn into_cause(err: anyhow::Error) -> Cause {
    let boxed: Box<dyn std::error::Error + Send + Sync + 'static> = err.into();
    Arc::from(boxed)
}

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Initialization of {owner} failed: {source}")]
    Initialization {
        owner: String,
        #[source]
        source: Cause,
    },
    #[error("Transition {name} failed: {source}")]
    Transition {
        name: String,
        #[source]
        source: Cause,
    },
    #[error("Transition {name} already has an outcome")]
    OutcomeAlreadySet { name: String },
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Initialization { .. } => "initialization-error",
            EngineError::Transition { .. } => "transition-error",
            EngineError::OutcomeAlreadySet { .. } => "outcome-already-set",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EngineError::Initialization { .. } => "Initialization failed",
            EngineError::Transition { .. } => "Transition failed",
            EngineError::OutcomeAlreadySet { .. } => "Outcome already set",
        }
    }

    /// The wrapped original error, if any
    pub fn original(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            EngineError::Initialization { source, .. } | EngineError::Transition { source, .. } => {
                Some(source.as_ref())
            }
            EngineError::OutcomeAlreadySet { .. } => None,
        }
    }
}

/// Runs transitions as an ordered pipeline of hookable phases.
///
/// The machine keeps no current state of its own; callers that need one track it
/// themselves (the command lifecycle does so through its status).
pub struct StateMachine {
    owner: Owner,
    hooks: Arc<HookRegistry>,
    handlers: HashMap<String, Arc<dyn TransitionHandler>>,
    ready: OnceCell<Result<(), EngineError>>,
}

impl StateMachine {
    pub fn new(owner: Owner, hooks: Arc<HookRegistry>) -> Self {
        Self {
            owner,
            hooks,
            handlers: HashMap::new(),
            ready: OnceCell::new(),
        }
    }

    pub fn builder(kind: impl Into<String>) -> StateMachineBuilder {
        StateMachineBuilder::new(kind)
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn hooks(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// One-time initialization gate.
    ///
    /// The first call runs the `onInitialize` phase; every other call, concurrent or
    /// later, shares that run and its outcome. A failure stays cached.
    pub async fn ready(&self) -> Result<(), EngineError> {
        self.ready.get_or_init(|| self.initialize()).await.clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.ready.get(), Some(Ok(())))
    }

    async fn initialize(&self) -> Result<(), EngineError> {
        info!(owner = %self.owner, "Initializing state machine");
        let mut args = HookArgs::new(HookPhase::OnInitialize, self.owner.clone());
        self.hooks
            .run(&mut args)
            .await
            .map_err(|err| EngineError::Initialization {
                owner: self.owner.to_string(),
                source: into_cause(err),
            })
    }

    /// Execute the `from` -> `to` edge and hand back its context
    pub async fn transition(
        &self,
        from: &str,
        to: &str,
        props: Option<Value>,
    ) -> Result<TransitionContext, EngineError> {
        let mut context = TransitionContext::new(TransitionParams::new(from, to, props));
        self.run_transition(&mut context).await?;
        Ok(context)
    }

    /// Run the phase pipeline over a caller-held context
    pub async fn run_transition(&self, context: &mut TransitionContext) -> Result<(), EngineError> {
        let span = transition_span(&self.owner, context.name(), context.correlation_id());
        async {
            lifecycle_metrics().record_transition();
            let timer = OperationTimer::new(context.name());

            match self.run_phases(context).await {
                Ok(()) => {
                    timer.finish();
                    Ok(())
                }
                Err(cause) => {
                    lifecycle_metrics().record_transition_failure();
                    let name = context.name().to_string();
                    warn!(transition = %name, error = %cause, "Transition failed");

                    let failure = {
                        let original: &(dyn std::error::Error + 'static) = cause.as_ref();
                        Failure::wrap(original)
                    };
                    let mut args = HookArgs::new(HookPhase::OnError, self.owner.clone())
                        .with_transition(&mut *context)
                        .with_error(failure);
                    if let Err(hook_err) = self.hooks.run(&mut args).await {
                        warn!(transition = %name, error = %hook_err, "onError hook failed");
                    }

                    Err(EngineError::Transition {
                        name,
                        source: into_cause(cause),
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_phases(&self, context: &mut TransitionContext) -> anyhow::Result<()> {
        self.ready().await?;

        let mut before = HookArgs::new(HookPhase::OnBeforeTransition, self.owner.clone())
            .with_transition(&mut *context);
        self.hooks.run(&mut before).await?;

        match self.handlers.get(context.name()) {
            Some(handler) => handler.handle(context).await?,
            None => debug!(transition = context.name(), "No handler registered, skipping"),
        }

        let mut after = HookArgs::new(HookPhase::OnAfterTransition, self.owner.clone())
            .with_transition(&mut *context);
        self.hooks.run(&mut after).await?;

        Ok(())
    }
}

impl std::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<&String> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("StateMachine")
            .field("owner", &self.owner)
            .field("handlers", &handlers)
            .field("ready", &self.ready.get())
            .finish()
    }
}

/// Builds a [`StateMachine`] with its per-edge handler map
pub struct StateMachineBuilder {
    owner: Owner,
    hooks: Option<Arc<HookRegistry>>,
    handlers: HashMap<String, Arc<dyn TransitionHandler>>,
}

impl StateMachineBuilder {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            owner: Owner::new(kind),
            hooks: None,
            handlers: HashMap::new(),
        }
    }

    pub fn lineage<I, S>(mut self, lineage: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owner = self.owner.with_lineage(lineage);
        self
    }

    pub fn id(mut self, id: Aseid) -> Self {
        self.owner = self.owner.with_id(id);
        self
    }

    pub fn hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Registering the same edge twice replaces the earlier handler
    pub fn on_transition<H>(mut self, from: &str, to: &str, handler: H) -> Self
    where
        H: TransitionHandler + 'static,
    {
        self.handlers
            .insert(transition_name(from, to), Arc::new(handler));
        self
    }

    pub fn build(self) -> StateMachine {
        let mut machine = StateMachine::new(
            self.owner,
            self.hooks.unwrap_or_else(|| Arc::new(HookRegistry::new())),
        );
        machine.handlers = self.handlers;
        machine
    }
}
