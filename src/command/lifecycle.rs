//! Command lifecycle
//!
//! A [`Command`] is a status-tracked unit of work. Every status change runs through the
//! owning [`StateMachine`], so transition hooks see `created_initialized`,
//! `initialized_executing`, `executing_completed` and friends, while command phases
//! (`onInit` .. `onFail`) run registered hooks with mutable access to the command and then
//! notify the instance listeners.

use std::any::type_name;
use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, info, warn, Instrument};

use crate::command::errors::CommandError;
use crate::command::identity::Aseid;
use crate::command::listeners::{Listener, ListenerRegistry};
use crate::command::types::{CommandEvent, CommandInput, CommandSnapshot, CommandStatus};
use crate::lifecycle::hooks::HookArgs;
use crate::lifecycle::scope::{LifecycleContext, Scope};
use crate::lifecycle::state_machine::{into_cause, EngineError, StateMachine};
use crate::lifecycle::types::{Failure, HookPhase, Owner};
use crate::observability::lifecycle_metrics;
use crate::telemetry::command_span;

/// Business logic carried by a command
#[async_trait]
pub trait CommandBehavior: Send + Sync {
    /// Stable code, derived from the implementing type's name unless overridden
    fn code(&self) -> String {
        derive_code(type_name::<Self>())
    }

    /// Ancestor kinds hooks may filter on, nearest first
    fn lineage(&self) -> Vec<String> {
        Vec::new()
    }

    /// The `onExecute` step; runs before hooks registered for that phase
    async fn execute(&self, _command: &mut Command) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Behavior with no business step of its own; everything comes from hooks
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseCommand;

impl CommandBehavior for BaseCommand {}

/// `my_app::billing::ChargeCard<T>` -> `charge-card`
pub fn derive_code(type_path: &str) -> String {
    let without_generics = type_path.split('<').next().unwrap_or(type_path);
    let name = without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics);

    let chars: Vec<char> = name.chars().collect();
    let mut code = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            // `HTTPRequest`: the last capital of a run starts the next word
            let ends_acronym = i > 0
                && chars[i - 1].is_uppercase()
                && chars.get(i + 1).is_some_and(|next| next.is_lowercase());
            if prev_lower || ends_acronym {
                code.push('-');
            }
            code.extend(ch.to_lowercase());
            prev_lower = false;
        } else if ch == '_' {
            code.push('-');
            prev_lower = false;
        } else {
            code.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    code
}

pub struct Command {
    aseid: Aseid,
    code: String,
    status: CommandStatus,
    params: Option<Value>,
    result: Option<Value>,
    error: Option<Failure>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    listeners: ListenerRegistry,
    behavior: Arc<dyn CommandBehavior>,
    context: LifecycleContext,
    machine: StateMachine,
    execution_scope: Option<Arc<dyn Scope>>,
}

impl Command {
    pub fn new<B>(
        behavior: B,
        input: impl Into<CommandInput>,
        context: LifecycleContext,
    ) -> Result<Self, CommandError>
    where
        B: CommandBehavior + 'static,
    {
        Self::from_shared(Arc::new(behavior), input, context)
    }

    /// Build from fresh params, a snapshot, or a bare identifier. Nothing runs yet.
    pub fn from_shared(
        behavior: Arc<dyn CommandBehavior>,
        input: impl Into<CommandInput>,
        context: LifecycleContext,
    ) -> Result<Self, CommandError> {
        let derived_code = behavior.code();

        let command = match input.into() {
            CommandInput::Params(params) => {
                let aseid = Aseid::generate(context.identity(), &derived_code);
                Self::blank(behavior, context, aseid, derived_code, Some(params))
            }
            CommandInput::Identifier(raw) => {
                let aseid: Aseid = raw.parse()?;
                Self::blank(behavior, context, aseid, derived_code, None)
            }
            CommandInput::Snapshot(snapshot) => {
                let snapshot = *snapshot;
                let mut command =
                    Self::blank(behavior, context, snapshot.aseid, snapshot.code, None);
                command.status = snapshot.status;
                command.created_at = snapshot.created_at;
                command.started_at = snapshot.started_at;
                command.ended_at = snapshot.ended_at;
                command.result = snapshot.result;
                command.error = snapshot.error;
                command
            }
        };

        debug!(command = %command.aseid, status = %command.status, "Command constructed");
        Ok(command)
    }

    fn blank(
        behavior: Arc<dyn CommandBehavior>,
        context: LifecycleContext,
        aseid: Aseid,
        code: String,
        params: Option<Value>,
    ) -> Self {
        let mut lineage = behavior.lineage();
        lineage.push("command".to_string());
        let machine = StateMachine::builder(code.as_str())
            .lineage(lineage)
            .id(aseid.clone())
            .hooks(Arc::clone(context.hooks()))
            .build();
        Self {
            aseid,
            code,
            status: CommandStatus::Created,
            params,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            listeners: ListenerRegistry::new(),
            behavior,
            context,
            machine,
            execution_scope: None,
        }
    }

    /// Re-supply input, e.g. after restoring from a snapshot
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    pub fn aseid(&self) -> &Aseid {
        &self.aseid
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&Failure> {
        self.error.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn owner(&self) -> &Owner {
        self.machine.owner()
    }

    pub fn context(&self) -> &LifecycleContext {
        &self.context
    }

    pub fn execution_scope(&self) -> Option<&Arc<dyn Scope>> {
        self.execution_scope.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Live while running, frozen once ended, `None` before start
    pub fn duration(&self) -> Option<Duration> {
        self.started_at
            .map(|started| self.ended_at.unwrap_or_else(Utc::now) - started)
    }

    pub fn idle_time(&self) -> Option<Duration> {
        self.started_at.map(|started| started - self.created_at)
    }

    /// Stage the result while executing; `complete(None)` keeps it
    pub fn set_result(&mut self, result: Value) -> Result<(), CommandError> {
        if self.status.is_terminal() {
            return Err(CommandError::ResultProcessing {
                code: self.code.clone(),
                message: format!("cannot set result on a {} command", self.status),
            });
        }
        self.result = Some(result);
        Ok(())
    }

    pub fn on(&mut self, event: CommandEvent, listener: Listener) -> bool {
        self.listeners.on(event, listener)
    }

    pub fn off(&mut self, event: CommandEvent, listener: &Listener) -> bool {
        self.listeners.off(event, listener)
    }

    /// Call every listener of `event` in order; the first error is returned as is
    pub fn emit(&self, event: CommandEvent) -> anyhow::Result<()> {
        for listener in self.listeners.listeners(event) {
            listener(self)?;
        }
        Ok(())
    }

    /// CREATED -> INITIALIZED
    pub async fn init(&mut self) -> Result<(), CommandError> {
        if self.status != CommandStatus::Created {
            return Ok(());
        }

        if !self.context.check_scope_inheritance() {
            return Err(CommandError::ScopeBinding {
                code: self.code.clone(),
                expected: self.context.root().name().to_string(),
            });
        }

        if self.execution_scope.is_none() {
            self.execution_scope = self.context.create_child_scope(&self.aseid.to_string());
        }

        match self.run_init().await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Err(fail_err) = self.fail(&err).await {
                    warn!(command = %self.aseid, error = %fail_err, "Failed to record init failure");
                }
                Err(err)
            }
        }
    }

    async fn run_init(&mut self) -> Result<(), CommandError> {
        self.machine
            .transition(
                CommandStatus::Created.state_name(),
                CommandStatus::Initialized.state_name(),
                self.params.clone(),
            )
            .await?;

        self.run_phase(HookPhase::OnInit)
            .await
            .map_err(|err| self.command_error(err))?;

        // an onInit hook may have already failed the command
        if self.status.is_terminal() {
            debug!(command = %self.aseid, status = %self.status, "Command ended during init");
            return Ok(());
        }

        self.status = CommandStatus::Initialized;
        info!(command = %self.aseid, "Command initialized");
        self.emit_checked(CommandEvent::OnInit)
    }

    /// Run the whole pipeline and return the stored result.
    ///
    /// Failures inside the pipeline end up in `status`/`error`; only structural
    /// errors (scope binding, init) are returned as `Err`.
    pub async fn execute(&mut self) -> Result<Option<Value>, CommandError> {
        let span = command_span(&self.code, &self.aseid.to_string());
        self.execute_inner().instrument(span).await
    }

    async fn execute_inner(&mut self) -> Result<Option<Value>, CommandError> {
        if self.status.is_terminal() {
            debug!(command = %self.aseid, status = %self.status, "Command already finished");
            return Ok(self.result.clone());
        }

        if self.status == CommandStatus::Created {
            self.init().await?;
        }

        if self.status != CommandStatus::Initialized {
            debug!(command = %self.aseid, status = %self.status, "Command not ready to execute");
            return Ok(self.result.clone());
        }

        if let Err(err) = self
            .machine
            .transition(
                CommandStatus::Initialized.state_name(),
                CommandStatus::Executing.state_name(),
                self.params.clone(),
            )
            .await
        {
            // onError hooks already ran inside the engine
            self.capture_failure(Failure::from(&err), false).await?;
            return Ok(self.result.clone());
        }

        self.status = CommandStatus::Executing;
        self.started_at = Some(Utc::now());
        info!(command = %self.aseid, "Command executing");

        match self.run_pipeline().await {
            Ok(()) => self.complete(None).await?,
            Err(err) => {
                let failure = self.execution_failure(err);
                self.capture_failure(failure, true).await?;
            }
        }

        Ok(self.result.clone())
    }

    async fn run_pipeline(&mut self) -> anyhow::Result<()> {
        let phases = [
            (HookPhase::OnBeforeExecute, CommandEvent::OnBeforeExecute),
            (HookPhase::OnExecute, CommandEvent::OnExecute),
            (HookPhase::OnAfterExecute, CommandEvent::OnAfterExecute),
        ];

        for (phase, event) in phases {
            if phase == HookPhase::OnExecute {
                let behavior = Arc::clone(&self.behavior);
                behavior.execute(self).await?;
                if self.status.is_terminal() {
                    return Ok(());
                }
            }

            self.run_phase(phase).await?;
            if self.status.is_terminal() {
                return Ok(());
            }
            self.emit(event)?;
        }

        Ok(())
    }

    /// Mark COMPLETED. `None` keeps a result staged with [`Command::set_result`].
    pub async fn complete(&mut self, result: Option<Value>) -> Result<(), CommandError> {
        if self.status.is_terminal() {
            debug!(command = %self.aseid, status = %self.status, "complete() ignored");
            return Ok(());
        }

        let from = self.status;
        if let Some(result) = result {
            self.result = Some(result);
        }
        self.status = CommandStatus::Completed;
        self.ended_at = Some(Utc::now());
        lifecycle_metrics().record_command_completed();
        info!(command = %self.aseid, "Command completed");

        let props = self.result.clone();
        let outcome = self
            .finish(from, props, HookPhase::OnComplete, CommandEvent::OnComplete)
            .await;
        self.destroy_scope();
        outcome
    }

    /// Mark FAILED, wrapping non-framework errors into a [`Failure`]
    pub async fn fail(&mut self, error: impl Into<Failure>) -> Result<(), CommandError> {
        if self.status.is_terminal() {
            debug!(command = %self.aseid, status = %self.status, "fail() ignored");
            return Ok(());
        }

        let from = self.status;
        let failure = error.into();
        warn!(command = %self.aseid, code = %failure.code, error = %failure, "Command failed");
        self.error = Some(failure);
        self.result = None;
        self.status = CommandStatus::Failed;
        self.ended_at = Some(Utc::now());
        lifecycle_metrics().record_command_failed();

        let outcome = self
            .finish(from, None, HookPhase::OnFail, CommandEvent::OnFail)
            .await;
        self.destroy_scope();
        outcome
    }

    /// Fail with [`CommandError::Interrupted`]
    pub async fn interrupt(&mut self, reason: impl Into<String>) -> Result<(), CommandError> {
        let err = CommandError::Interrupted {
            code: self.code.clone(),
            reason: reason.into(),
        };
        self.fail(&err).await
    }

    async fn finish(
        &mut self,
        from: CommandStatus,
        props: Option<Value>,
        phase: HookPhase,
        event: CommandEvent,
    ) -> Result<(), CommandError> {
        self.machine
            .transition(from.state_name(), self.status.state_name(), props)
            .await?;
        self.run_phase(phase)
            .await
            .map_err(|err| self.command_error(err))?;
        self.emit_checked(event)
    }

    async fn capture_failure(&mut self, failure: Failure, run_hooks: bool) -> Result<(), CommandError> {
        if self.status.is_terminal() {
            return Ok(());
        }

        if run_hooks {
            let hooks = Arc::clone(self.context.hooks());
            let owner = self.machine.owner().clone();
            let outcome = {
                let mut args = HookArgs::new(HookPhase::OnError, owner)
                    .with_command(&mut *self)
                    .with_error(failure.clone());
                hooks.run(&mut args).await
            };
            if let Err(hook_err) = outcome {
                warn!(command = %self.aseid, error = %hook_err, "onError hook failed");
            }
        }

        if let Err(listener_err) = self.emit(CommandEvent::OnError) {
            warn!(command = %self.aseid, error = %listener_err, "onError listener failed");
        }

        self.fail(failure).await
    }

    async fn run_phase(&mut self, phase: HookPhase) -> anyhow::Result<()> {
        let hooks = Arc::clone(self.context.hooks());
        let owner = self.machine.owner().clone();
        let mut args = HookArgs::new(phase, owner).with_command(&mut *self);
        hooks.run(&mut args).await
    }

    fn emit_checked(&self, event: CommandEvent) -> Result<(), CommandError> {
        self.emit(event).map_err(|err| CommandError::Listener {
            code: self.code.clone(),
            event,
            source: into_cause(err),
        })
    }

    fn destroy_scope(&mut self) {
        if let Some(scope) = self.execution_scope.as_ref() {
            scope.destroy();
        }
    }

    fn command_error(&self, err: anyhow::Error) -> CommandError {
        match err.downcast::<CommandError>() {
            Ok(command_err) => command_err,
            Err(err) => match err.downcast::<EngineError>() {
                Ok(engine_err) => CommandError::Engine(engine_err),
                Err(err) => CommandError::Execution {
                    code: self.code.clone(),
                    source: into_cause(err),
                },
            },
        }
    }

    fn execution_failure(&self, err: anyhow::Error) -> Failure {
        let is_framework = {
            let root: &(dyn StdError + 'static) = err.as_ref();
            root.is::<Failure>() || root.is::<CommandError>() || root.is::<EngineError>()
        };
        if is_framework {
            Failure::from(err)
        } else {
            Failure::from(self.command_error(err))
        }
    }

    pub fn to_snapshot(&self) -> CommandSnapshot {
        CommandSnapshot {
            aseid: self.aseid.clone(),
            code: self.code.clone(),
            status: self.status,
            params: self.params.clone(),
            created_at: self.created_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration: self.duration().map(|d| d.num_milliseconds()),
            idle_time: self.idle_time().map(|d| d.num_milliseconds()),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("aseid", &self.aseid)
            .field("code", &self.code)
            .field("status", &self.status)
            .field("params", &self.params)
            .field("result", &self.result)
            .field("error", &self.error)
            .field("listeners", &self.listeners)
            .finish()
    }
}
