use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::commands::{format_millis, CliCommand};
use crate::command::{Command, CommandBehavior, CommandStatus};
use crate::config::LifecycleConfig;
use crate::lifecycle::{FnHook, HookArgs, HookFilter, HookPhase, HookRegistry, LifecycleContext, ScopeNode};
use crate::observability::lifecycle_metrics;

/// Returns its params as the result, or fails on request
#[derive(Debug, Clone)]
pub struct EchoBehavior {
    pub code: String,
    pub fail_with: Option<String>,
}

#[async_trait]
impl CommandBehavior for EchoBehavior {
    fn code(&self) -> String {
        self.code.clone()
    }

    async fn execute(&self, command: &mut Command) -> Result<()> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{message}"));
        }
        let params = command.params().cloned().unwrap_or(Value::Null);
        command.set_result(params)?;
        Ok(())
    }
}

pub struct RunCommand {
    pub code: String,
    pub params: Option<String>,
    pub fail: Option<String>,
    pub output: Option<PathBuf>,
    pub trace_hooks: bool,
    pub config: LifecycleConfig,
}

impl RunCommand {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            params: None,
            fail: None,
            output: None,
            trace_hooks: false,
            config: LifecycleConfig::default(),
        }
    }

    pub fn with_params(mut self, params: Option<String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_failure(mut self, fail: Option<String>) -> Self {
        self.fail = fail;
        self
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn with_trace_hooks(mut self, trace_hooks: bool) -> Self {
        self.trace_hooks = trace_hooks;
        self
    }

    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    fn parse_params(&self) -> Result<Value> {
        match &self.params {
            Some(raw) => serde_json::from_str(raw).context("--params must be valid JSON"),
            None => Ok(Value::Null),
        }
    }

    fn build_hooks(&self) -> Arc<HookRegistry> {
        let hooks = Arc::new(HookRegistry::new());
        if self.trace_hooks {
            for phase in [
                HookPhase::OnInitialize,
                HookPhase::OnBeforeTransition,
                HookPhase::OnAfterTransition,
                HookPhase::OnError,
                HookPhase::OnInit,
                HookPhase::OnBeforeExecute,
                HookPhase::OnExecute,
                HookPhase::OnAfterExecute,
                HookPhase::OnComplete,
                HookPhase::OnFail,
            ] {
                hooks.register(
                    phase,
                    HookFilter::Any,
                    FnHook::new("trace", |args: &mut HookArgs<'_>| {
                        match args.transition() {
                            Some(transition) => println!("   🪝 {} ({})", args.phase, transition.name()),
                            None => println!("   🪝 {}", args.phase),
                        }
                        Ok(())
                    }),
                );
            }
        }
        hooks
    }
}

impl CliCommand for RunCommand {
    async fn execute(&self) -> Result<()> {
        let params = self.parse_params()?;
        let root = ScopeNode::root("cli");
        let context = LifecycleContext::from_config(self.build_hooks(), Arc::clone(&root), &self.config)
            .register_in(root);

        let behavior = EchoBehavior {
            code: self.code.clone(),
            fail_with: self.fail.clone(),
        };
        let mut command = Command::new(behavior, params, context)?;

        println!("🚀 Running command {}", command.aseid());
        command.execute().await?;

        let snapshot = command.to_snapshot();
        match command.status() {
            CommandStatus::Completed => println!(
                "✅ {} in {}",
                command.status(),
                format_millis(snapshot.duration)
            ),
            status => {
                let reason = command
                    .error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown error".to_string());
                println!("❌ {status}: {reason}");
            }
        }

        let json = serde_json::to_string_pretty(&snapshot)?;
        match &self.output {
            Some(path) => {
                tokio::fs::write(path, json)
                    .await
                    .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
                println!("💾 Snapshot written to {}", path.display());
            }
            None => println!("{json}"),
        }

        lifecycle_metrics().log_stats();
        Ok(())
    }
}
