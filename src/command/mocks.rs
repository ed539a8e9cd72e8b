// Mock command behaviors for testing

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::command::lifecycle::{Command, CommandBehavior};
use crate::lifecycle::{Hook, HookArgs, HookRegistry, LifecycleContext};

/// Result is the input params
#[derive(Debug, Default)]
pub struct EchoCommand;

#[async_trait]
impl CommandBehavior for EchoCommand {
    async fn execute(&self, command: &mut Command) -> Result<()> {
        let params = command.params().cloned().unwrap_or(Value::Null);
        command.set_result(params)?;
        Ok(())
    }
}

/// Business step always errors
#[derive(Debug)]
pub struct BrokenCommand {
    pub message: String,
}

#[async_trait]
impl CommandBehavior for BrokenCommand {
    fn code(&self) -> String {
        "broken".to_string()
    }

    async fn execute(&self, _command: &mut Command) -> Result<()> {
        Err(anyhow!("{}", self.message))
    }
}

/// Fails the command from inside the business step without returning an error
#[derive(Debug)]
pub struct SelfFailingCommand;

#[async_trait]
impl CommandBehavior for SelfFailingCommand {
    fn lineage(&self) -> Vec<String> {
        vec!["validating".to_string()]
    }

    async fn execute(&self, command: &mut Command) -> Result<()> {
        command.fail("rejected by validation").await?;
        Ok(())
    }
}

/// Stages a partial result, then errors
#[derive(Debug)]
pub struct PartialResultCommand;

#[async_trait]
impl CommandBehavior for PartialResultCommand {
    async fn execute(&self, command: &mut Command) -> Result<()> {
        command.set_result(json!({ "partial": true }))?;
        Err(anyhow!("upstream dropped after staging"))
    }
}

/// `onInit` validation that fails commands lacking a `to` param
pub struct RejectMissingRecipient;

#[async_trait]
impl Hook for RejectMissingRecipient {
    async fn call(&self, args: &mut HookArgs<'_>) -> Result<()> {
        if let Some(command) = args.command_mut() {
            if command.params().and_then(|p| p.get("to")).is_none() {
                command.fail("params rejected").await?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "reject-missing-recipient"
    }
}

pub fn test_context() -> LifecycleContext {
    LifecycleContext::in_root(Arc::new(HookRegistry::new()))
}
