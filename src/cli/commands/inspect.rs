use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::commands::{format_millis, CliCommand};
use crate::command::{BaseCommand, Command, CommandSnapshot};
use crate::lifecycle::{HookRegistry, LifecycleContext};

pub struct InspectCommand {
    pub file: PathBuf,
}

impl InspectCommand {
    pub fn new(file: PathBuf) -> Self {
        Self { file }
    }

    async fn load(&self) -> Result<CommandSnapshot> {
        let raw = tokio::fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a command snapshot", self.file.display()))
    }
}

impl CliCommand for InspectCommand {
    async fn execute(&self) -> Result<()> {
        let snapshot = self.load().await?;
        let had_params = snapshot.params.is_some();
        let context = LifecycleContext::in_root(Arc::new(HookRegistry::new()));
        let command = Command::new(BaseCommand, snapshot, context)?;
        let restored = command.to_snapshot();

        println!("🔎 Command {}", command.aseid());
        println!("   📋 Code: {}", command.code());
        println!("   🏷️  Status: {}", command.status());
        println!("   🕐 Created: {}", command.created_at().to_rfc3339());
        if let Some(started) = command.started_at() {
            println!("   ▶️  Started: {}", started.to_rfc3339());
        }
        if let Some(ended) = command.ended_at() {
            println!("   ⏹️  Ended: {}", ended.to_rfc3339());
        }
        println!("   ⏱️  Duration: {}", format_millis(restored.duration));
        println!("   💤 Idle: {}", format_millis(restored.idle_time));

        if let Some(result) = command.result() {
            println!("   📦 Result: {result}");
        }
        if let Some(error) = command.error() {
            println!("   ❌ Error [{}]: {}", error.code, error);
            if let Some(cause) = &error.cause {
                println!("      caused by: {cause}");
            }
        }
        if had_params {
            println!("   💡 Params are not restored from snapshots; re-supply them to run again");
        }
        Ok(())
    }
}
