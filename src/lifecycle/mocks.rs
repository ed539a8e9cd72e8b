// Mock hooks for testing - record calls, no side effects

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::lifecycle::hooks::HookArgs;
use crate::lifecycle::traits::Hook;
use crate::lifecycle::types::HookPhase;

/// One observed hook invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub phase: HookPhase,
    pub owner: String,
    pub transition: Option<String>,
    pub error_code: Option<String>,
}

/// Hook that records every invocation it receives
#[derive(Debug, Default)]
pub struct RecordingHook {
    pub label: String,
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingHook {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn get_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn phases(&self) -> Vec<HookPhase> {
        self.get_calls().into_iter().map(|c| c.phase).collect()
    }

    pub fn count(&self, phase: HookPhase) -> usize {
        self.get_calls().iter().filter(|c| c.phase == phase).count()
    }
}

#[async_trait]
impl Hook for RecordingHook {
    async fn call(&self, args: &mut HookArgs<'_>) -> Result<()> {
        self.calls.lock().unwrap().push(RecordedCall {
            phase: args.phase,
            owner: args.owner.to_string(),
            transition: args.transition().map(|t| t.name().to_string()),
            error_code: args.error.as_ref().map(|e| e.code.clone()),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Hook that always fails with the configured message
#[derive(Debug)]
pub struct FailingHook {
    pub message: String,
    pub attempts: AtomicUsize,
}

impl FailingHook {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Hook for FailingHook {
    async fn call(&self, _args: &mut HookArgs<'_>) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("{}", self.message))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
