// Shared hooks, scopes and behaviors for the integration tests
#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use lifecycle_hooks::lifecycle::HookArgs;
use lifecycle_hooks::{Command, CommandBehavior, Hook, HookPhase, HookRegistry, LifecycleContext, Scope, ScopeNode};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Records which owner each invocation was for
#[derive(Debug, Default)]
pub struct CountingHook {
    pub seen: Mutex<Vec<(HookPhase, String)>>,
}

impl CountingHook {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn invocations(&self) -> Vec<(HookPhase, String)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count_for(&self, owner: &str) -> usize {
        self.invocations().iter().filter(|(_, o)| o == owner).count()
    }
}

#[async_trait]
impl Hook for CountingHook {
    async fn call(&self, args: &mut HookArgs<'_>) -> Result<()> {
        let owner = args
            .owner
            .id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| args.owner.kind().to_string());
        self.seen.lock().unwrap().push((args.phase, owner));
        Ok(())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Initialization hook that yields before finishing, so concurrent callers overlap
#[derive(Debug, Default)]
pub struct SlowInitHook {
    pub runs: AtomicUsize,
    pub fail: bool,
}

impl SlowInitHook {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            runs: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Hook for SlowInitHook {
    async fn call(&self, _args: &mut HookArgs<'_>) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.fail {
            bail!("warm-up failed");
        }
        Ok(())
    }
}

/// Rejects publishing when `props.content` is shorter than ten characters
pub struct ContentLengthGuard;

#[async_trait]
impl Hook for ContentLengthGuard {
    async fn call(&self, args: &mut HookArgs<'_>) -> Result<()> {
        let Some(transition) = args.transition() else {
            return Ok(());
        };
        let content = transition
            .props()
            .and_then(|props| props["content"].as_str())
            .unwrap_or("");
        if content.chars().count() < 10 {
            return Err(anyhow!("content too short"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "content-length-guard"
    }
}

/// Scope that counts how often anything in its tree is destroyed
#[derive(Debug)]
pub struct CountingScope {
    inner: Arc<dyn Scope>,
    destroy_calls: Arc<AtomicUsize>,
}

impl CountingScope {
    pub fn root(name: &str) -> (Arc<dyn Scope>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let scope = Arc::new(Self {
            inner: ScopeNode::root(name),
            destroy_calls: Arc::clone(&calls),
        });
        (scope, calls)
    }
}

impl Scope for CountingScope {
    fn id(&self) -> Uuid {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn parent(&self) -> Option<Arc<dyn Scope>> {
        self.inner.parent()
    }

    fn create_child(&self, name: &str) -> Arc<dyn Scope> {
        Arc::new(Self {
            inner: self.inner.create_child(name),
            destroy_calls: Arc::clone(&self.destroy_calls),
        })
    }

    fn destroy(&self) -> bool {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.destroy()
    }

    fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }
}

/// Sends a notification; the result is the recipient
pub struct SendNotification;

#[async_trait]
impl CommandBehavior for SendNotification {
    fn lineage(&self) -> Vec<String> {
        vec!["notification".to_string()]
    }

    async fn execute(&self, command: &mut Command) -> Result<()> {
        let recipient = command
            .params()
            .and_then(|p| p.get("to"))
            .cloned()
            .unwrap_or(Value::Null);
        command.set_result(serde_json::json!({ "sent_to": recipient }))?;
        Ok(())
    }
}

pub fn registry() -> Arc<HookRegistry> {
    Arc::new(HookRegistry::new())
}

pub fn context_with(hooks: Arc<HookRegistry>) -> LifecycleContext {
    LifecycleContext::in_root(hooks)
}
