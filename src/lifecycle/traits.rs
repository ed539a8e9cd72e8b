// Extension seams - hooks and per-edge transition handlers

use anyhow::Result;
use async_trait::async_trait;

use crate::lifecycle::hooks::HookArgs;
use crate::lifecycle::types::TransitionContext;

/// A handler registered against a hook phase
#[async_trait]
pub trait Hook: Send + Sync {
    /// Run for one phase invocation; may mutate the shared arguments
    async fn call(&self, args: &mut HookArgs<'_>) -> Result<()>;

    /// Name used in logs
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Custom logic for a single `from` -> `to` edge
#[async_trait]
pub trait TransitionHandler: Send + Sync {
    async fn handle(&self, context: &mut TransitionContext) -> Result<()>;
}

/// Adapts a synchronous closure into a [`Hook`]
pub struct FnHook<F> {
    name: String,
    func: F,
}

impl<F> FnHook<F>
where
    F: Fn(&mut HookArgs<'_>) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Hook for FnHook<F>
where
    F: Fn(&mut HookArgs<'_>) -> Result<()> + Send + Sync,
{
    async fn call(&self, args: &mut HookArgs<'_>) -> Result<()> {
        (self.func)(args)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Adapts a synchronous closure into a [`TransitionHandler`]
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> TransitionHandler for FnHandler<F>
where
    F: Fn(&mut TransitionContext) -> Result<()> + Send + Sync,
{
    async fn handle(&self, context: &mut TransitionContext) -> Result<()> {
        (self.0)(context)
    }
}
