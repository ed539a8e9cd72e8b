//! Hook registry
//!
//! Components subscribe handlers to named phases, optionally narrowed to owners of a
//! given kind. The engine and the command lifecycle resolve the matching handlers for
//! each phase and await them one after another in registration order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::Result;
use tracing::debug;

use crate::command::Command;
use crate::lifecycle::traits::Hook;
use crate::lifecycle::types::{Failure, HookPhase, Owner, TransitionContext};
use crate::observability::lifecycle_metrics;

/// Handle returned by [`HookRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Which owners a registered hook applies to
#[derive(Clone, Default)]
pub enum HookFilter {
    #[default]
    Any,
    /// Owners of this kind or descending from it
    Kind(String),
    Predicate(Arc<dyn Fn(&Owner) -> bool + Send + Sync>),
}

impl HookFilter {
    pub fn kind(kind: impl Into<String>) -> Self {
        HookFilter::Kind(kind.into())
    }

    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Owner) -> bool + Send + Sync + 'static,
    {
        HookFilter::Predicate(Arc::new(predicate))
    }

    pub fn matches(&self, owner: &Owner) -> bool {
        match self {
            HookFilter::Any => true,
            HookFilter::Kind(kind) => owner.is_a(kind),
            HookFilter::Predicate(predicate) => predicate(owner),
        }
    }
}

impl fmt::Debug for HookFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookFilter::Any => f.write_str("Any"),
            HookFilter::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            HookFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Arguments shared by every handler of one phase invocation
pub struct HookArgs<'a> {
    pub phase: HookPhase,
    pub owner: Owner,
    pub transition: Option<&'a mut TransitionContext>,
    pub command: Option<&'a mut Command>,
    pub error: Option<Failure>,
}

impl<'a> HookArgs<'a> {
    pub fn new(phase: HookPhase, owner: Owner) -> Self {
        Self {
            phase,
            owner,
            transition: None,
            command: None,
            error: None,
        }
    }

    pub fn with_transition(mut self, transition: &'a mut TransitionContext) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn with_command(mut self, command: &'a mut Command) -> Self {
        self.command = Some(command);
        self
    }

    pub fn with_error(mut self, error: Failure) -> Self {
        self.error = Some(error);
        self
    }

    pub fn transition(&self) -> Option<&TransitionContext> {
        self.transition.as_deref()
    }

    pub fn transition_mut(&mut self) -> Option<&mut TransitionContext> {
        self.transition.as_deref_mut()
    }

    pub fn command(&self) -> Option<&Command> {
        self.command.as_deref()
    }

    pub fn command_mut(&mut self) -> Option<&mut Command> {
        self.command.as_deref_mut()
    }
}

struct HookEntry {
    id: HookId,
    phase: HookPhase,
    filter: HookFilter,
    hook: Arc<dyn Hook>,
}

/// Explicit subscription registry consulted by the engine
#[derive(Default)]
pub struct HookRegistry {
    entries: RwLock<Vec<HookEntry>>,
    next_id: AtomicU64,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&self, phase: HookPhase, filter: HookFilter, hook: H) -> HookId
    where
        H: Hook + 'static,
    {
        self.register_arc(phase, filter, Arc::new(hook))
    }

    /// Register a hook that is already shared, e.g. one component on several phases
    pub fn register_arc(&self, phase: HookPhase, filter: HookFilter, hook: Arc<dyn Hook>) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(phase = %phase, filter = ?filter, hook = hook.name(), "Registering hook");
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push(HookEntry {
            id,
            phase,
            filter,
            hook,
        });
        id
    }

    pub fn unregister(&self, id: HookId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Hooks matching `phase` and `owner`, in registration order
    pub fn resolve(&self, phase: HookPhase, owner: &Owner) -> Vec<Arc<dyn Hook>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|entry| entry.phase == phase && entry.filter.matches(owner))
            .map(|entry| Arc::clone(&entry.hook))
            .collect()
    }

    /// Await every matching hook in order; the first error stops the phase
    pub async fn run(&self, args: &mut HookArgs<'_>) -> Result<()> {
        let hooks = self.resolve(args.phase, &args.owner);
        for hook in hooks {
            debug!(
                phase = %args.phase,
                owner = %args.owner,
                hook = hook.name(),
                "Invoking hook"
            );
            lifecycle_metrics().record_hook_invocation();
            hook.call(args).await?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.len())
            .finish()
    }
}
