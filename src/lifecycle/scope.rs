// Scope contract and the explicit context handed to every lifecycle owner

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::config::{IdentityConfig, LifecycleConfig};
use crate::lifecycle::hooks::HookRegistry;
use crate::lifecycle::traits::Hook;
use crate::lifecycle::types::{HookPhase, Owner};

/// Resource-lifetime boundary
pub trait Scope: Send + Sync + fmt::Debug {
    fn id(&self) -> Uuid;

    fn name(&self) -> &str;

    fn parent(&self) -> Option<Arc<dyn Scope>>;

    fn create_child(&self, name: &str) -> Arc<dyn Scope>;

    /// Returns true only for the call that actually tore the scope down
    fn destroy(&self) -> bool;

    fn is_destroyed(&self) -> bool;

    /// True for `ancestor` itself or any scope above this one
    fn inherits_from(&self, ancestor: &dyn Scope) -> bool {
        if self.id() == ancestor.id() {
            return true;
        }
        let mut current = self.parent();
        while let Some(scope) = current {
            if scope.id() == ancestor.id() {
                return true;
            }
            current = scope.parent();
        }
        false
    }
}

#[derive(Debug)]
struct ScopeInner {
    id: Uuid,
    name: String,
    parent: Option<ScopeNode>,
    destroyed: AtomicBool,
}

/// In-memory scope tree
#[derive(Debug, Clone)]
pub struct ScopeNode {
    inner: Arc<ScopeInner>,
}

impl ScopeNode {
    pub fn root(name: impl Into<String>) -> Arc<dyn Scope> {
        Arc::new(Self::build(name.into(), None))
    }

    fn build(name: String, parent: Option<ScopeNode>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: Uuid::new_v4(),
                name,
                parent,
                destroyed: AtomicBool::new(false),
            }),
        }
    }
}

impl Scope for ScopeNode {
    fn id(&self) -> Uuid {
        self.inner.id
    }

    fn name(&self) -> &str {
        &self.inner.name
    }

    fn parent(&self) -> Option<Arc<dyn Scope>> {
        self.inner
            .parent
            .as_ref()
            .map(|parent| Arc::new(parent.clone()) as Arc<dyn Scope>)
    }

    fn create_child(&self, name: &str) -> Arc<dyn Scope> {
        Arc::new(Self::build(name.to_string(), Some(self.clone())))
    }

    fn destroy(&self) -> bool {
        let first = !self.inner.destroyed.swap(true, Ordering::AcqRel);
        if first {
            debug!(scope = %self.inner.name, id = %self.inner.id, "Scope destroyed");
        }
        first
    }

    fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }
}

/// Hooks, scopes and identity settings passed explicitly to lifecycle owners
#[derive(Debug, Clone)]
pub struct LifecycleContext {
    hooks: Arc<HookRegistry>,
    root: Arc<dyn Scope>,
    scope: Option<Arc<dyn Scope>>,
    identity: IdentityConfig,
}

impl LifecycleContext {
    /// Context expecting commands to live under `root`; not yet registered anywhere
    pub fn new(hooks: Arc<HookRegistry>, root: Arc<dyn Scope>) -> Self {
        Self {
            hooks,
            root,
            scope: None,
            identity: IdentityConfig::default(),
        }
    }

    /// Fresh root scope with registration directly in it
    pub fn in_root(hooks: Arc<HookRegistry>) -> Self {
        let root = ScopeNode::root("root");
        Self::new(hooks, Arc::clone(&root)).register_in(root)
    }

    pub fn from_config(hooks: Arc<HookRegistry>, root: Arc<dyn Scope>, config: &LifecycleConfig) -> Self {
        Self::new(hooks, root).with_identity(config.identity.clone())
    }

    pub fn with_identity(mut self, identity: IdentityConfig) -> Self {
        self.identity = identity;
        self
    }

    /// Same context, bound to the scope a command gets registered in
    pub fn register_in(&self, scope: Arc<dyn Scope>) -> Self {
        Self {
            scope: Some(scope),
            ..self.clone()
        }
    }

    pub fn hooks(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    pub fn root(&self) -> &Arc<dyn Scope> {
        &self.root
    }

    pub fn scope(&self) -> Option<&Arc<dyn Scope>> {
        self.scope.as_ref()
    }

    pub fn identity(&self) -> &IdentityConfig {
        &self.identity
    }

    pub fn resolve_hooks(&self, phase: HookPhase, owner: &Owner) -> Vec<Arc<dyn Hook>> {
        self.hooks.resolve(phase, owner)
    }

    /// Child of the registration scope, if there is one
    pub fn create_child_scope(&self, name: &str) -> Option<Arc<dyn Scope>> {
        self.scope.as_ref().map(|scope| scope.create_child(name))
    }

    pub fn check_scope_inheritance(&self) -> bool {
        match &self.scope {
            Some(scope) => scope.inherits_from(self.root.as_ref()),
            None => false,
        }
    }
}
