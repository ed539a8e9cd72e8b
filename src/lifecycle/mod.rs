// Lifecycle Module - Hookable Transition Engine
//
// A generic state machine whose transitions run as ordered hook phases, plus the
// explicit registry and scope context that extensions plug into.

pub mod hooks;
pub mod scope;
pub mod state_machine;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod mocks;


pub use hooks::{HookArgs, HookFilter, HookId, HookRegistry};
pub use scope::{LifecycleContext, Scope, ScopeNode};
pub use state_machine::{Cause, EngineError, StateMachine, StateMachineBuilder};
pub use traits::{FnHandler, FnHook, Hook, TransitionHandler};
pub use types::{
    transition_name, Failure, HookPhase, Owner, TransitionContext, TransitionOutcome,
    TransitionParams,
};
