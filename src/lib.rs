// Lifecycle Hooks Library - Hookable State Transitions and Command Lifecycles
// This exposes the core components for testing and integration

pub mod cli;
pub mod command;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod telemetry;

// Re-export key types for easy access
pub use command::{
    Aseid, BaseCommand, Command, CommandBehavior, CommandError, CommandEvent, CommandInput,
    CommandSnapshot, CommandStatus, Listener,
};
pub use config::{config, init_config, LifecycleConfig};
pub use lifecycle::{
    EngineError, Failure, FnHandler, FnHook, Hook, HookArgs, HookFilter, HookId, HookPhase,
    HookRegistry, LifecycleContext, Owner, Scope, ScopeNode, StateMachine, TransitionContext,
    TransitionHandler, TransitionOutcome, TransitionParams,
};
pub use observability::{lifecycle_metrics, LifecycleMetrics, OperationTimer};
pub use telemetry::{generate_correlation_id, init_telemetry};
