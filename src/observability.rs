use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Process-wide lifecycle counters
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
    pub transitions: AtomicU64,
    pub transition_failures: AtomicU64,
    pub hook_invocations: AtomicU64,
    pub commands_completed: AtomicU64,
    pub commands_failed: AtomicU64,
}

impl LifecycleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition_failure(&self) {
        self.transition_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hook_invocation(&self) {
        self.hook_invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command_completed(&self) {
        self.commands_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command_failed(&self) {
        self.commands_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> LifecycleStats {
        LifecycleStats {
            transitions: self.transitions.load(Ordering::Relaxed),
            transition_failures: self.transition_failures.load(Ordering::Relaxed),
            hook_invocations: self.hook_invocations.load(Ordering::Relaxed),
            commands_completed: self.commands_completed.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Lifecycle metrics: transitions={}, transition_failures={}, hooks={}, completed={}, failed={}",
            stats.transitions,
            stats.transition_failures,
            stats.hook_invocations,
            stats.commands_completed,
            stats.commands_failed
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleStats {
    pub transitions: u64,
    pub transition_failures: u64,
    pub hook_invocations: u64,
    pub commands_completed: u64,
    pub commands_failed: u64,
}

/// Global metrics instance
static LIFECYCLE_METRICS: std::sync::LazyLock<LifecycleMetrics> =
    std::sync::LazyLock::new(LifecycleMetrics::new);

pub fn lifecycle_metrics() -> &'static LifecycleMetrics {
    &LIFECYCLE_METRICS
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        debug!(
            operation = %self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
