// Per-instance observer registry, independent of the hook registry

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::command::lifecycle::Command;
use crate::command::types::CommandEvent;

/// Callback receiving the command that emitted the event
pub type Listener = Arc<dyn Fn(&Command) -> Result<()> + Send + Sync>;

/// Wrap a closure as a [`Listener`]; keep the returned handle to `off` it later
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Command) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Listeners keyed by event; each event holds a set (by handle identity) kept in
/// registration order
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: HashMap<CommandEvent, Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when this exact handle was already subscribed
    pub fn on(&mut self, event: CommandEvent, listener: Listener) -> bool {
        let entries = self.listeners.entry(event).or_default();
        if entries.iter().any(|existing| Arc::ptr_eq(existing, &listener)) {
            return false;
        }
        entries.push(listener);
        true
    }

    pub fn off(&mut self, event: CommandEvent, listener: &Listener) -> bool {
        let Some(entries) = self.listeners.get_mut(&event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|existing| !Arc::ptr_eq(existing, listener));
        entries.len() != before
    }

    /// Snapshot of the listeners for `event`, in registration order
    pub fn listeners(&self, event: CommandEvent) -> Vec<Listener> {
        self.listeners.get(&event).cloned().unwrap_or_default()
    }

    pub fn count(&self, event: CommandEvent) -> usize {
        self.listeners.get(&event).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&CommandEvent, usize> =
            self.listeners.iter().map(|(event, l)| (event, l.len())).collect();
        f.debug_struct("ListenerRegistry").field("listeners", &counts).finish()
    }
}
