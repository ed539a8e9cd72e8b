// Command Module - Status-Tracked Units of Work
//
// Commands drive themselves through CREATED -> INITIALIZED -> EXECUTING -> COMPLETED/FAILED
// on top of the lifecycle engine, with hook phases and per-instance listeners.

pub mod errors;
pub mod identity;
pub mod lifecycle;
pub mod listeners;
pub mod types;

#[cfg(test)]
pub mod mocks;


pub use errors::CommandError;
pub use identity::{Aseid, AseidError};
pub use lifecycle::{derive_code, BaseCommand, Command, CommandBehavior};
pub use listeners::{listener, Listener, ListenerRegistry};
pub use types::{CommandEvent, CommandInput, CommandSnapshot, CommandStatus};
