//! The bounded tool-calling loop.
//!
//! An [`Orchestrator`] takes a conversation history, alternates model calls
//! and tool executions for at most `max_rounds` rounds, and returns the
//! history extended with everything it produced.

mod conversation;
mod types;

#[cfg(test)]
mod tests;

pub use conversation::Orchestrator;
pub use types::{Status, StatusSink, DEFAULT_MAX_ROUNDS, FALLBACK_REPLY, WRAP_UP_PROMPT};
