//! Orchestrator constants and status events.

use crate::tools::ToolKind;

pub const DEFAULT_MAX_ROUNDS: usize = 6;

/// Appended as a user message when the round budget runs out.
pub const WRAP_UP_PROMPT: &str = "You have reached the limit of tool calls for this request. \
Please summarize what you have done so far and what is left to do, without calling any more tools.";

/// Closing reply used when the wrap-up call fails.
pub const FALLBACK_REPLY: &str =
    "I've completed all requested operations. Check the repository for the changes.";

/// Coarse progress reported while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The model asked for tools. Reported once per run, on the first tool round.
    ToolsInvoked { round: usize, tools: Vec<ToolKind> },
}

/// Receives [`Status`] events. Must not block.
pub type StatusSink<'a> = dyn Fn(Status) + Send + Sync + 'a;
