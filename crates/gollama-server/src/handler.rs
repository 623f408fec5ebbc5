//! Per-request glue between a transport, the session store, and the
//! orchestrator. Transport-agnostic: the WebSocket and SSE routes both
//! drive a [`RequestHandler`].

use std::sync::Arc;

use gollama_ai::orchestrator::FALLBACK_REPLY;
use gollama_ai::{AiError, Message, Orchestrator, Role, Status, StatusSink};
use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::SessionStore;

/// Light-hearted "still working" notices, one picked at random per request.
pub const WORKING_NOTICES: [&str; 5] = [
    "Working on it… apparently this takes more than two seconds.",
    "Processing… you'll know when I finally survive this step.",
    "Processing… I'll update you shortly.",
    "Working through the steps… hang tight.",
    "The tools and I are having a deep conversation.",
];

pub fn working_notice() -> &'static str {
    WORKING_NOTICES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(WORKING_NOTICES[0])
}

/// A request whose user message is already recorded in its session.
#[derive(Debug)]
pub struct Turn {
    pub session_id: String,
    history: Vec<Message>,
}

pub struct RequestHandler {
    sessions: SessionStore,
    orchestrator: Arc<Orchestrator>,
}

impl RequestHandler {
    pub fn new(sessions: SessionStore, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            sessions,
            orchestrator,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Resolve (or create) the session and record the user's message.
    pub async fn begin(&self, requested_id: &str, content: &str) -> Turn {
        let session = self.sessions.get_or_create(requested_id).await;
        let user = Message::user(content);
        self.sessions.append(&session.id, user.clone()).await;

        let mut history = session.messages;
        history.push(user);
        Turn {
            session_id: session.id,
            history,
        }
    }

    /// Run the orchestrator for `turn` and store what it produced.
    ///
    /// `on_working` is called at most once, with a notice string, when the
    /// model first reaches for a tool. It must not block.
    pub async fn complete<F>(
        &self,
        turn: Turn,
        on_working: F,
        cancel: &CancellationToken,
    ) -> Result<String, AiError>
    where
        F: Fn(&'static str) + Send + Sync,
    {
        let Turn {
            session_id,
            history,
        } = turn;
        let known = history.len();

        let sink: &StatusSink<'_> = &|status: Status| match status {
            Status::ToolsInvoked { round, tools } => {
                debug!(session = %session_id, round, ?tools, "Tools invoked");
                on_working(working_notice());
            }
        };

        let updated = match self.orchestrator.run(history, Some(sink), cancel).await {
            Ok(updated) => updated,
            Err(AiError::Cancelled) => {
                info!(session = %session_id, "Request cancelled, connection closed");
                return Err(AiError::Cancelled);
            }
            Err(e) => {
                warn!(session = %session_id, error = %e, "Conversation failed");
                return Err(e);
            }
        };

        let produced = updated.get(known..).map(<[Message]>::to_vec).unwrap_or_default();
        self.sessions.append_all(&session_id, produced).await;

        Ok(final_text(&updated))
    }
}

/// Text of the last assistant message, or the fallback if it is empty.
pub fn final_text(history: &[Message]) -> String {
    match history.iter().rev().find(|m| m.role == Role::Assistant) {
        Some(m) if !m.content.trim().is_empty() => m.content.clone(),
        _ => FALLBACK_REPLY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_comes_from_the_fixed_set() {
        for _ in 0..20 {
            assert!(WORKING_NOTICES.contains(&working_notice()));
        }
    }

    #[test]
    fn final_text_uses_last_assistant_message() {
        let history = vec![
            Message::user("q"),
            Message::assistant("first"),
            Message::user("more"),
            Message::assistant("second"),
        ];
        assert_eq!(final_text(&history), "second");
    }

    #[test]
    fn final_text_falls_back_when_empty() {
        let history = vec![Message::user("q"), Message::assistant("   ")];
        assert_eq!(final_text(&history), FALLBACK_REPLY);
        assert_eq!(final_text(&[Message::user("q")]), FALLBACK_REPLY);
    }
}
