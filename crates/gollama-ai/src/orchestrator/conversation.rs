//! Orchestrator construction and the run loop.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{Status, StatusSink, DEFAULT_MAX_ROUNDS, FALLBACK_REPLY, WRAP_UP_PROMPT};
use crate::tools::ToolRegistry;
use crate::{AiClient, AiError, Message, ToolDefinition};

/// Drives one request's tool-calling loop. Cheap to share; holds no
/// per-conversation state.
pub struct Orchestrator {
    client: Arc<dyn AiClient>,
    registry: Arc<ToolRegistry>,
    max_rounds: usize,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn AiClient>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            client,
            registry,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Set the round budget. Clamped to at least one round.
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Run the loop over `history` and return it extended with every
    /// assistant, tool, and wrap-up message produced.
    ///
    /// Fails on a backend error, an empty choice list, an unknown tool
    /// name, or cancellation. Tool failures are folded into the history.
    pub async fn run(
        &self,
        mut history: Vec<Message>,
        status: Option<&StatusSink<'_>>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Message>, AiError> {
        let tools = self.registry.definitions();
        let mut notified = false;

        for round in 1..=self.max_rounds {
            debug!(round, messages = history.len(), "Orchestrator round");

            let reply = self.complete(&history, tools, cancel).await?;
            if reply.tool_calls.is_empty() {
                history.push(reply);
                return Ok(history);
            }

            // Resolve every requested name before running any of them.
            let kinds = reply
                .tool_calls
                .iter()
                .map(|call| {
                    self.registry
                        .lookup(&call.name)
                        .ok_or_else(|| AiError::UnknownTool(call.name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            if !notified {
                notified = true;
                if let Some(sink) = status {
                    sink(Status::ToolsInvoked {
                        round,
                        tools: kinds.clone(),
                    });
                }
            }

            let calls = reply.tool_calls.clone();
            history.push(reply);

            for (call, kind) in calls.iter().zip(kinds) {
                debug!(round, tool = %kind, id = %call.id, "Executing tool");
                let executor = self.registry.executor(kind);
                let result = cancellable(cancel, async {
                    Ok(executor.execute(&call.arguments).await)
                })
                .await?;

                let content = match result {
                    Ok(value) => value.to_string(),
                    Err(e) => {
                        warn!(round, tool = %kind, error = %e, "Tool execution failed");
                        format!("Error: {e}")
                    }
                };
                history.push(Message::tool_result(call, content));
            }
        }

        debug!(rounds = self.max_rounds, "Round budget exhausted, requesting wrap-up");
        history.push(Message::user(WRAP_UP_PROMPT));

        let closing = match self.complete(&history, &[], cancel).await {
            Ok(reply) => reply.with_tool_calls(Vec::new()),
            Err(AiError::Cancelled) => return Err(AiError::Cancelled),
            Err(e) => {
                warn!(error = %e, "Wrap-up call failed, using fallback reply");
                Message::assistant(FALLBACK_REPLY)
            }
        };
        history.push(closing);

        Ok(history)
    }

    /// One backend call; returns the first choice.
    async fn complete(
        &self,
        history: &[Message],
        tools: &[ToolDefinition],
        cancel: &CancellationToken,
    ) -> Result<Message, AiError> {
        let response = cancellable(cancel, self.client.send_message(history, tools)).await?;
        response.choices.into_iter().next().ok_or(AiError::NoChoices)
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, AiError>>,
) -> Result<T, AiError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AiError::Cancelled),
        result = fut => result,
    }
}
