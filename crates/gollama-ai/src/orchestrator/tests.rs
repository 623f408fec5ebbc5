use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::tools::{ToolError, ToolExecutor, ToolKind, ToolRegistry};
use crate::{AiClient, AiError, AiResponse, Message, Role, ToolCall, ToolDefinition};

/// Replays canned backend replies and records what it was sent.
#[derive(Default)]
struct ScriptedClient {
    replies: Mutex<VecDeque<Result<AiResponse, AiError>>>,
    /// (history length, tool count) per request.
    requests: Mutex<Vec<(usize, usize)>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<AiResponse, AiError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        })
    }

    fn requests(&self) -> Vec<(usize, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiClient for ScriptedClient {
    async fn send_message(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<AiResponse, AiError> {
        self.requests
            .lock()
            .unwrap()
            .push((messages.len(), tools.len()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::ApiError("script exhausted".into())))
    }
}

fn text(content: &str) -> Result<AiResponse, AiError> {
    Ok(AiResponse {
        choices: vec![Message::assistant(content)],
        ..Default::default()
    })
}

fn calls(names: &[&str]) -> Result<AiResponse, AiError> {
    let calls = names
        .iter()
        .enumerate()
        .map(|(i, name)| ToolCall {
            id: format!("call_{i}_{name}"),
            name: name.to_string(),
            arguments: "{}".into(),
        })
        .collect();
    Ok(AiResponse {
        choices: vec![Message::assistant("").with_tool_calls(calls)],
        ..Default::default()
    })
}

/// Records every invocation; optionally fails.
struct FakeTool {
    kind: ToolKind,
    log: Arc<Mutex<Vec<ToolKind>>>,
    fail: bool,
}

#[async_trait]
impl ToolExecutor for FakeTool {
    async fn execute(&self, _arguments: &str) -> Result<serde_json::Value, ToolError> {
        self.log.lock().unwrap().push(self.kind);
        if self.fail {
            return Err(ToolError::InvalidArguments("missing field `owner`".into()));
        }
        Ok(serde_json::json!({ "ok": true, "tool": self.kind.name() }))
    }
}

/// Cancels the run it belongs to, then never finishes.
struct HangingTool(CancellationToken);

#[async_trait]
impl ToolExecutor for HangingTool {
    async fn execute(&self, _arguments: &str) -> Result<serde_json::Value, ToolError> {
        self.0.cancel();
        std::future::pending().await
    }
}

fn fake_registry(failing: Option<ToolKind>) -> (Arc<ToolRegistry>, Arc<Mutex<Vec<ToolKind>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = ToolKind::ALL
        .into_iter()
        .fold(ToolRegistry::builder(), |b, kind| {
            b.register(
                kind,
                Arc::new(FakeTool {
                    kind,
                    log: log.clone(),
                    fail: failing == Some(kind),
                }),
            )
        })
        .build()
        .unwrap();
    (Arc::new(registry), log)
}

fn orchestrator(client: Arc<ScriptedClient>, registry: Arc<ToolRegistry>) -> Orchestrator {
    Orchestrator::new(client, registry)
}

fn status_recorder() -> (Arc<Mutex<Vec<Status>>>, Box<StatusSink<'static>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = seen.clone();
    let sink: Box<StatusSink<'static>> = Box::new(move |s| sink_seen.lock().unwrap().push(s));
    (seen, sink)
}

#[tokio::test]
async fn direct_answer_runs_one_round() {
    let client = ScriptedClient::new(vec![text("4")]);
    let (registry, log) = fake_registry(None);

    let out = orchestrator(client.clone(), registry)
        .run(vec![Message::user("What's 2+2")], None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].role, Role::User);
    assert_eq!(out[1].role, Role::Assistant);
    assert_eq!(out[1].content, "4");
    assert_eq!(client.requests(), vec![(1, 5)]);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn branch_then_pr_notifies_once() {
    let client = ScriptedClient::new(vec![
        calls(&["create_github_branch"]),
        calls(&["create_github_pr"]),
        text("Opened PR #5 from fix-crash."),
    ]);
    let (registry, log) = fake_registry(None);
    let (seen, sink) = status_recorder();

    let out = orchestrator(client, registry)
        .run(
            vec![Message::system("sys"), Message::user("Open a PR for the fix")],
            Some(sink.as_ref()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let roles: Vec<Role> = out.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::Tool,
            Role::Assistant,
            Role::Tool,
            Role::Assistant,
        ]
    );
    assert_eq!(out[3].name.as_deref(), Some("create_github_branch"));
    assert_eq!(out[3].tool_call_id.as_deref(), Some("call_0_create_github_branch"));
    assert_eq!(out[5].name.as_deref(), Some("create_github_pr"));
    assert_eq!(out[6].content, "Opened PR #5 from fix-crash.");

    assert_eq!(
        *log.lock().unwrap(),
        vec![ToolKind::CreateBranch, ToolKind::CreatePullRequest]
    );
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Status::ToolsInvoked {
            round: 1,
            tools: vec![ToolKind::CreateBranch],
        }]
    );
}

#[tokio::test]
async fn results_follow_request_order_within_a_round() {
    let client = ScriptedClient::new(vec![
        calls(&["get_repository_files", "get_github_issue_details", "get_repository_files"]),
        text("done"),
    ]);
    let (registry, log) = fake_registry(None);

    let out = orchestrator(client, registry)
        .run(vec![Message::user("look around")], None, &CancellationToken::new())
        .await
        .unwrap();

    let tool_ids: Vec<_> = out
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.tool_call_id.clone().unwrap())
        .collect();
    assert_eq!(
        tool_ids,
        vec![
            "call_0_get_repository_files",
            "call_1_get_github_issue_details",
            "call_2_get_repository_files",
        ]
    );
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn exhausted_budget_asks_for_wrap_up() {
    let mut script: Vec<_> = (0..DEFAULT_MAX_ROUNDS)
        .map(|_| calls(&["get_repository_files"]))
        .collect();
    script.push(text("Here is what I found so far."));
    let client = ScriptedClient::new(script);
    let (registry, _log) = fake_registry(None);
    let (seen, sink) = status_recorder();

    let out = orchestrator(client.clone(), registry)
        .run(
            vec![Message::user("explore everything")],
            Some(sink.as_ref()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // user + 6 x (assistant, tool) + wrap-up prompt + closing reply
    assert_eq!(out.len(), 1 + DEFAULT_MAX_ROUNDS * 2 + 2);
    let tool_rounds = out
        .iter()
        .filter(|m| m.role == Role::Assistant && !m.tool_calls.is_empty())
        .count();
    assert_eq!(tool_rounds, DEFAULT_MAX_ROUNDS);

    let wrap_up = &out[out.len() - 2];
    assert_eq!(wrap_up.role, Role::User);
    assert_eq!(wrap_up.content, WRAP_UP_PROMPT);
    assert_eq!(out.last().unwrap().content, "Here is what I found so far.");

    let requests = client.requests();
    assert_eq!(requests.len(), DEFAULT_MAX_ROUNDS + 1);
    assert_eq!(requests.last().unwrap().1, 0, "wrap-up call must not offer tools");
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn wrap_up_strips_tool_calls_from_closing_reply() {
    let client = ScriptedClient::new(vec![
        calls(&["get_repository_files"]),
        calls(&["get_repository_files"]),
    ]);
    let (registry, _log) = fake_registry(None);

    let out = Orchestrator::new(client, registry)
        .with_max_rounds(1)
        .run(vec![Message::user("go")], None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(out.len(), 5);
    assert!(out[4].tool_calls.is_empty());
}

#[tokio::test]
async fn failed_wrap_up_uses_fallback() {
    let client = ScriptedClient::new(vec![
        calls(&["create_github_branch"]),
        calls(&["create_github_branch"]),
        Err(AiError::ApiError("HTTP 500".into())),
    ]);
    let (registry, _log) = fake_registry(None);

    let out = Orchestrator::new(client, registry)
        .with_max_rounds(2)
        .run(vec![Message::user("branch twice")], None, &CancellationToken::new())
        .await
        .unwrap();

    let last = out.last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, FALLBACK_REPLY);
}

#[tokio::test]
async fn unknown_tool_fails_before_any_execution() {
    let client = ScriptedClient::new(vec![calls(&["create_github_branch", "delete_repository"])]);
    let (registry, log) = fake_registry(None);
    let (seen, sink) = status_recorder();

    let err = orchestrator(client, registry)
        .run(
            vec![Message::user("clean up")],
            Some(sink.as_ref()),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AiError::UnknownTool(ref name) if name == "delete_repository"));
    assert!(log.lock().unwrap().is_empty());
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn tool_error_is_folded_and_loop_continues() {
    let client = ScriptedClient::new(vec![
        calls(&["update_github_file"]),
        text("The update failed because the owner was missing."),
    ]);
    let (registry, _log) = fake_registry(Some(ToolKind::UpdateFile));

    let out = orchestrator(client.clone(), registry)
        .run(vec![Message::user("edit README")], None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(out.len(), 4);
    assert_eq!(out[2].role, Role::Tool);
    assert_eq!(
        out[2].content,
        "Error: failed to parse tool arguments: missing field `owner`"
    );
    assert_eq!(client.requests().len(), 2);
}

#[tokio::test]
async fn tool_success_is_serialized_json() {
    let client = ScriptedClient::new(vec![calls(&["get_github_issue_details"]), text("ok")]);
    let (registry, _log) = fake_registry(None);

    let out = orchestrator(client, registry)
        .run(vec![Message::user("issue 1")], None, &CancellationToken::new())
        .await
        .unwrap();

    let payload: serde_json::Value = serde_json::from_str(&out[2].content).unwrap();
    assert_eq!(payload["tool"], "get_github_issue_details");
}

#[tokio::test]
async fn backend_errors_propagate() {
    let (registry, _log) = fake_registry(None);

    let client = ScriptedClient::new(vec![Err(AiError::NetworkError("connection refused".into()))]);
    let err = orchestrator(client, registry.clone())
        .run(vec![Message::user("hi")], None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AiError::NetworkError(_)));

    let client = ScriptedClient::new(vec![Ok(AiResponse::default())]);
    let err = orchestrator(client, registry)
        .run(vec![Message::user("hi")], None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AiError::NoChoices));
}

#[tokio::test]
async fn cancelled_before_start_makes_no_calls() {
    let client = ScriptedClient::new(vec![text("never")]);
    let (registry, _log) = fake_registry(None);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = orchestrator(client.clone(), registry)
        .run(vec![Message::user("hi")], None, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, AiError::Cancelled));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn cancellation_interrupts_a_running_tool() {
    let cancel = CancellationToken::new();
    let registry = ToolKind::ALL
        .into_iter()
        .fold(ToolRegistry::builder(), |b, kind| {
            let executor: Arc<dyn ToolExecutor> = if kind == ToolKind::CreatePullRequest {
                Arc::new(HangingTool(cancel.clone()))
            } else {
                Arc::new(FakeTool {
                    kind,
                    log: Arc::default(),
                    fail: false,
                })
            };
            b.register(kind, executor)
        })
        .build()
        .unwrap();

    let client = ScriptedClient::new(vec![calls(&["create_github_pr"]), text("unreachable")]);
    let err = orchestrator(client.clone(), Arc::new(registry))
        .run(vec![Message::user("open a PR")], None, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, AiError::Cancelled));
    assert_eq!(client.requests().len(), 1);
}

#[test]
fn max_rounds_is_at_least_one() {
    let (registry, _log) = fake_registry(None);
    let orch = Orchestrator::new(ScriptedClient::new(Vec::new()), registry).with_max_rounds(0);
    assert_eq!(orch.max_rounds(), 1);
}
