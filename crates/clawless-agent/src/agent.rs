//! Agent — the propose/resolve loop.
//!
//! One call to [`Agent::run`] is at most two model calls:
//!
//! 1. **Propose**: system prompt + tool catalogue + history, model answers R1.
//! 2. **Resolve**: if R1 carries a tool call, run the tool once, append R1
//!    and the tool result, and return the model's second answer unchanged.
//!
//! The agent keeps no session state; summary and history come from the
//! caller on every turn.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use clawless_core::store::Store;
use clawless_core::types::Message;
use clawless_providers::LlmClient;

use crate::tool_call::{parse_tool_call, ToolCall};
use crate::tools::{is_invalid_args, sha256_hex, ToolRegistry};

const SYSTEM_PROMPT: &str = "You are a helpful assistant.\nYou have access to tools when necessary.";

const TOOL_PROMPT: &str = "If you need to use a tool, respond with a single JSON object on its own line, \
formatted as {\"tool\": \"tool_name\", \"args\": { ... }}. Otherwise respond normally.\nAvailable tools:\n";

// ─────────────────────────────────────────────
// Tool audit
// ─────────────────────────────────────────────

/// Outcome of one resolved tool call, as recorded in the audit log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditStatus {
    Ok,
    Error,
    NotFound,
    InvalidArgs,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Ok => "ok",
            AuditStatus::Error => "error",
            AuditStatus::NotFound => "not_found",
            AuditStatus::InvalidArgs => "invalid_args",
        }
    }
}

/// Sink for tool-call audit records.
pub trait ToolAuditor: Send + Sync {
    fn record(&self, tool_name: &str, input_hash: &str, status: AuditStatus) -> anyhow::Result<()>;
}

impl ToolAuditor for Store {
    fn record(&self, tool_name: &str, input_hash: &str, status: AuditStatus) -> anyhow::Result<()> {
        self.record_tool_call(tool_name, input_hash, status.as_str())
    }
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    auditor: Option<Arc<dyn ToolAuditor>>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("llm", &self.llm.display_name())
            .field("tools", &self.tools.tool_names())
            .field("audited", &self.auditor.is_some())
            .finish()
    }
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            llm,
            tools,
            auditor: None,
        }
    }

    /// Record every resolved tool call through `auditor`.
    pub fn with_auditor(mut self, auditor: Arc<dyn ToolAuditor>) -> Self {
        self.auditor = Some(auditor);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one turn and return the final answer.
    ///
    /// A tool handler failure is returned as `Err`; the caller decides how
    /// to surface it.
    pub async fn run(&self, summary: &str, history: &[Message]) -> anyhow::Result<String> {
        let mut messages = self.build_messages(summary, history);

        let first = self.llm.invoke(&messages).await?;
        let Some(call) = parse_tool_call(&first) else {
            return Ok(first);
        };

        let Some(result) = self.resolve(&call).await? else {
            return Ok(format!("Tool not found: {}", call.name));
        };

        messages.push(Message::assistant(first));
        messages.push(Message::system(format!("Tool result: {}", result)));
        self.llm.invoke(&messages).await
    }

    /// The propose-phase request: system prompt, tool catalogue, history.
    pub fn build_messages(&self, summary: &str, history: &[Message]) -> Vec<Message> {
        let mut system = SYSTEM_PROMPT.to_string();
        if !summary.is_empty() {
            system.push_str("\nTrack summary: ");
            system.push_str(summary);
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system));
        messages.push(Message::system(self.tool_prompt()));
        messages.extend_from_slice(history);
        messages
    }

    fn tool_prompt(&self) -> String {
        let tools = self.tools.list();
        let catalogue = if tools.is_empty() {
            "(no tools)".to_string()
        } else {
            tools
                .iter()
                .map(|t| format!("- {}: {}", t.name(), t.description()))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!("{TOOL_PROMPT}{catalogue}")
    }

    /// Run the requested tool. `Ok(None)` when no such tool is registered.
    async fn resolve(&self, call: &ToolCall) -> anyhow::Result<Option<Value>> {
        let input_hash = sha256_hex(Value::Object(call.args.clone()).to_string().as_bytes());

        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "tool not found");
            self.audit(&call.name, &input_hash, AuditStatus::NotFound);
            return Ok(None);
        };

        info!(tool = %call.name, "executing tool");
        match tool.execute(call.args.clone()).await {
            Ok(result) => {
                let status = if is_invalid_args(&result) {
                    AuditStatus::InvalidArgs
                } else {
                    AuditStatus::Ok
                };
                self.audit(&call.name, &input_hash, status);
                debug!(tool = %call.name, status = status.as_str(), "tool finished");
                Ok(Some(result))
            }
            Err(e) => {
                self.audit(&call.name, &input_hash, AuditStatus::Error);
                Err(e)
            }
        }
    }

    fn audit(&self, tool_name: &str, input_hash: &str, status: AuditStatus) {
        if let Some(ref auditor) = self.auditor {
            if let Err(e) = auditor.record(tool_name, input_hash, status) {
                warn!(tool = tool_name, error = %e, "failed to record tool audit");
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolArgs};
    use async_trait::async_trait;
    use clawless_core::types::Role;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns canned responses in order and records every request.
    struct MockLlm {
        responses: Mutex<Vec<String>>,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl MockLlm {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<Vec<Message>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlm {
        async fn invoke(&self, messages: &[Message]) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push(messages.to_vec());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok("(no more responses)".into())
            } else {
                Ok(responses.remove(0))
            }
        }
    }

    /// Records the args of every call.
    struct RecordingTool {
        calls: Mutex<Vec<ToolArgs>>,
        fail: bool,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            "lookup"
        }

        fn description(&self) -> &str {
            "Look something up"
        }

        fn input_schema(&self) -> Value {
            json!({ "q": "query" })
        }

        async fn execute(&self, args: ToolArgs) -> anyhow::Result<Value> {
            self.calls.lock().unwrap().push(args);
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            Ok(json!({ "answer": 42 }))
        }
    }

    fn tool(fail: bool) -> Arc<RecordingTool> {
        Arc::new(RecordingTool {
            calls: Mutex::new(Vec::new()),
            fail,
        })
    }

    fn registry_with(tool: Arc<RecordingTool>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(tool);
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_prose_is_returned_unchanged() {
        let llm = MockLlm::new(&["Just an answer."]);
        let tool = tool(false);
        let agent = Agent::new(llm.clone(), registry_with(tool.clone()));

        let answer = agent.run("", &[Message::user("hi")]).await.unwrap();
        assert_eq!(answer, "Just an answer.");
        assert_eq!(llm.requests().len(), 1);
        assert!(tool.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tool_call_then_final_answer() {
        let llm = MockLlm::new(&[
            r#"{"tool": "lookup", "args": {"q": "life"}}"#,
            "The answer is 42.",
        ]);
        let tool = tool(false);
        let agent = Agent::new(llm.clone(), registry_with(tool.clone()));

        let answer = agent.run("", &[Message::user("what is it?")]).await.unwrap();
        assert_eq!(answer, "The answer is 42.");

        let calls = tool.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["q"], "life");

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        let follow_up = &requests[1];
        assert_eq!(follow_up.len(), requests[0].len() + 2);
        let assistant = &follow_up[follow_up.len() - 2];
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.content, r#"{"tool": "lookup", "args": {"q": "life"}}"#);
        let result = follow_up.last().unwrap();
        assert_eq!(result.role, Role::System);
        assert_eq!(result.content, r#"Tool result: {"answer":42}"#);
    }

    #[tokio::test]
    async fn test_second_tool_call_is_final() {
        let llm = MockLlm::new(&[
            r#"{"tool": "lookup", "args": {}}"#,
            r#"{"tool": "lookup", "args": {"again": true}}"#,
        ]);
        let tool = tool(false);
        let agent = Agent::new(llm.clone(), registry_with(tool.clone()));

        let answer = agent.run("", &[Message::user("go")]).await.unwrap();
        assert_eq!(answer, r#"{"tool": "lookup", "args": {"again": true}}"#);
        assert_eq!(tool.calls.lock().unwrap().len(), 1);
        assert_eq!(llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_terminal() {
        let llm = MockLlm::new(&[r#"{"tool": "nope", "args": {}}"#, "unused"]);
        let agent = Agent::new(llm.clone(), Arc::new(ToolRegistry::new()));

        let answer = agent.run("", &[Message::user("x")]).await.unwrap();
        assert_eq!(answer, "Tool not found: nope");
        assert_eq!(llm.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_failure_propagates() {
        let llm = MockLlm::new(&[r#"{"tool": "lookup", "args": {}}"#, "unused"]);
        let agent = Agent::new(llm.clone(), registry_with(tool(true)));

        let err = agent.run("", &[Message::user("x")]).await.unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
        assert_eq!(llm.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_request_layout() {
        let llm = MockLlm::new(&["ok"]);
        let agent = Agent::new(llm.clone(), registry_with(tool(false)));
        let history = vec![Message::user("one"), Message::assistant("two"), Message::user("three")];

        agent.run("Planning a trip", &history).await.unwrap();

        let request = &llm.requests()[0];
        assert_eq!(request.len(), 5);
        assert_eq!(
            request[0].content,
            "You are a helpful assistant.\nYou have access to tools when necessary.\nTrack summary: Planning a trip"
        );
        assert!(request[1].content.starts_with("If you need to use a tool"));
        assert!(request[1].content.ends_with("Available tools:\n- lookup: Look something up"));
        assert_eq!(&request[2..], &history[..]);
    }

    #[test]
    fn test_empty_registry_prompt() {
        let agent = Agent::new(MockLlm::new(&[]), Arc::new(ToolRegistry::new()));
        let messages = agent.build_messages("", &[]);
        assert_eq!(
            messages[0].content,
            "You are a helpful assistant.\nYou have access to tools when necessary."
        );
        assert!(messages[1].content.ends_with("Available tools:\n(no tools)"));
    }

    #[tokio::test]
    async fn test_audit_records_statuses() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let llm = MockLlm::new(&[
            r#"{"tool": "lookup", "args": {"q": 1}}"#,
            "done",
            r#"{"tool": "missing"}"#,
        ]);
        let agent = Agent::new(llm, registry_with(tool(false))).with_auditor(store.clone());

        agent.run("", &[Message::user("a")]).await.unwrap();
        agent.run("", &[Message::user("b")]).await.unwrap();

        let rows = store.recent_tool_calls(10).unwrap();
        let mut seen: Vec<(String, String)> = rows
            .into_iter()
            .map(|(name, _hash, status)| (name, status))
            .collect();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("lookup".to_string(), "ok".to_string()),
                ("missing".to_string(), "not_found".to_string()),
            ]
        );
    }
}
