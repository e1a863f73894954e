//! Tool trait — the uniform contract every provider's tools implement.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

/// Argument mapping passed to a tool handler.
pub type ToolArgs = Map<String, Value>;

/// Value of the `error` key in a structured invalid-arguments result.
pub const INVALID_ARGUMENTS: &str = "invalid arguments";

// ─────────────────────────────────────────────
// Tool trait
// ─────────────────────────────────────────────

/// Every agent tool implements this trait.
///
/// The agent lists tools via `name()` and `description()` in its prompt and
/// dispatches a detected call via `execute()`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique registry key (e.g. `"read_file"`, `"mcp:files:search"`).
    fn name(&self) -> &str;

    /// Shown verbatim to the model.
    fn description(&self) -> &str;

    /// Informal argument documentation. Not enforced.
    fn input_schema(&self) -> Value;

    /// Run the tool.
    ///
    /// Malformed arguments produce an `Ok` structured result (see
    /// [`parse_args`]); any other failure is an `Err` that propagates to the
    /// caller of the agent.
    async fn execute(&self, args: ToolArgs) -> anyhow::Result<Value>;
}

// ─────────────────────────────────────────────
// Typed arguments
// ─────────────────────────────────────────────

/// Deserialize `args` into a tool's typed argument struct.
///
/// On failure returns the structured result the handler should hand back:
/// `{"error": "invalid arguments", "tool": <name>, "detail": <msg>}`.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: ToolArgs) -> Result<T, Value> {
    serde_json::from_value(Value::Object(args)).map_err(|e| {
        json!({
            "error": INVALID_ARGUMENTS,
            "tool": tool,
            "detail": e.to_string(),
        })
    })
}

/// Whether a tool result is the structured invalid-arguments value.
pub fn is_invalid_args(result: &Value) -> bool {
    result.get("error").and_then(Value::as_str) == Some(INVALID_ARGUMENTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct PathArgs {
        path: String,
        #[serde(default)]
        limit: Option<u32>,
    }

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_args_ok() {
        let parsed: PathArgs = parse_args("read_file", args(json!({"path": "a.txt"}))).unwrap();
        assert_eq!(parsed.path, "a.txt");
        assert_eq!(parsed.limit, None);
    }

    #[test]
    fn test_parse_args_missing_field() {
        let err = parse_args::<PathArgs>("read_file", ToolArgs::new()).unwrap_err();
        assert_eq!(err["error"], "invalid arguments");
        assert_eq!(err["tool"], "read_file");
        assert!(err["detail"].as_str().unwrap().contains("path"));
        assert!(is_invalid_args(&err));
    }

    #[test]
    fn test_parse_args_wrong_type() {
        let err = parse_args::<PathArgs>("read_file", args(json!({"path": 42}))).unwrap_err();
        assert!(is_invalid_args(&err));
    }

    #[test]
    fn test_is_invalid_args_ignores_other_errors() {
        assert!(!is_invalid_args(&json!({"error": "boom"})));
        assert!(!is_invalid_args(&json!({"content": "x"})));
        assert!(!is_invalid_args(&json!("text")));
    }
}
