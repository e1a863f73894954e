//! Tool-call detection in free-form model output.
//!
//! The model is asked to emit `{"tool": "<name>", "args": {...}}` when it
//! wants a tool, but nothing guarantees where (or whether) the object
//! appears. Detection tries the whole trimmed text first, then the span from
//! the first `{` to the last `}`.

use serde_json::Value;

use crate::tools::ToolArgs;

/// A tool call requested by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub args: ToolArgs,
}

/// Parse `text` for a tool call. `None` means the text is a final answer.
pub fn parse_tool_call(text: &str) -> Option<ToolCall> {
    let trimmed = text.trim();
    let whole = if trimmed.starts_with('{') && trimmed.ends_with('}') {
        serde_json::from_str::<Value>(trimmed).ok()
    } else {
        None
    };
    let value = whole.or_else(|| brace_span(text).and_then(|s| serde_json::from_str(s).ok()))?;
    from_value(value)
}

/// The text between the first `{` and the last `}`, inclusive.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn from_value(value: Value) -> Option<ToolCall> {
    let Value::Object(mut object) = value else {
        return None;
    };
    let name = match object.remove("tool")? {
        Value::String(s) => s,
        other => other.to_string(),
    };
    let args = match object.remove("args") {
        Some(Value::Object(args)) => args,
        _ => ToolArgs::new(),
    };
    Some(ToolCall { name, args })
}
