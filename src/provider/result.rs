use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// Any non-text part, kept as its JSON string form.
    Opaque(String),
}

/// A tool result resolved once at the provider boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResult {
    Text(String),
    Parts(Vec<ContentPart>),
    Opaque(String),
}

impl ToolResult {
    /// Resolve the `result` member of an MCP `tools/call` response.
    pub fn from_call_result(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(mut object) => match object.remove("content") {
                Some(Value::Array(parts)) if !parts.is_empty() => {
                    Self::Parts(parts.into_iter().map(ContentPart::from_value).collect())
                }
                Some(Value::Array(parts)) => match object.remove("structuredContent") {
                    Some(structured) => Self::Opaque(structured.to_string()),
                    None => Self::Parts(parts.into_iter().map(ContentPart::from_value).collect()),
                },
                Some(other) => {
                    object.insert("content".to_string(), other);
                    Self::Opaque(Value::Object(object).to_string())
                }
                None => Self::Opaque(Value::Object(object).to_string()),
            },
            other => Self::Opaque(other.to_string()),
        }
    }
}

impl ContentPart {
    fn from_value(value: Value) -> Self {
        match value.get("text").and_then(Value::as_str) {
            Some(text) => Self::Text(text.to_string()),
            None => Self::Opaque(value.to_string()),
        }
    }
}

/// Whether an MCP `tools/call` result marks a tool-side failure.
pub(crate) fn is_error_result(value: &Value) -> bool {
    value
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
