use crate::provider::{ContentPart, ToolResult};

/// Flatten a tool result into the text handed back to the model.
pub fn normalize_text(result: &ToolResult) -> String {
    match result {
        ToolResult::Text(text) => text.clone(),
        ToolResult::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => text.as_str(),
                ContentPart::Opaque(raw) => raw.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ToolResult::Opaque(raw) => raw.clone(),
    }
}
