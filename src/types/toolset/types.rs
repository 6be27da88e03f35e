use super::tool_object::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolSetCreationError {
    #[error("error validating schema: {0}")]
    Validation(ValidationError),
    #[error("two or more tools have the same name: {0}")]
    NameConflict(String),
}

#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("error deserializing tool call (possible hallucination): {0}")]
    Deserialization(serde_json::Error),
    #[error("tool not in toolset: {0}")]
    NotFound(String),
}
