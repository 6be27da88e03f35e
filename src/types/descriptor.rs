use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name, description and argument schema of one provider operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub parameter_schema: Value,
}
