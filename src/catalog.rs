use crate::provider::{ProviderError, ToolProvider};
use crate::types::ToolDescriptor;

use serde::Serialize;
use serde_json::{Value, json};

/// A function definition in the shape the language model expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<&ToolDescriptor> for FunctionSchema {
    fn from(descriptor: &ToolDescriptor) -> Self {
        let parameters = match &descriptor.parameter_schema {
            Value::Null => json!({ "type": "object", "properties": {} }),
            schema => schema.clone(),
        };
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone().unwrap_or_default(),
            parameters,
        }
    }
}

pub fn to_function_schemas(descriptors: &[ToolDescriptor]) -> Vec<FunctionSchema> {
    descriptors.iter().map(FunctionSchema::from).collect()
}

/// Snapshot the provider's catalog for one turn.
pub async fn fetch_catalog(
    provider: &mut dyn ToolProvider,
) -> Result<Vec<FunctionSchema>, ProviderError> {
    let descriptors = provider.list_tools().await?;
    Ok(to_function_schemas(&descriptors))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: Some(format!("{name} things")),
            parameter_schema: json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"]
            }),
        }
    }

    #[test]
    fn keeps_provider_order() {
        let descriptors = [descriptor("recommend_trip"), descriptor("book_trip"), descriptor("greet")];
        let names: Vec<_> = to_function_schemas(&descriptors)
            .into_iter()
            .map(|schema| schema.name)
            .collect();
        assert_eq!(names, ["recommend_trip", "book_trip", "greet"]);
    }

    #[test]
    fn copies_description_and_schema() {
        let schema = FunctionSchema::from(&descriptor("greet"));
        assert_eq!(schema.description, "greet things");
        assert_eq!(schema.parameters["required"][0], "name");
    }

    #[test]
    fn fills_missing_metadata() {
        let schema = FunctionSchema::from(&ToolDescriptor {
            name: "ping".into(),
            description: None,
            parameter_schema: Value::Null,
        });
        assert_eq!(schema.description, "");
        assert_eq!(schema.parameters, json!({ "type": "object", "properties": {} }));
    }
}
