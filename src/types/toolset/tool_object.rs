use crate::types::{AsyncTool, AsyncToolWrapper, Tool, ToolDescriptor};

use schemars::JsonSchema;
use schemars::schema::{Schema, SchemaObject};
use schemars::schema_for;
use serde::de::Deserialize;
use serde_json::Error as JsonError;
use serde_json::Value;
use thiserror::Error;

type ToolTraitObject<T> = Box<dyn Tool<Context = T> + Send + Sync>;
type Deserializer<T> =
    Box<dyn Fn(&str) -> Result<ToolTraitObject<T>, serde_json::Error> + Send + Sync>;

type AsyncToolTraitObject<T> = Box<dyn AsyncTool<Context = T>>;
type AsyncDeserializer<T> =
    Box<dyn Fn(&str) -> Result<AsyncToolTraitObject<T>, serde_json::Error> + Send + Sync>;

pub type SyncToolObject<Context> = ToolObject<Deserializer<Context>>;
pub type AsyncToolObject<Context> = ToolObject<AsyncDeserializer<Context>>;

pub struct ToolObject<T> {
    pub json_schema: Value,
    pub description: String,
    pub name: String,
    deserializer: T,
}

impl<R> ToolObject<Box<dyn Fn(&str) -> Result<R, serde_json::Error> + Send + Sync>> {
    pub fn try_deserialize(&self, data: &str) -> Result<R, serde_json::Error> {
        (self.deserializer)(data)
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("schema is missing a title or description")]
    MissingMetadata,
    #[error("could not convert to json")]
    JsonSerialization(JsonError),
}

impl<T> From<&ToolObject<T>> for ToolDescriptor {
    fn from(value: &ToolObject<T>) -> Self {
        Self {
            name: value.name.clone(),
            description: Some(value.description.clone()),
            parameter_schema: value.json_schema.clone(),
        }
    }
}

impl<D> ToolObject<D> {
    fn build<T: JsonSchema>(deserializer: D) -> Result<Self, ValidationError> {
        let (name, description, json_schema) = describe::<T>()?;
        Ok(Self {
            name,
            json_schema,
            description,
            deserializer,
        })
    }
}

impl<C> ToolObject<Deserializer<C>> {
    pub fn try_from_tool<T>() -> Result<Self, ValidationError>
    where
        T: JsonSchema + Tool<Context = C> + Send + Sync + for<'de> Deserialize<'de> + 'static,
    {
        Self::build::<T>(Box::new(|data: &str| {
            serde_json::from_str::<T>(data).map(|tool| Box::new(tool) as ToolTraitObject<C>)
        }))
    }
}

impl<C> ToolObject<AsyncDeserializer<C>> {
    pub fn try_from_tool<T>() -> Result<Self, ValidationError>
    where
        T: JsonSchema + AsyncTool<Context = C> + for<'de> Deserialize<'de> + 'static,
    {
        Self::build::<T>(Box::new(|data: &str| {
            serde_json::from_str::<T>(data).map(|tool| Box::new(tool) as AsyncToolTraitObject<C>)
        }))
    }
}

impl<C> From<SyncToolObject<C>> for AsyncToolObject<C>
where
    C: Send + 'static,
{
    fn from(value: SyncToolObject<C>) -> Self {
        let async_deserializer = Box::new(move |json: &str| {
            (value.deserializer)(json).map(|trait_obj| {
                Box::new(AsyncToolWrapper { tool: trait_obj }) as AsyncToolTraitObject<C>
            })
        });
        Self {
            description: value.description,
            json_schema: value.json_schema,
            name: value.name,
            deserializer: async_deserializer,
        }
    }
}

fn describe<T: JsonSchema>() -> Result<(String, String, Value), ValidationError> {
    let mut schema = schema_for!(T);
    let (name, description) = validate_tool_schema(&schema.schema)?;

    // the tool name travels separately, providers only want the argument shape
    schema.meta_schema = None;
    if let Some(metadata) = schema.schema.metadata.as_deref_mut() {
        metadata.title = None;
    }
    let json_schema = serde_json::to_value(schema).map_err(ValidationError::JsonSerialization)?;
    Ok((name, description, json_schema))
}

fn validate_tool_schema(schema: &SchemaObject) -> Result<(String, String), ValidationError> {
    let name = schema
        .metadata
        .as_deref()
        .ok_or(ValidationError::MissingMetadata)?
        .title
        .as_deref()
        .ok_or(ValidationError::MissingMetadata)?
        .to_string();

    let description = validate_tool_description(schema)?;
    Ok((name, description))
}

// this could probably be converted to a compile-time check with a macro
fn validate_tool_description(schema: &SchemaObject) -> Result<String, ValidationError> {
    // validate description on subschema
    let description = schema
        .metadata
        .as_deref()
        .ok_or(ValidationError::MissingMetadata)?
        .description
        .as_deref()
        .ok_or(ValidationError::MissingMetadata)?;

    if let Some(object) = schema.object.as_deref() {
        for sub_schema in object.properties.values() {
            if let Schema::Object(sub_schema_object) = sub_schema {
                validate_tool_description(sub_schema_object)?;
            }
        }
    }

    Ok(description.to_string())
}
