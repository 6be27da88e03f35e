use super::tool_object::{AsyncToolObject, SyncToolObject};
use super::types::*;
use crate::types::{AsyncTool, Tool, ToolDescriptor};
use schemars::JsonSchema;
use serde::de::Deserialize;
use std::collections::hash_map::HashMap;

pub type SyncToolSet<Context> = ToolSet<SyncToolObject<Context>>;
pub type AsyncToolSet<Context> = ToolSet<AsyncToolObject<Context>>;

pub struct ToolSet<T> {
    order: Vec<String>,
    tools: HashMap<String, T>,
}

impl<T> Default for ToolSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ToolSet<T> {
    pub fn new() -> Self {
        Self {
            order: vec![],
            tools: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(mut self, name: String, tool_object: T) -> Result<Self, ToolSetCreationError> {
        if self.tools.contains_key(&name) {
            Err(ToolSetCreationError::NameConflict(name))
        } else {
            self.order.push(name.clone());
            self.tools.insert(name, tool_object);
            Ok(self)
        }
    }
}

impl<C> ToolSet<SyncToolObject<C>> {
    pub fn add_tool<T>(self) -> Result<Self, ToolSetCreationError>
    where
        T: JsonSchema + Tool<Context = C> + for<'de> Deserialize<'de> + 'static + Send + Sync,
    {
        let tool_object =
            SyncToolObject::try_from_tool::<T>().map_err(ToolSetCreationError::Validation)?;
        self.insert(tool_object.name.clone(), tool_object)
    }

    pub fn try_tool_call(
        &self,
        context: C,
        tool_name: &str,
        json: &str,
    ) -> Result<String, ToolCallError> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ToolCallError::NotFound(tool_name.to_owned()))
            .and_then(|tool| {
                tool.try_deserialize(json)
                    .map_err(ToolCallError::Deserialization)
            })?;
        Ok(tool.apply(context))
    }
}

impl<C> ToolSet<SyncToolObject<C>>
where
    C: Send + 'static,
{
    pub fn into_async(self) -> AsyncToolSet<C> {
        AsyncToolSet {
            order: self.order,
            tools: self
                .tools
                .into_iter()
                .map(|(name, obj)| (name, AsyncToolObject::from(obj)))
                .collect(),
        }
    }
}

impl<C: Send + 'static> ToolSet<AsyncToolObject<C>> {
    pub fn add_tool<T>(self) -> Result<Self, ToolSetCreationError>
    where
        T: JsonSchema + AsyncTool<Context = C> + for<'de> Deserialize<'de> + 'static,
    {
        let tool_object =
            AsyncToolObject::try_from_tool::<T>().map_err(ToolSetCreationError::Validation)?;
        self.insert(tool_object.name.clone(), tool_object)
    }

    pub async fn try_tool_call(
        &self,
        context: C,
        tool_name: &str,
        json: &str,
    ) -> Result<Result<String, anyhow::Error>, ToolCallError> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ToolCallError::NotFound(tool_name.to_owned()))
            .and_then(|tool| {
                tool.try_deserialize(json)
                    .map_err(ToolCallError::Deserialization)
            })?;
        Ok(tool.apply(context).await)
    }
}

impl<T> ToolSet<T>
where
    ToolDescriptor: for<'a> From<&'a T>,
{
    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(ToolDescriptor::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[serde(rename = "shout")]
    #[schemars(description = "Upper-case the given words")]
    struct Shout {
        #[schemars(description = "words to shout")]
        words: String,
    }

    impl Tool for Shout {
        type Context = ();
        fn apply(&self, _: ()) -> String {
            self.words.to_uppercase()
        }
    }

    #[derive(Deserialize, JsonSchema)]
    #[serde(rename = "count")]
    #[schemars(description = "Count the given words")]
    struct Count {
        #[schemars(description = "words to count")]
        words: String,
    }

    impl Tool for Count {
        type Context = ();
        fn apply(&self, _: ()) -> String {
            self.words.split_whitespace().count().to_string()
        }
    }

    #[derive(Deserialize, JsonSchema)]
    #[serde(rename = "undocumented")]
    #[schemars(description = "Has a field without a description")]
    struct Undocumented {
        #[allow(dead_code)]
        value: String,
    }

    impl Tool for Undocumented {
        type Context = ();
        fn apply(&self, _: ()) -> String {
            String::new()
        }
    }

    fn toolset() -> SyncToolSet<()> {
        SyncToolSet::new()
            .add_tool::<Shout>()
            .and_then(|set| set.add_tool::<Count>())
            .expect("toolset")
    }

    #[test]
    fn descriptors_follow_registration_order() {
        let names: Vec<_> = toolset()
            .descriptors()
            .into_iter()
            .map(|descriptor| descriptor.name)
            .collect();
        assert_eq!(names, ["shout", "count"]);
    }

    #[test]
    fn descriptor_schema_describes_arguments_only() {
        let descriptor = toolset().descriptors().remove(0);
        assert_eq!(descriptor.description.as_deref(), Some("Upper-case the given words"));
        assert_eq!(descriptor.parameter_schema["type"], "object");
        assert!(descriptor.parameter_schema["properties"]["words"].is_object());
        assert!(descriptor.parameter_schema.get("title").is_none());
        assert!(descriptor.parameter_schema.get("$schema").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = toolset().add_tool::<Shout>();
        assert!(matches!(result, Err(ToolSetCreationError::NameConflict(name)) if name == "shout"));
    }

    #[test]
    fn every_property_needs_a_description() {
        let result = SyncToolSet::<()>::new().add_tool::<Undocumented>();
        assert!(matches!(result, Err(ToolSetCreationError::Validation(_))));
    }

    #[test]
    fn sync_calls_report_unknown_tools_and_bad_json() {
        let set = toolset();
        assert_eq!(
            set.try_tool_call((), "shout", r#"{"words":"hi"}"#).expect("call"),
            "HI"
        );
        assert!(matches!(
            set.try_tool_call((), "whisper", "{}"),
            Err(ToolCallError::NotFound(_))
        ));
        assert!(matches!(
            set.try_tool_call((), "count", r#"{"words":3}"#),
            Err(ToolCallError::Deserialization(_))
        ));
    }

    #[tokio::test]
    async fn async_set_keeps_order_and_runs_lifted_tools() {
        let set = toolset().into_async();
        let names: Vec<_> = set.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["shout", "count"]);

        let output = set
            .try_tool_call((), "count", r#"{"words":"one two three"}"#)
            .await
            .expect("known tool")
            .expect("tool succeeds");
        assert_eq!(output, "3");
    }
}
