use super::ToolContext;
use crate::Tool;

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Deserialize, JsonSchema, Debug)]
#[serde(rename = "greet")]
#[schemars(description = "Returns a simple greeting.")]
pub struct Greet {
    #[schemars(description = "the name of the person to greet")]
    pub name: String,
}

impl Tool for Greet {
    type Context = ToolContext;
    fn apply(&self, _: Self::Context) -> String {
        format!("Hello, {}!", self.name)
    }
}
