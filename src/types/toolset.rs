mod tool_object;
#[allow(clippy::module_inception)]
mod toolset;
mod types;

pub use tool_object::{AsyncToolObject, SyncToolObject, ValidationError};
pub use toolset::{AsyncToolSet, SyncToolSet, ToolSet};
pub use types::{ToolCallError, ToolSetCreationError};
