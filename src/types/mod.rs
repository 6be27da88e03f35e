mod descriptor;
mod message;
mod tool;
pub mod toolset;

pub use descriptor::ToolDescriptor;
pub use message::{ConversationHistory, HistoryError, Message, Role, ToolCallRequest};
pub use tool::{AsyncTool, AsyncToolWrapper, Tool};
pub use toolset::{
    AsyncToolSet, SyncToolSet, ToolCallError, ToolSet, ToolSetCreationError, ValidationError,
};
