pub mod backend;
pub mod catalog;
pub mod client;
pub mod config;
pub mod logging;
pub mod normalize;
pub mod orchestrator;
pub mod provider;
pub mod server;
pub mod tools;
pub mod types;

pub use normalize::normalize_text;
pub use orchestrator::{Orchestrator, TurnError, TurnOutcome};
pub use types::{AsyncTool, Tool, ToolSet};
