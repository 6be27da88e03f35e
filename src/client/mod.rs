//! Interactive terminal chat on top of the orchestrator.

pub mod cli;

pub use cli::{CliClient, Terminal};
