mod client;
mod io;

pub use client::CliClient;
pub use io::{PROMPT, Terminal};
