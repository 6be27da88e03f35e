use crate::types::ToolCallRequest;

use std::fmt::Display;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::io::{Stdin, Stdout};

pub const PROMPT: &str = ">>> ";

/// Line-oriented terminal: prompts, reads one line per turn, prints results.
pub struct Terminal<R, W> {
    lines: Lines<R>,
    output: W,
}

impl Terminal<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            lines: input.lines(),
            output,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Prompt and read the next line; `None` once input is exhausted.
    pub async fn read_input(&mut self) -> io::Result<Option<String>> {
        self.output.write_all(PROMPT.as_bytes()).await?;
        self.output.flush().await?;
        self.lines.next_line().await
    }

    pub async fn print_banner(&mut self, exit_command: &str) -> io::Result<()> {
        self.write_line("Travel Booking Assistant").await?;
        self.write_line(&format!(
            "Ask about recommendations, trips, transportation or the weather. Type '{exit_command}' to exit.\n"
        ))
        .await
    }

    pub async fn print_tool_calls(&mut self, calls: &[ToolCallRequest]) -> io::Result<()> {
        for call in calls {
            self.write_line(&format!("[{}({})]", call.tool_name, call.arguments))
                .await?;
        }
        Ok(())
    }

    pub async fn print_reply(&mut self, reply: &str) -> io::Result<()> {
        self.write_line(reply).await?;
        self.write_line("").await
    }

    pub async fn print_error(&mut self, err: &dyn Display) -> io::Result<()> {
        self.write_line(&format!("error: {err}")).await
    }

    pub async fn print_goodbye(&mut self) -> io::Result<()> {
        self.write_line("Goodbye! Have a great trip!").await
    }

    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }
}
