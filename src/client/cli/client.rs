use super::io::Terminal;

use crate::backend::LmBackend;
use crate::config::AppConfig;
use crate::orchestrator::Orchestrator;
use crate::provider::ToolProvider;
use crate::types::{ConversationHistory, HistoryError};

use std::io;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info, warn};

pub struct CliClient<B> {
    orchestrator: Orchestrator<B>,
    history: ConversationHistory,
    exit_commands: Vec<String>,
    history_path: Option<PathBuf>,
}

impl<B: LmBackend> CliClient<B> {
    /// Resume the history at `config.history_path` when it exists, otherwise
    /// start from the system prompt.
    pub fn new(orchestrator: Orchestrator<B>, config: &AppConfig) -> Result<Self, HistoryError> {
        let history = match &config.history_path {
            Some(path) if path.exists() => {
                let history = ConversationHistory::load(path)?;
                info!(path = %path.display(), messages = history.len(), "Resumed conversation");
                history
            }
            _ => ConversationHistory::new(),
        };
        let history = if history.is_empty() {
            ConversationHistory::with_system_prompt(config.system_prompt.clone())
        } else {
            history
        };

        Ok(Self {
            orchestrator,
            history,
            exit_commands: config.exit_commands.clone(),
            history_path: config.history_path.clone(),
        })
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub async fn chat(&mut self, provider: &mut dyn ToolProvider) -> io::Result<()> {
        let mut terminal = Terminal::stdio();
        self.chat_with(&mut terminal, provider).await
    }

    /// Run turns until an exit command, end of input or Ctrl-C.
    pub async fn chat_with<R, W>(
        &mut self,
        terminal: &mut Terminal<R, W>,
        provider: &mut dyn ToolProvider,
    ) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let exit_command = self.exit_commands.first().map_or("quit", String::as_str);
        terminal.print_banner(exit_command).await?;

        loop {
            let input = tokio::select! {
                line = terminal.read_input() => line?,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted while waiting for input");
                    None
                }
            };
            let Some(input) = input else {
                break;
            };
            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            if self.is_exit_command(input) {
                debug!(input, "Exit command received");
                break;
            }

            let turn = tokio::select! {
                outcome = self.orchestrator.handle_turn(input, &mut self.history, &mut *provider) => Some(outcome),
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(outcome) = turn else {
                warn!("Turn interrupted, leaving the chat");
                break;
            };
            match outcome {
                Ok(outcome) => {
                    terminal.print_tool_calls(&outcome.tool_calls).await?;
                    terminal.print_reply(&outcome.reply).await?;
                }
                Err(err) => {
                    warn!(%err, "Turn failed");
                    terminal.print_error(&err).await?;
                }
            }
            self.save_history();
        }

        terminal.print_goodbye().await
    }

    fn is_exit_command(&self, input: &str) -> bool {
        self.exit_commands
            .iter()
            .any(|command| command.eq_ignore_ascii_case(input))
    }

    fn save_history(&self) {
        let Some(path) = &self.history_path else {
            return;
        };
        match self.history.save(path) {
            Ok(()) => debug!(path = %path.display(), messages = self.history.len(), "Saved conversation"),
            Err(err) => warn!(%err, "Failed to save conversation history"),
        }
    }
}
