use wayfarer::backend::OpenAiBackend;
use wayfarer::client::CliClient;
use wayfarer::config::{self, AppConfig, ChannelPolicy};
use wayfarer::logging::{init_tracing, verbosity_level};
use wayfarer::orchestrator::Orchestrator;
use wayfarer::provider::{LocalProvider, McpSession, PerCallProvider, ToolProvider};
use wayfarer::tools::{BookingStore, ToolContext, WeatherClient, travel_toolset};

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Travel booking assistant backed by MCP tools")]
struct Cli {
    /// Path to the configuration file (defaults to ./wayfarer.toml when present)
    #[arg(short, long, env = "WAYFARER_CONFIG")]
    config: Option<PathBuf>,

    /// Chat model to use
    #[arg(short, long, env = "WAYFARER_MODEL")]
    model: Option<String>,

    /// Override the system prompt
    #[arg(long)]
    system: Option<String>,

    /// How to reach the tool server
    #[arg(long, value_enum)]
    channel: Option<ChannelPolicy>,

    /// Load the conversation from and save it to this file
    #[arg(long, env = "WAYFARER_HISTORY")]
    history: Option<PathBuf>,

    /// Directory for booking files (in-process channel)
    #[arg(long)]
    bookings_dir: Option<PathBuf>,

    /// Tool server executable
    #[arg(long)]
    server_command: Option<String>,

    /// Tool server argument, repeatable; replaces the configured arguments
    #[arg(long = "server-arg", allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(self, config: &mut AppConfig) {
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(system) = self.system {
            config.system_prompt = system;
        }
        if let Some(channel) = self.channel {
            config.channel = channel;
        }
        if let Some(history) = self.history {
            config.history_path = Some(history);
        }
        if let Some(bookings_dir) = self.bookings_dir {
            config.bookings_dir = bookings_dir;
        }
        if let Some(command) = self.server_command {
            config.server.command = command;
        }
        if !self.server_args.is_empty() {
            config.server.args = self.server_args;
        }
    }
}

async fn open_provider(config: &AppConfig) -> Result<Box<dyn ToolProvider>> {
    let provider: Box<dyn ToolProvider> = match config.channel {
        ChannelPolicy::Session => Box::new(
            McpSession::spawn(&config.server)
                .await
                .with_context(|| format!("failed to start tool server '{}'", config.server.command))?,
        ),
        ChannelPolicy::PerCall => Box::new(PerCallProvider::new(config.server.clone())),
        ChannelPolicy::InProcess => {
            let context = ToolContext::new(
                BookingStore::new(&config.bookings_dir),
                WeatherClient::default(),
            );
            Box::new(LocalProvider::new(travel_toolset()?, context))
        }
    };
    info!(channel = ?config.channel, server = %config.server.name, "Tool provider ready");
    Ok(provider)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    config::ensure_env_loaded();
    let cli = Cli::parse();
    init_tracing(verbosity_level(cli.verbose));

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    if std::env::var_os("OPENAI_API_KEY").is_none() && config.api_base.is_none() {
        bail!("OPENAI_API_KEY is not set (add it to the environment or a .env file)");
    }

    let backend = OpenAiBackend::new(config.model.clone(), config.api_base.as_deref());
    info!(model = backend.model(), "Using chat model");
    let mut client = CliClient::new(Orchestrator::new(backend), &config)?;

    let mut provider = open_provider(&config).await?;
    let chat = client.chat(provider.as_mut()).await;
    provider.close().await;
    chat?;
    Ok(())
}
