//! Client configuration: `wayfarer.toml`, `.env` and built-in defaults.

use clap::ValueEnum;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "wayfarer.toml";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_SERVER_NAME: &str = "travel";
pub const DEFAULT_SERVER_COMMAND: &str = "wayfarer-tools";
pub const DEFAULT_BOOKINGS_DIR: &str = "bookings";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_EXIT_COMMANDS: [&str; 3] = ["quit", "exit", "bye"];

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful travel booking assistant. You can help users with:
1. Getting travel recommendations based on destination, budget, and duration
2. Booking trips with traveler details and dates
3. Booking transportation linked to existing trip bookings
4. Checking the current weather at a location

Always be helpful and ask for clarification if needed.
You have access to the user's conversation history, so you can reference previous bookings and recommendations.";

static ENV_LOADER: Once = Once::new();

/// How the chat loop reaches the tool provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelPolicy {
    /// One stdio channel for the whole chat session.
    #[default]
    Session,
    /// A fresh stdio channel for every catalog fetch and tool call.
    PerCall,
    /// The travel toolset runs inside the client process.
    InProcess,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// How to launch one MCP tool server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: vec![],
            env: HashMap::new(),
            workdir: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model: String,
    pub api_base: Option<String>,
    pub system_prompt: String,
    pub exit_commands: Vec<String>,
    pub history_path: Option<PathBuf>,
    pub channel: ChannelPolicy,
    pub bookings_dir: PathBuf,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().build()
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    model: Option<String>,
    api_base: Option<String>,
    system_prompt: Option<String>,
    exit_commands: Option<Vec<String>>,
    history_path: Option<PathBuf>,
    channel: Option<ChannelPolicy>,
    bookings_dir: Option<PathBuf>,
    server: Option<RawServer>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServer {
    name: Option<String>,
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
}

impl RawConfig {
    fn build(self) -> AppConfig {
        let bookings_dir = self
            .bookings_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BOOKINGS_DIR));

        let server = match self.server {
            Some(raw) => ServerConfig {
                name: raw.name.unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
                command: raw.command.unwrap_or_else(default_server_command),
                args: raw.args,
                env: raw.env,
                workdir: raw.workdir,
                request_timeout: Duration::from_secs(
                    raw.request_timeout_secs
                        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                ),
            },
            None => ServerConfig::new(DEFAULT_SERVER_NAME, default_server_command()).with_args([
                "--bookings-dir".to_string(),
                bookings_dir.display().to_string(),
            ]),
        };

        AppConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: self.api_base,
            system_prompt: self
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            exit_commands: self.exit_commands.unwrap_or_else(|| {
                DEFAULT_EXIT_COMMANDS.iter().map(|s| s.to_string()).collect()
            }),
            history_path: self.history_path,
            channel: self.channel.unwrap_or_default(),
            bookings_dir,
            server,
        }
    }
}

/// Loads `.env` from the working directory or its parents, once per process.
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = dotenv();
    });
}

impl AppConfig {
    /// Load configuration. An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        ensure_env_loaded();
        match path {
            Some(path) => read_config(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    read_config(path)
                } else {
                    debug!("No configuration file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<RawConfig>(content).map(RawConfig::build)
    }

    pub fn is_exit_command(&self, input: &str) -> bool {
        self.exit_commands
            .iter()
            .any(|command| command.eq_ignore_ascii_case(input))
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading client configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    AppConfig::from_toml(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The tool server binary installed next to the running executable, if any.
fn default_server_command() -> String {
    let file_name = format!("{DEFAULT_SERVER_COMMAND}{}", std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&file_name)))
        .filter(|candidate| candidate.exists())
        .map(|candidate| candidate.display().to_string())
        .unwrap_or_else(|| DEFAULT_SERVER_COMMAND.to_string())
}
