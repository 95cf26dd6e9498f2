//! CLI argument definitions for the Medbook binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// How the assistant talks to users.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// A single conversation over stdin and stdout.
    Console,
    /// The JSON chat API.
    Http,
}

/// Medbook, a chat assistant that books doctor appointments.
#[derive(Parser, Debug)]
#[command(name = "medbook", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Console conversation or HTTP server.
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = Mode::Http)]
    pub mode: Mode,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// User id for the console conversation.
    #[arg(short = 'u', long = "user", default_value = "console")]
    pub user: String,

    /// Serve the API without bearer token authentication.
    #[arg(long = "no-auth")]
    pub no_auth: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MEDBOOK_CONFIG env var > ~/.medbook/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("MEDBOOK_CONFIG") {
            return PathBuf::from(p);
        }
        medbook_dir().join("config.toml")
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > MEDBOOK_PORT env var > config file value > 3030.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("MEDBOOK_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        3030
    }

    /// Resolve the log level: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the bearer token for protected routes.
    ///
    /// Priority: --no-auth (none) > MEDBOOK_API_TOKEN env var > config file
    /// value > token stored at `token_path`, generated on first run.
    pub fn resolve_api_token(
        &self,
        config_token: Option<&str>,
        token_path: &Path,
    ) -> Option<String> {
        if self.no_auth {
            return None;
        }
        if let Ok(token) = std::env::var("MEDBOOK_API_TOKEN") {
            if !token.trim().is_empty() {
                return Some(token.trim().to_string());
            }
        }
        if let Some(token) = config_token.filter(|t| !t.trim().is_empty()) {
            return Some(token.trim().to_string());
        }
        Some(medbook_api::auth::load_or_generate_token(token_path))
    }
}

/// Per-user directory holding the config file and the API token.
pub fn medbook_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".medbook");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".medbook");
    }
    PathBuf::from(".medbook")
}
