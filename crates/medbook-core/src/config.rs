use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MedbookError, Result};
use crate::types::{default_doctors, Doctor, DoctorDirectory};

/// Top-level configuration for the Medbook application.
///
/// Loaded from `~/.medbook/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedbookConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dialog: DialogConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_doctors")]
    pub doctors: Vec<Doctor>,
}

impl Default for MedbookConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            dialog: DialogConfig::default(),
            sessions: SessionConfig::default(),
            api: ApiConfig::default(),
            doctors: default_doctors(),
        }
    }
}

impl MedbookConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MedbookConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MedbookError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Build the read-only doctor directory from the `[[doctors]]` entries.
    pub fn directory(&self) -> Result<DoctorDirectory> {
        DoctorDirectory::new(self.doctors.clone())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Language code passed to the classifier.
    pub language: String,
    /// Name the bot introduces itself with.
    pub bot_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            language: "en".to_string(),
            bot_name: "Steve".to_string(),
        }
    }
}

/// Dialog engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Classifier label that starts or continues a booking.
    pub booking_intent: String,
    /// Classifier label that hands the chat over to a human.
    pub redirect_intent: String,
    /// Maximum accepted utterance length in characters.
    pub max_message_length: usize,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            booking_intent: "user.book".to_string(),
            redirect_intent: "user.redirect".to_string(),
            max_message_length: 2000,
        }
    }
}

/// Session registry retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle minutes before a session is discarded. 0 disables expiry.
    pub ttl_minutes: u32,
    /// Maximum number of live sessions; the least recently active is evicted.
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 0,
            max_sessions: 10_000,
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Bearer token required on protected routes. Generated when absent.
    pub token: Option<String>,
    /// Requests per second accepted on protected routes.
    pub rate_limit_per_sec: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            token: None,
            rate_limit_per_sec: 100,
        }
    }
}
