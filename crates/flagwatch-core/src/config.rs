//! Flagwatch configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FlagwatchError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagwatchConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub agenda: AgendaConfig,
}

impl Default for FlagwatchConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            catalog: CatalogConfig::default(),
            agenda: AgendaConfig::default(),
        }
    }
}

impl FlagwatchConfig {
    /// Load config from the default path (~/.flagwatch/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FlagwatchError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| FlagwatchError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| FlagwatchError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Flagwatch home directory (~/.flagwatch).
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".flagwatch")
    }

    /// Secrets come from the environment when present (DISCORD_TOKEN,
    /// DISCORD_CHANNEL_ID) so the config file can stay token-free.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("DISCORD_TOKEN")
            && !token.is_empty()
        {
            self.discord.bot_token = token;
        }
        if let Ok(channel) = std::env::var("DISCORD_CHANNEL_ID")
            && !channel.is_empty()
        {
            self.discord.channel_id = channel;
        }
    }
}

/// Discord channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub bot_token: String,
    /// The single audience channel all commands and notices go through.
    #[serde(default)]
    pub channel_id: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_poll_interval() -> u64 {
    2
}
fn default_request_timeout() -> u64 {
    10
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: String::new(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Event catalog (CTFtime-style API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_base")]
    pub base_url: String,
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_upcoming_limit")]
    pub upcoming_limit: u32,
}

fn default_catalog_base() -> String {
    "https://ctftime.org".into()
}
fn default_catalog_timeout() -> u64 {
    5
}
fn default_user_agent() -> String {
    "Mozilla/5.0".into()
}
fn default_upcoming_limit() -> u32 {
    15
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base(),
            timeout_secs: default_catalog_timeout(),
            user_agent: default_user_agent(),
            upcoming_limit: default_upcoming_limit(),
        }
    }
}

/// Agenda engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgendaConfig {
    /// Directory holding events.json. Empty = ~/.flagwatch.
    #[serde(default)]
    pub data_dir: String,
    /// Scan interval for the milestone loop.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Fixed offset applied to every rendered timestamp, display only.
    #[serde(default = "default_display_offset")]
    pub display_offset_hours: i32,
}

fn default_tick_interval() -> u64 {
    60
}
fn default_display_offset() -> i32 {
    2
}

impl Default for AgendaConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            tick_interval_secs: default_tick_interval(),
            display_offset_hours: default_display_offset(),
        }
    }
}
