//! Configuration for lurk, loaded from TOML.
//!
//! # Configuration file format
//!
//! Lurk looks for `.lurk/config.toml` under the working directory (override
//! with `--config`). All sections are optional; lurk runs with sensible
//! defaults if the file is missing or empty.
//!
//! ```toml
//! # How often to poll the tracked thread, in seconds (default: 60).
//! poll_interval_secs = 60
//!
//! # Thread-snapshot API base (default: https://a.4cdn.org).
//! # api_base = "https://a.4cdn.org"
//!
//! # Media host base (default: https://i.4cdn.org).
//! # media_base = "https://i.4cdn.org"
//!
//! # Discord delivery (optional — omit section to print JSONL to stdout).
//! [discord]
//! bot_token = "..."   # Discord bot token (required when section is present)
//! ```

use serde::Deserialize;

/// Top-level lurk configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LurkConfig {
    /// How often to poll the tracked thread, in seconds (default: 60).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Thread-snapshot API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Media host base URL.
    #[serde(default = "default_media_base")]
    pub media_base: String,

    /// Discord delivery configuration (optional — omit to use stdout).
    #[serde(default)]
    pub discord: Option<DiscordConfig>,
}

/// Discord delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Discord bot token. Required when the `[discord]` section is present.
    pub bot_token: String,
}

impl Default for LurkConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            api_base: default_api_base(),
            media_base: default_media_base(),
            discord: None,
        }
    }
}

impl LurkConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns defaults (stdout delivery,
    ///   60s polling interval, public API bases).
    /// - After loading, prints warnings for configuration issues but does
    ///   not fail.
    pub fn load(path: &std::path::Path) -> color_eyre::Result<Self> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: LurkConfig = toml::from_str(&contents)?;
            eprintln!("[config] loaded config from {}", path.display());
            config
        } else {
            eprintln!(
                "[config] config file {} not found, using defaults",
                path.display()
            );
            Self::default()
        };

        config.validate();
        Ok(config)
    }

    /// Print warnings for common configuration issues.
    /// Does not return errors — the watcher should still run with partial config.
    fn validate(&self) {
        if let Some(discord) = &self.discord
            && discord.bot_token.is_empty()
        {
            eprintln!("[config] warning: discord.bot_token is empty — Discord deliveries will fail");
        }

        if self.poll_interval_secs == 0 {
            eprintln!("[config] warning: poll_interval_secs is 0, this will poll as fast as possible");
        }

        if self.api_base.ends_with('/') {
            eprintln!("[config] warning: api_base has a trailing slash, URLs may be malformed");
        }
    }
}

fn default_poll_interval() -> u64 {
    60
}

fn default_api_base() -> String {
    "https://a.4cdn.org".to_string()
}

fn default_media_base() -> String {
    "https://i.4cdn.org".to_string()
}
