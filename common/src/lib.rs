/*!
common/src/lib.rs

Shared configuration types for LinkBrief.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that merges a defaults file with an override file
- Environment overrides for the secrets (`BOT_TOKEN`, `GEMINI_API_KEY`, `ALLOWED_USERS`)
- Startup validation of the required values
*/

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";
/// Environment variable holding the comma separated list of authorized user ids.
pub const ALLOWED_USERS_ENV: &str = "ALLOWED_USERS";
/// Default environment variable holding the LLM API key.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Extracted articles shorter than this many characters are never summarized.
pub const MIN_CONTENT_CHARS: usize = 100;

/// Telegram transport configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub token: String,
    /// Telegram user ids allowed to use the bot
    pub allowed_users: Vec<i64>,
}

/// LLM endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the generative language API (without the model path)
    pub api_url: String,
    pub api_key: Option<String>,
    /// Name of the environment variable the API key is read from
    pub api_key_env: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: None,
            api_key_env: Some(DEFAULT_API_KEY_ENV.to_string()),
            model: "gemini-1.5-flash-latest".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl LlmConfig {
    /// API key, or an empty string when none is configured.
    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }
}

/// Article fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// Extracted articles shorter than this (in characters) are rejected, at least `MIN_CONTENT_CHARS`
    pub min_content_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "LinkBrief/0.1.0".to_string(),
            min_content_chars: MIN_CONTENT_CHARS,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// Missing files are skipped, so an empty configuration is valid input for `apply_env`.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to resolve environment variables.
    /// Empty values are ignored so a blank `.env` entry never clears a file setting.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(BOT_TOKEN_ENV) {
            self.telegram.token = token.trim().to_string();
        }

        if let Some(users) = get(ALLOWED_USERS_ENV) {
            self.telegram.allowed_users = parse_user_list(&users)?;
        }

        let key_env = self
            .llm
            .api_key_env
            .clone()
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
        if let Some(key) = get(&key_env) {
            self.llm.api_key = Some(key.trim().to_string());
        }

        Ok(())
    }

    /// Check that every value required at startup is present.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.telegram.token.trim().is_empty() {
            missing.push(format!("telegram.token ({})", BOT_TOKEN_ENV));
        }
        if self.llm.api_key().trim().is_empty() {
            let env = self.llm.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
            missing.push(format!("llm.api_key ({})", env));
        }
        if self.telegram.allowed_users.is_empty() {
            missing.push(format!("telegram.allowed_users ({})", ALLOWED_USERS_ENV));
        }
        if !missing.is_empty() {
            bail!("Missing required configuration: {}", missing.join(", "));
        }

        url::Url::parse(&self.llm.api_url)
            .with_context(|| format!("Invalid llm.api_url: {}", self.llm.api_url))?;

        if self.fetch.min_content_chars < MIN_CONTENT_CHARS {
            bail!(
                "Invalid fetch.min_content_chars: {} (must be at least {})",
                self.fetch.min_content_chars,
                MIN_CONTENT_CHARS
            );
        }

        Ok(())
    }

    /// Authorized sender ids as a set.
    pub fn allowed_user_set(&self) -> HashSet<i64> {
        self.telegram.allowed_users.iter().copied().collect()
    }
}

/// Parse a comma separated list of user ids, e.g. `"123, 456"`.
pub fn parse_user_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("Invalid user id in {}: {:?}", ALLOWED_USERS_ENV, s))
        })
        .collect()
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
