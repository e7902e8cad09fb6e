//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Environment variable that overrides [`ServerConfig::database_url`].
pub const DATABASE_URL_ENV: &str = "NOUGHTS_DATABASE_URL";

/// What to do when the ban list cannot be consulted during admission.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BanPolicy {
    /// Treat the candidate as not banned.
    #[default]
    FailOpen,
    /// Reject the candidate.
    FailClosed,
}

/// Settings shared by every match on the server.
///
/// ```toml
/// database_url = "noughts.db"
/// turn_timeout_secs = 30
/// ban_policy = "fail_closed"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct ServerConfig {
    /// Path of the SQLite database.
    database_url: String,

    /// Seconds a player has to move in timed mode.
    turn_timeout_secs: u32,

    /// Seconds between ticks.
    tick_interval_secs: u64,

    /// Largest skill difference admitted into a match.
    max_skill_gap: i32,

    /// Longest chat message, in characters.
    chat_max_chars: usize,

    /// Default number of leaderboard rows returned.
    leaderboard_limit: usize,

    /// Admission behavior when the ban list is unreachable.
    ban_policy: BanPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "noughts.db".to_string(),
            turn_timeout_secs: 30,
            tick_interval_secs: 1,
            max_skill_gap: 20,
            chat_max_chars: 500,
            leaderboard_limit: 10,
            ban_policy: BanPolicy::FailOpen,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(database_url = %config.database_url, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if given and present, falls back to defaults
    /// otherwise, then applies the environment override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file cannot be parsed.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Applies [`DATABASE_URL_ENV`] if set.
    #[instrument(skip(self))]
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(DATABASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                debug!(database_url = %url, "Database url overridden from environment");
                self.with_database_url(url)
            }
            _ => self,
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.database_url(), "noughts.db");
        assert_eq!(*config.turn_timeout_secs(), 30);
        assert_eq!(*config.tick_interval_secs(), 1);
        assert_eq!(*config.max_skill_gap(), 20);
        assert_eq!(*config.chat_max_chars(), 500);
        assert_eq!(*config.ban_policy(), BanPolicy::FailOpen);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "turn_timeout_secs = 10\nban_policy = \"fail_closed\"").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(*config.turn_timeout_secs(), 10);
        assert_eq!(*config.ban_policy(), BanPolicy::FailClosed);
        assert_eq!(*config.leaderboard_limit(), 10);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "turn_timeout_secs = \"soon\"").unwrap();

        let err = ServerConfig::from_file(file.path()).unwrap_err();
        assert!(err.message.contains("Failed to parse config"));
    }

    #[test]
    fn test_setters_chain() {
        let config = ServerConfig::default()
            .with_max_skill_gap(5)
            .with_ban_policy(BanPolicy::FailClosed);
        assert_eq!(*config.max_skill_gap(), 5);
        assert_eq!(*config.ban_policy(), BanPolicy::FailClosed);
    }
}
