//! Application configuration, read from an optional TOML file

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{GameConfig, MIN_SPEED_MS};
use crate::store::Backend;

/// Smallest and largest boards the UI can show
pub const GRID_SIZE_RANGE: std::ops::RangeInclusive<usize> = 4..=64;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("config file not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("validation error: {0}")]
    Validation(String),
}

/// Which leaderboard to use and how to reach it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub backend: Backend,
    /// Base URL of the PostgREST server, e.g. `http://localhost:54321`
    pub remote_url: String,
    /// Key sent as both `apikey` and bearer token
    pub remote_key: String,
    pub request_timeout_ms: u64,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Embedded,
            remote_url: String::new(),
            remote_key: String::new(),
            request_timeout_ms: 5000,
        }
    }
}

impl LeaderboardConfig {
    pub fn has_remote_credentials(&self) -> bool {
        !self.remote_url.trim().is_empty() && !self.remote_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub leaderboard: LeaderboardConfig,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from string
    pub fn load_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !GRID_SIZE_RANGE.contains(&self.game.grid_size) {
            return Err(ConfigError::Validation(format!(
                "grid_size must be between {} and {}, got {}",
                GRID_SIZE_RANGE.start(),
                GRID_SIZE_RANGE.end(),
                self.game.grid_size
            )));
        }

        if self.game.base_speed_ms < MIN_SPEED_MS {
            return Err(ConfigError::Validation(format!(
                "base_speed_ms must be at least {MIN_SPEED_MS}, got {}",
                self.game.base_speed_ms
            )));
        }

        let leaderboard = &self.leaderboard;
        if leaderboard.backend == Backend::Remote
            && !leaderboard.remote_url.is_empty()
            && !leaderboard.remote_url.starts_with("http://")
        {
            return Err(ConfigError::Validation(format!(
                "remote_url must be an http:// endpoint, got '{}'",
                leaderboard.remote_url
            )));
        }

        if leaderboard.request_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = AppConfig::load_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.leaderboard.backend, Backend::Embedded);
    }

    #[test]
    fn test_remote_section() {
        let config = AppConfig::load_str(
            r#"
            [game]
            grid_size = 30

            [leaderboard]
            backend = "remote"
            remote_url = "http://localhost:54321"
            remote_key = "anon-key"
            "#,
        )
        .unwrap();

        assert_eq!(config.game.grid_size, 30);
        assert_eq!(config.game.base_speed_ms, 120);
        assert_eq!(config.leaderboard.backend, Backend::Remote);
        assert!(config.leaderboard.has_remote_credentials());
        assert_eq!(config.leaderboard.request_timeout_ms, 5000);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            AppConfig::load_str("[game]\ngrid_size = 2"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            AppConfig::load_str(
                "[leaderboard]\nbackend = \"remote\"\nremote_url = \"https://x.supabase.co\""
            ),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            AppConfig::load_str("[leaderboard]\nbackend = \"cloud\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_speed_below_floor_is_rejected() {
        assert!(matches!(
            AppConfig::load_str("[game]\nbase_speed_ms = 10"),
            Err(ConfigError::Validation(_))
        ));
        assert!(AppConfig::load_str("[game]\nbase_speed_ms = 50").is_ok());
    }

    #[test]
    fn test_scoring_and_ramp_cannot_be_overridden() {
        for body in [
            "[game]\nmin_speed_ms = 0",
            "[game]\nspeed_step_ms = 40",
            "[game]\nfood_reward = 7",
        ] {
            assert!(
                matches!(AppConfig::load_str(body), Err(ConfigError::Parse(_))),
                "{body} was accepted"
            );
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::load_file("/definitely/not/here.toml"),
            Err(ConfigError::NotFound(_))
        ));
    }
}
