//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve the store path, history retention limit and log level.
//! - Reject malformed values instead of silently substituting defaults.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - `history_limit` is always at least 1.

use crate::logging::{default_log_level, normalize_level};
use crate::model::history::{RetentionPolicy, DEFAULT_HISTORY_LIMIT};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "INTERACT_DB_PATH";
pub const ENV_HISTORY_LIMIT: &str = "INTERACT_HISTORY_LIMIT";
pub const ENV_LOG_LEVEL: &str = "INTERACT_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "interact_checker.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}=`{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings shared by the FFI and CLI surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub history_limit: usize,
    pub log_level: &'static str,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            history_limit: DEFAULT_HISTORY_LIMIT,
            log_level: default_log_level(),
        }
    }
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(raw) = read(ENV_HISTORY_LIMIT) {
            config.history_limit = match raw.parse::<usize>() {
                Ok(limit) if limit >= 1 => limit,
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_HISTORY_LIMIT,
                        value: raw,
                        reason: "must be at least 1".to_string(),
                    })
                }
                Err(err) => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_HISTORY_LIMIT,
                        value: raw,
                        reason: err.to_string(),
                    })
                }
            };
        }

        if let Some(raw) = read(ENV_LOG_LEVEL) {
            config.log_level =
                normalize_level(&raw).map_err(|reason| ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    value: raw.clone(),
                    reason,
                })?;
        }

        Ok(config)
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.history_limit)
    }
}
