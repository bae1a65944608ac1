//! Error types
//!
//! Only construction can fail. Gameplay operations never return errors: input
//! that does not apply is ignored.

use thiserror::Error;

/// Configuration loading/validation failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },

    #[error("config JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        ConfigError::Invalid { field, reason }
    }
}

/// Match construction failure
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("tier must be 1, 2 or 3 (got {0})")]
    InvalidTier(u8),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
