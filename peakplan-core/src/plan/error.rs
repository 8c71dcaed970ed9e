use std::path::PathBuf;

use thiserror::Error;

use crate::error::ConfigError;
use crate::template::Weekday;

#[derive(Debug, Error)]
pub enum PlanError {
    /// The request broke its input contract; only this request is aborted.
    #[error("invalid {field} '{value}': {reason}")]
    Validation {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("artifact rendering failed for week {week} {day}: {reason}")]
    Artifact {
        week: u32,
        day: Weekday,
        reason: String,
    },
    #[error("publish failed: {0}")]
    Publish(String),
}

impl PlanError {
    pub fn validation(
        field: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        PlanError::Validation {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlanError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;
