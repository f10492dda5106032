//! Error types for check execution

use std::time::Duration;

use thiserror::Error;

use crate::spec::CheckMode;

/// Errors that abort a run before any check executes
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Invalid check #{index} ({name}): {reason}")]
    InvalidSpec {
        index: usize,
        name: String,
        reason: String,
    },

    #[error("Fetcher does not support {0} checks")]
    UnsupportedMode(CheckMode),

    #[error("Suite parse error in {path}: {reason}")]
    SuiteParse { path: String, reason: String },

    #[error("Check not found: {0}")]
    CheckNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type RunnerResult<T> = Result<T, RunnerError>;

/// Failures while talking to the target. These never abort a run; they
/// become a failed check result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("{0} checks are not supported by this fetcher")]
    Unsupported(CheckMode),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Request(format!("timeout: {}", err))
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}
