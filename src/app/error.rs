use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EstuaryError {
    #[error("Timed out after {0:?} waiting for listings to render")]
    RenderTimeout(Duration),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Step '{step}' failed: {reason}")]
    StepFailure { step: &'static str, reason: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl EstuaryError {
    pub(crate) fn step(step: &'static str, reason: impl Into<String>) -> Self {
        Self::StepFailure {
            step,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EstuaryError>;
