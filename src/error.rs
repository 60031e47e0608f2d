use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Only POST method is allowed.")]
    MethodNotAllowed,

    #[error("Text input is required.")]
    EmptyText,

    #[error("Invalid task. Use 'summarize', 'translate', or 'analyze'.")]
    InvalidTask(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Upstream returned status {status}: {body}")]
    Upstream {
        status: u16,
        body: serde_json::Value,
    },

    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    #[error("Upstream request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Rate limit exceeded. Try again later.")]
    RateLimited,

    #[error("Failed to read request body: {0}")]
    RequestBody(#[from] axum::extract::rejection::BytesRejection),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
