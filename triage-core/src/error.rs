use thiserror::Error;

/// Why a backend request did not produce the expected payload.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// No response was obtained (connect, TLS, timeout, body read).
    #[error("transport failure: {0}")]
    Transport(String),
    /// A response arrived with a non-2xx status.
    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Http { status: u16, detail: Option<String> },
    /// A 2xx response whose body does not match the contract.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchFailure::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
