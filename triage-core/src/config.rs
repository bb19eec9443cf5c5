use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:9001";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.into(),
            request_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Reads `TRIAGE_API_BASE` and `TRIAGE_REQUEST_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: lookup("TRIAGE_API_BASE")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.base_url),
            request_timeout_ms: lookup("TRIAGE_REQUEST_TIMEOUT_MS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0),
        }
    }
}
