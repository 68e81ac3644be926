//! Error types for warmfleet.

use thiserror::Error;

/// Result type alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// The upstream service listing could not be completed.
///
/// Fatal to a warm run: no partial results are produced.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to get access token: {0}")]
    Token(String),

    #[error("service listing request failed: {0}")]
    Request(String),

    #[error("Cloud Run API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid service listing response: {0}")]
    Decode(String),
}

/// A single health probe failed before producing a status code.
///
/// Never propagated out of a run; converted into a `WarmResult`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("{0}")]
    Transport(String),
}

/// Render an error and every `source()` below it, joined with `": "`.
///
/// Client errors often keep the useful part (connection refused, DNS
/// lookup failure, TLS) in the source chain rather than the top message.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string();
        if parts.last() != Some(&msg) {
            parts.push(msg);
        }
        source = cause.source();
    }
    parts.join(": ")
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
