//! Health probe logic.
//!
//! A [`Prober`] issues one GET and reports the status code; [`probe`] wraps
//! it in a per-call timeout and classifies the outcome.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;
use warmfleet_core::{ProbeError, error_chain};

/// Issues a single health request.
#[async_trait]
pub trait Prober: Send + Sync {
    /// GET `url` and return the response status code.
    async fn get(&self, url: &str) -> Result<u16, ProbeError>;
}

/// Result of a single health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The health endpoint returned 2xx.
    Healthy,
    /// The health endpoint answered with a non-2xx status.
    Unhealthy(u16),
    /// The probe could not complete (connection error or timeout).
    Failed(ProbeError),
}

impl ProbeOutcome {
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            ProbeOutcome::Healthy
        } else {
            ProbeOutcome::Unhealthy(status)
        }
    }

    /// Human-readable failure description, `None` when healthy.
    pub fn error_message(&self) -> Option<String> {
        match self {
            ProbeOutcome::Healthy => None,
            ProbeOutcome::Unhealthy(status) => Some(format!("HTTP {status}")),
            ProbeOutcome::Failed(e) => Some(e.to_string()),
        }
    }
}

/// Probe `url` with a deadline, returning the outcome and elapsed time.
///
/// On timeout the in-flight request is dropped, which cancels it.
pub async fn probe(prober: &dyn Prober, url: &str, timeout: Duration) -> (ProbeOutcome, Duration) {
    let start = Instant::now();

    let outcome = match tokio::time::timeout(timeout, prober.get(url)).await {
        Ok(Ok(status)) => {
            let outcome = ProbeOutcome::from_status(status);
            if outcome != ProbeOutcome::Healthy {
                debug!(status, %url, "health probe non-2xx");
            }
            outcome
        }
        Ok(Err(e)) => {
            debug!(error = %e, %url, "health probe request failed");
            ProbeOutcome::Failed(e)
        }
        Err(_) => {
            debug!(%url, "health probe timed out");
            ProbeOutcome::Failed(ProbeError::Timeout(timeout.as_millis() as u64))
        }
    };

    (outcome, start.elapsed())
}

/// [`Prober`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn get(&self, url: &str) -> Result<u16, ProbeError> {
        let resp = self
            .client
            .get(url)
            .header("user-agent", "warmfleet/0.1")
            .send()
            .await
            .map_err(|e| ProbeError::Transport(error_chain(&e)))?;
        Ok(resp.status().as_u16())
    }
}
