//! Access tokens for the Cloud Run Admin API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use warmfleet_core::{DiscoveryError, DiscoveryResult, error_chain};

/// Default service-account token endpoint on the GCE metadata server.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> DiscoveryResult<String>;
}

/// Fetches a token from the metadata server. Works on Cloud Run and GCE.
pub struct MetadataTokenSource {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl MetadataTokenSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_url(client, METADATA_TOKEN_URL)
    }

    /// Point at a different metadata endpoint (emulators, tests).
    pub fn with_url(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl TokenSource for MetadataTokenSource {
    async fn access_token(&self) -> DiscoveryResult<String> {
        let resp = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| DiscoveryError::Token(error_chain(&e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DiscoveryError::Token(status.as_u16().to_string()));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| DiscoveryError::Token(error_chain(&e)))?;

        debug!(url = %self.url, "access token acquired from metadata server");
        Ok(token.access_token)
    }
}

/// A fixed token, e.g. from `gcloud auth print-access-token` for local runs.
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> DiscoveryResult<String> {
        Ok(self.0.clone())
    }
}
