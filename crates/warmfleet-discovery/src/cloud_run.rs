//! Cloud Run Admin API (v2, REST) service lister.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use warmfleet_core::{DiscoveryError, DiscoveryResult, ProjectScope, ServiceDescriptor, error_chain};

use crate::ServiceDiscovery;
use crate::token::TokenSource;

pub const DEFAULT_API_BASE: &str = "https://run.googleapis.com";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListServicesResponse {
    #[serde(default)]
    services: Vec<CloudRunService>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloudRunService {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    labels: HashMap<String, String>,
}

impl From<CloudRunService> for ServiceDescriptor {
    fn from(svc: CloudRunService) -> Self {
        ServiceDescriptor {
            name: svc.name,
            address: svc.uri,
            labels: svc.labels,
        }
    }
}

/// Lists Cloud Run services through the Admin REST API.
pub struct CloudRunDiscovery {
    client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    api_base: String,
}

impl CloudRunDiscovery {
    pub fn new(client: reqwest::Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_api_base(client, tokens, DEFAULT_API_BASE)
    }

    pub fn with_api_base(client: reqwest::Client, tokens: Arc<dyn TokenSource>, api_base: &str) -> Self {
        Self {
            client,
            tokens,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn services_url(&self, scope: &ProjectScope) -> String {
        format!("{}/v2/{}/services", self.api_base, scope.parent())
    }

    async fn fetch_page(
        &self,
        url: &str,
        token: &str,
        page_token: Option<&str>,
    ) -> DiscoveryResult<ListServicesResponse> {
        let mut req = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Content-Type", "application/json");
        if let Some(page_token) = page_token {
            req = req.query(&[("pageToken", page_token)]);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| DiscoveryError::Request(error_chain(&e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscoveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| DiscoveryError::Decode(error_chain(&e)))
    }
}

#[async_trait]
impl ServiceDiscovery for CloudRunDiscovery {
    async fn list_services(&self, scope: &ProjectScope) -> DiscoveryResult<Vec<ServiceDescriptor>> {
        let token = self.tokens.access_token().await?;
        let url = self.services_url(scope);

        let mut services = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0u32;

        loop {
            let page = self.fetch_page(&url, &token, page_token.as_deref()).await?;
            pages += 1;
            services.extend(page.services.into_iter().map(ServiceDescriptor::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    return Err(DiscoveryError::Decode(format!(
                        "upstream repeated page token {next:?}"
                    )));
                }
                Some(next) => {
                    debug!(page = pages, "following service listing page token");
                    page_token = Some(next);
                }
                None => break,
            }
        }

        info!(
            parent = %scope.parent(),
            services = services.len(),
            pages,
            "listed Cloud Run services"
        );
        Ok(services)
    }
}
