//! Warm fan-out — discover, filter, probe every target concurrently, join.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use warmfleet_core::*;
use warmfleet_discovery::ServiceDiscovery;

use crate::checker::{Prober, probe};

/// Path appended to a service's address to reach its health endpoint.
pub const HEALTH_PATH: &str = "/health";

/// One service to warm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmTarget {
    /// Short display name.
    pub service: String,
    /// Full health URL.
    pub url: String,
}

impl From<&ServiceDescriptor> for WarmTarget {
    fn from(svc: &ServiceDescriptor) -> Self {
        Self {
            service: svc.short_name().to_string(),
            url: svc.health_url(HEALTH_PATH),
        }
    }
}

/// Runs warm cycles against an injected discovery handle and prober.
pub struct Warmer {
    discovery: Arc<dyn ServiceDiscovery>,
    prober: Arc<dyn Prober>,
    config: WarmConfig,
}

impl Warmer {
    pub fn new(discovery: Arc<dyn ServiceDiscovery>, prober: Arc<dyn Prober>, config: WarmConfig) -> Self {
        Self {
            discovery,
            prober,
            config,
        }
    }

    pub fn config(&self) -> &WarmConfig {
        &self.config
    }

    /// Discover, filter and warm. Fails only if discovery fails.
    pub async fn warm_services(&self) -> DiscoveryResult<Vec<WarmResult>> {
        let scope = self.config.scope();
        let services = self.discovery.list_services(&scope).await?;
        let discovered = services.len();

        let warmable = filter_warmable(services, &self.config.label_key, &self.config.label_value);
        info!(
            discovered,
            warmable = warmable.len(),
            label = %format!("{}={}", self.config.label_key, self.config.label_value),
            "found services to warm"
        );

        let targets = warmable.iter().map(WarmTarget::from).collect();
        Ok(warm_all(self.prober.clone(), targets, self.config.timeout()).await)
    }

    /// One full warm cycle, aggregated into a summary.
    pub async fn run(&self) -> DiscoveryResult<WarmSummary> {
        let results = match self.warm_services().await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "service discovery failed, warm run aborted");
                return Err(e);
            }
        };

        let summary = WarmSummary::new(results);
        info!(
            total = summary.total,
            success = summary.success,
            failed = summary.failed,
            "warming complete"
        );
        Ok(summary)
    }
}

/// Keep services whose `labels[key] == value`, in discovery order.
pub fn filter_warmable(services: Vec<ServiceDescriptor>, key: &str, value: &str) -> Vec<ServiceDescriptor> {
    services
        .into_iter()
        .filter(|svc| svc.has_label(key, value))
        .collect()
}

/// Probe every target concurrently and return one result per target.
///
/// Each target runs in its own task with its own timeout. The call returns
/// once every task has settled; `result[i]` always belongs to `targets[i]`.
pub async fn warm_all(prober: Arc<dyn Prober>, targets: Vec<WarmTarget>, timeout: Duration) -> Vec<WarmResult> {
    let mut tasks = JoinSet::new();
    let mut index_by_task = HashMap::with_capacity(targets.len());

    for (index, target) in targets.iter().enumerate() {
        let prober = prober.clone();
        let target = target.clone();
        let handle = tasks.spawn(async move { warm_one(prober.as_ref(), &target, timeout).await });
        index_by_task.insert(handle.id(), index);
    }

    let mut slots: Vec<Option<WarmResult>> = vec![None; targets.len()];
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, result)) => {
                if let Some(&index) = index_by_task.get(&id) {
                    slots[index] = Some(result);
                }
            }
            Err(e) => {
                if let Some(&index) = index_by_task.get(&e.id()) {
                    let target = &targets[index];
                    error!(service = %target.service, error = %e, "probe task failed");
                    slots[index] = Some(WarmResult::error(&target.service, &target.url, None, "probe task panicked"));
                }
            }
        }
    }

    slots
        .into_iter()
        .zip(&targets)
        .map(|(slot, target)| {
            slot.unwrap_or_else(|| {
                WarmResult::error(&target.service, &target.url, None, "probe task did not complete")
            })
        })
        .collect()
}

async fn warm_one(prober: &dyn Prober, target: &WarmTarget, timeout: Duration) -> WarmResult {
    let (outcome, elapsed) = probe(prober, &target.url, timeout).await;
    let latency_ms = elapsed.as_millis() as u64;

    match outcome.error_message() {
        None => {
            debug!(service = %target.service, latency_ms, "warmed");
            WarmResult::ok(&target.service, &target.url, latency_ms)
        }
        Some(error) => {
            warn!(service = %target.service, latency_ms, %error, "failed to warm");
            WarmResult::error(&target.service, &target.url, Some(latency_ms), error)
        }
    }
}
