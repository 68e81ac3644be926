//! Data model shared across warmfleet crates.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Addressing boundary for a discovery call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    pub project_id: String,
    pub region: String,
}

impl ProjectScope {
    pub fn new(project_id: &str, region: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            region: region.to_string(),
        }
    }

    /// Resource path of the scope: `projects/{project}/locations/{region}`.
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.region)
    }
}

/// One deployed service as reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Full resource name, e.g. `projects/p/locations/r/services/api`.
    pub name: String,
    /// Base URL of the service.
    pub address: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl ServiceDescriptor {
    /// Final path segment of the resource name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Whether `labels[key] == value`.
    pub fn has_label(&self, key: &str, value: &str) -> bool {
        self.labels.get(key).is_some_and(|v| v == value)
    }

    /// Address of the service's health endpoint.
    pub fn health_url(&self, path: &str) -> String {
        format!("{}{}", self.address.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarmStatus {
    Ok,
    Error,
}

/// Outcome of probing one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmResult {
    pub service: String,
    pub url: String,
    pub status: WarmStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WarmResult {
    pub fn ok(service: &str, url: &str, latency_ms: u64) -> Self {
        Self {
            service: service.to_string(),
            url: url.to_string(),
            status: WarmStatus::Ok,
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn error(service: &str, url: &str, latency_ms: Option<u64>, error: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            url: url.to_string(),
            status: WarmStatus::Error,
            latency_ms,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == WarmStatus::Ok
    }
}

/// Aggregate of one warm run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarmSummary {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub services: Vec<WarmResult>,
}

impl WarmSummary {
    /// Build a summary stamped with the current time.
    pub fn new(services: Vec<WarmResult>) -> Self {
        Self::at(Utc::now(), services)
    }

    pub fn at(timestamp: DateTime<Utc>, services: Vec<WarmResult>) -> Self {
        let success = services.iter().filter(|r| r.is_ok()).count();
        Self {
            timestamp,
            total: services.len(),
            success,
            failed: services.len() - success,
            services,
        }
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
