//! warmfleet-discovery — enumerates deployed services in a project/region.
//!
//! # Architecture
//!
//! ```text
//! ServiceDiscovery (trait)
//!   └── CloudRunDiscovery
//!         ├── TokenSource (metadata server or static token)
//!         └── GET /v2/projects/{p}/locations/{r}/services (follows pageToken)
//! ```
//!
//! The discovery handle is built once by the process and injected into the
//! warmer; nothing here is global.

pub mod cloud_run;
pub mod token;

use async_trait::async_trait;
use warmfleet_core::{DiscoveryResult, ProjectScope, ServiceDescriptor};

pub use cloud_run::CloudRunDiscovery;
pub use token::{MetadataTokenSource, StaticTokenSource, TokenSource};

/// Lists every service visible in a scope.
///
/// A failure anywhere in the listing fails the whole call; there is no
/// partial result.
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    async fn list_services(&self, scope: &ProjectScope) -> DiscoveryResult<Vec<ServiceDescriptor>>;
}
