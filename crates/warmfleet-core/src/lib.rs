//! warmfleet-core — shared types for the warmfleet service.
//!
//! Holds the data model passed between discovery, the warm fan-out and the
//! HTTP layer, the [`WarmConfig`] populated once at startup, and the error
//! types each stage can raise.

pub mod config;
pub mod error;
pub mod types;

pub use config::WarmConfig;
pub use error::{ConfigError, DiscoveryError, DiscoveryResult, ProbeError, error_chain};
pub use types::*;
