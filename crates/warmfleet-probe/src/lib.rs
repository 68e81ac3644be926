//! warmfleet-probe — warms labelled services by hitting their health endpoints.
//!
//! # Architecture
//!
//! ```text
//! Warmer::run()
//!   ├── ServiceDiscovery::list_services()   (failure aborts the run)
//!   ├── filter_warmable()                   (labels[key] == value)
//!   └── warm_all()                          (JoinSet, one task per service)
//!         └── probe() → ProbeOutcome        (own timeout per task)
//! ```
//!
//! Per-service failures, timeouts and even panicking probe tasks become
//! `WarmResult`s; only discovery can fail a run. Results come back in
//! filtered discovery order, never completion order.

pub mod checker;
pub mod warmer;

pub use checker::{HttpProber, ProbeOutcome, Prober, probe};
pub use warmer::{HEALTH_PATH, WarmTarget, Warmer, filter_warmable, warm_all};
