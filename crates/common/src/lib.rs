//! Shared configuration, error types, and metrics for metricq crates.
//!
//! Architecture role:
//! - defines the planner configuration passed across layers
//! - provides common [`MqError`] / [`Result`] contracts, including the
//!   [`InternalError`] taxonomy for internal-consistency failures
//! - hosts planner metrics
//!
//! Key modules:
//! - [`config`]
//! - [`error`]
//! - [`metrics`]

pub mod config;
pub mod error;
pub mod metrics;

pub use config::{InternalErrorPolicy, PlannerConfig};
pub use error::{InternalError, MqError, Result};
pub use metrics::MetricsRegistry;
