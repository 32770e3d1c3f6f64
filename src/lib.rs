//! Status-Page Proxy Library
//!
//! This library aggregates health signals for a fleet of blockchain-node services
//! from a Prometheus-compatible metric source and republishes them as a small
//! JSON API for a static status dashboard.

pub mod config;
pub mod errors;
pub mod health;
pub mod history;
pub mod incidents;
pub mod models;
pub mod prometheus;
pub mod registry;
pub mod server;

pub use config::Config;
pub use errors::{ProxyError, Result};
pub use health::{HealthCondition, evaluate};
pub use history::{DailyPoint, DayHealth, Sample, UptimeSummary, Window, normalize};
pub use incidents::{Incident, IncidentFetcher};
pub use prometheus::{MetricSource, PrometheusClient};
pub use registry::{ServiceDefinition, ServiceRegistry};
