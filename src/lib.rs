//! redis-failover library crate
//!
//! This module exports the RedisFailover CRD, its validation and defaulting
//! pipeline, status conditions, and the admission webhook surface.

pub mod config;
pub mod crd;
pub mod health;
pub mod status;
pub mod validation;
pub mod webhooks;

pub use config::{ConfigError, ServerConfig};
pub use crd::{RedisFailover, RedisFailoverSpec, RedisFailoverStatus};
pub use health::HealthState;
pub use validation::{
    DefaultApplied, ReconcileMode, Severity, ValidatedSpec, Violation, ViolationCode, Violations,
    validate, validate_failover,
};
pub use webhooks::{WebhookError, run_webhook_server};
