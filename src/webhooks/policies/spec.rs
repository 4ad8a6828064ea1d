//! Spec validity policy.
//!
//! Tier 1 (Critical): Always enforced
//!
//! Runs the full validation pipeline on the incoming object. Any error
//! denies the request; warnings are passed back to the client.

use super::{ValidationContext, ValidationResult};
use crate::validation::validate_failover;

/// Validate the incoming RedisFailover
pub fn validate(ctx: &ValidationContext<'_>) -> ValidationResult {
    match validate_failover(ctx.resource) {
        Ok(validated) => ValidationResult::allowed().with_violations(validated.warnings().to_vec()),
        Err(rejected) => {
            let reason = rejected
                .first_error()
                .map(|v| v.code.to_string())
                .unwrap_or_else(|| "ValidationFailed".to_string());
            ValidationResult::denied(&reason, &rejected.to_string())
                .with_violations(rejected.into_inner())
        }
    }
}
