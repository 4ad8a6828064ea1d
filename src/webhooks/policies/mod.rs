//! Validation policies for RedisFailover admission webhooks.
//!
//! Policies are organized into tiers:
//! - Tier 1 (Critical): Always enforced (spec validity)
//! - Tier 2 (Update): Only enforced on UPDATE operations (storage immutability)

pub mod immutability;
pub mod spec;

use crate::crd::RedisFailover;
use crate::validation::Violation;

/// Result of a validation check
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub allowed: bool,
    /// Reason for denial (if not allowed)
    pub reason: Option<String>,
    /// Detailed message (if not allowed)
    pub message: Option<String>,
    /// Warnings returned to the client, allowed or not
    pub warnings: Vec<String>,
    /// Violations found while validating
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    /// Create an allowed result
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            ..Default::default()
        }
    }

    /// Create a denied result
    pub fn denied(reason: &str, message: &str) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Attach violations, rendering warnings for the client
    pub fn with_violations(mut self, violations: Vec<Violation>) -> Self {
        self.warnings = violations
            .iter()
            .filter(|v| !v.is_error())
            .map(|v| format!("[{}] {}", v.code, v.message))
            .collect();
        self.violations = violations;
        self
    }
}

/// Context for validation
pub struct ValidationContext<'a> {
    /// The resource being validated
    pub resource: &'a RedisFailover,
    /// The old resource (for UPDATE operations)
    pub old_resource: Option<&'a RedisFailover>,
}

impl<'a> ValidationContext<'a> {
    /// Check if this is an UPDATE operation
    pub fn is_update(&self) -> bool {
        self.old_resource.is_some()
    }
}

/// Run all validation policies
pub fn validate_all(ctx: &ValidationContext<'_>) -> ValidationResult {
    // Tier 1: Critical validations (always enforced)
    let result = spec::validate(ctx);
    if !result.allowed {
        return result;
    }

    // Tier 2: Update validations (only for UPDATE operations)
    if ctx.is_update() {
        let denied = immutability::validate(ctx);
        if !denied.allowed {
            return ValidationResult {
                warnings: result.warnings,
                violations: result.violations,
                ..denied
            };
        }
    }

    result
}
