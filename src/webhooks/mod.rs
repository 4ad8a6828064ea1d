//! Webhook module for validating admission requests.
//!
//! This module provides a ValidatingAdmissionWebhook with tiered validation policies:
//! - Tier 1 (Critical): Always enforced (full spec validation)
//! - Tier 2 (Update): Only on UPDATE operations (storage immutability)

pub mod policies;
mod server;

pub use policies::{ValidationContext, ValidationResult};
pub use server::{WebhookError, create_webhook_router, review, run_webhook_server};

// Re-export kube-rs admission types for contract testing
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
