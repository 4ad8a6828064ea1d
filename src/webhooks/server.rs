//! Admission webhook server.
//!
//! Provides HTTP endpoints for Kubernetes admission webhooks.
//!
//! To enable webhooks:
//! 1. Deploy cert-manager for TLS certificates
//! 2. Create a ValidatingWebhookConfiguration pointing at `/validate-redisfailover`
//! 3. Mount the TLS certificate secret at the configured certificate paths

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use axum_server::tls_rustls::RustlsConfig;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::crd::RedisFailover;
use crate::health::HealthState;
use crate::webhooks::policies::{ValidationContext, ValidationResult, validate_all};

/// Errors that can occur when running the webhook server
#[derive(Debug, Error)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(#[source] std::io::Error),
    /// Server error
    #[error("Webhook server error: {0}")]
    Server(#[source] std::io::Error),
}

/// Create a denial response with reason embedded in message.
/// kube-rs deny() only sets status.message, so we format as "[reason] message"
fn deny_with_reason(
    request: &AdmissionRequest<RedisFailover>,
    message: &str,
    reason: &str,
) -> AdmissionResponse {
    AdmissionResponse::from(request).deny(format!("[{}] {}", reason, message))
}

fn operation_label(operation: &Operation) -> &'static str {
    match operation {
        Operation::Create => "CREATE",
        Operation::Update => "UPDATE",
        Operation::Delete => "DELETE",
        Operation::Connect => "CONNECT",
    }
}

/// Decide one admission request and record its metrics.
pub fn review(request: &AdmissionRequest<RedisFailover>, health: &HealthState) -> AdmissionResponse {
    let started = Instant::now();
    let operation = operation_label(&request.operation);
    let response = decide(request, health);

    health
        .metrics
        .record_admission(operation, response.allowed, started.elapsed().as_secs_f64());
    health.touch_admission();
    response
}

fn decide(request: &AdmissionRequest<RedisFailover>, health: &HealthState) -> AdmissionResponse {
    let uid = &request.uid;
    debug!(
        uid = %uid,
        operation = ?request.operation,
        namespace = ?request.namespace,
        name = ?request.name,
        "Processing admission request"
    );

    // DELETE operations are always allowed
    if request.operation == Operation::Delete {
        info!(uid = %uid, "Admission request allowed (DELETE)");
        return AdmissionResponse::from(request);
    }

    let Some(resource) = request.object.as_ref() else {
        error!(uid = %uid, "Missing object in request");
        return deny_with_reason(request, "Missing object in request", "InvalidRequest");
    };

    let ctx = ValidationContext {
        resource,
        old_resource: request.old_object.as_ref(),
    };

    let ValidationResult {
        allowed,
        reason,
        message,
        warnings,
        violations,
    } = validate_all(&ctx);
    health.metrics.record_violations(&violations);

    let mut response = if allowed {
        info!(uid = %uid, warnings = warnings.len(), "Admission request allowed");
        AdmissionResponse::from(request)
    } else {
        let reason = reason.unwrap_or_else(|| "ValidationFailed".to_string());
        let message = message.unwrap_or_else(|| "Validation failed".to_string());
        warn!(uid = %uid, reason = %reason, message = %message, "Admission request denied");
        deny_with_reason(request, &message, &reason)
    };

    if !warnings.is_empty() {
        response.warnings = Some(warnings);
    }
    response
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/validate-redisfailover", post(validate_redisfailover))
        .with_state(state)
}

/// Validate a RedisFailover admission webhook handler
async fn validate_redisfailover(
    State(state): State<Arc<HealthState>>,
    Json(review_body): Json<AdmissionReview<RedisFailover>>,
) -> impl IntoResponse {
    let request: AdmissionRequest<RedisFailover> = match review_body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to extract admission request");
            return (
                StatusCode::BAD_REQUEST,
                Json(
                    AdmissionResponse::invalid(format!("Invalid AdmissionReview: {}", e))
                        .into_review(),
                ),
            );
        }
    };

    (StatusCode::OK, Json(review(&request, &state).into_review()))
}

/// Run the webhook server with TLS
///
/// Serves `/validate-redisfailover` on the configured port and marks the
/// health state ready once certificates are loaded.
pub async fn run_webhook_server(
    config: &ServerConfig,
    health: Arc<HealthState>,
) -> Result<(), WebhookError> {
    let tls = RustlsConfig::from_pem_file(&config.cert_path, &config.key_path)
        .await
        .map_err(WebhookError::TlsConfig)?;

    let app = create_webhook_router(health.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));
    info!(port = config.webhook_port, "Webhook server listening with TLS");
    health.set_ready(true).await;

    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await
        .map_err(WebhookError::Server)?;

    Ok(())
}
