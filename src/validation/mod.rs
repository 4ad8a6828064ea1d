//! Validation and defaulting of RedisFailover specs.
//!
//! [`validate`] is a pure function: it defaults absent fields on a private
//! copy, checks every invariant on the result, and returns either the
//! normalized spec or every violation found. Warnings never block; a single
//! error rejects the whole spec and no defaulted copy escapes.

pub mod defaults;
pub mod diff;
pub mod labels;
pub mod rules;
pub mod violation;

pub use diff::{SpecDiff, generation_changed};
pub use labels::filter_labels;
pub use violation::{DefaultApplied, Severity, Violation, ViolationCode, Violations};

use kube::ResourceExt;
use tracing::debug;

use crate::crd::{DEFAULT_REDIS_PORT, RedisFailover, RedisFailoverSpec, StorageBackend};

/// How the reconciler should bring this topology up.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReconcileMode {
    /// Create a fresh primary/replica set.
    Fresh,
    /// Grow the managed topology around an existing endpoint.
    Bootstrap {
        host: String,
        port: u16,
        sentinels_allowed: bool,
    },
}

/// A spec that passed validation, with every default filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedSpec {
    spec: RedisFailoverSpec,
    storage: StorageBackend,
    mode: ReconcileMode,
    warnings: Vec<Violation>,
    defaults: Vec<DefaultApplied>,
}

impl ValidatedSpec {
    /// The normalized spec. Validating it again returns it unchanged.
    pub fn spec(&self) -> &RedisFailoverSpec {
        &self.spec
    }

    pub fn into_spec(self) -> RedisFailoverSpec {
        self.spec
    }

    pub fn storage(&self) -> &StorageBackend {
        &self.storage
    }

    pub fn mode(&self) -> &ReconcileMode {
        &self.mode
    }

    /// Warning-class violations; the spec is accepted but degraded.
    pub fn warnings(&self) -> &[Violation] {
        &self.warnings
    }

    /// Defaults substituted for absent fields.
    pub fn defaults(&self) -> &[DefaultApplied] {
        &self.defaults
    }

    /// Whether persistent data survives deletion of the descriptor.
    pub fn keeps_data_after_deletion(&self) -> bool {
        self.storage.is_persistent() && self.spec.redis.storage.keep_after_deletion
    }

    /// Label keys to propagate, in order and without duplicates.
    pub fn label_whitelist(&self) -> &[String] {
        &self.spec.label_whitelist
    }

    pub fn redis_replicas(&self) -> i32 {
        self.spec.redis.replicas.unwrap_or_default()
    }

    pub fn sentinel_replicas(&self) -> i32 {
        self.spec.sentinel.replicas.unwrap_or_default()
    }
}

/// Validate and default a spec.
pub fn validate(spec: &RedisFailoverSpec) -> Result<ValidatedSpec, Violations> {
    finish(spec, Vec::new())
}

/// Validate and default a RedisFailover, including its identity.
pub fn validate_failover(resource: &RedisFailover) -> Result<ValidatedSpec, Violations> {
    let mut violations = Vec::new();
    rules::check_name(&resource.name_any(), &mut violations);
    finish(&resource.spec, violations)
}

fn finish(
    raw: &RedisFailoverSpec,
    mut violations: Vec<Violation>,
) -> Result<ValidatedSpec, Violations> {
    let (spec, defaults) = defaults::apply(raw);
    violations.extend(rules::check_spec(&spec));
    rules::check_label_whitelist(&raw.label_whitelist, &mut violations);

    let warnings = Violations::check(violations).inspect_err(|rejected| {
        debug!(
            errors = rejected.errors().count(),
            warnings = rejected.warnings().count(),
            "Spec rejected"
        );
    })?;

    // check_spec already rejects conflicting backends.
    let Some(storage) = spec.redis.storage.backend() else {
        return Err(Violations(vec![Violation::error(
            ViolationCode::ConflictingStorageBackends,
            "spec.redis.storage",
            "emptyDir and persistentVolumeClaim are mutually exclusive",
        )]));
    };

    let mode = match &spec.bootstrap_node {
        None => ReconcileMode::Fresh,
        Some(bootstrap) => ReconcileMode::Bootstrap {
            host: bootstrap.host.trim().to_string(),
            port: bootstrap
                .port
                .as_deref()
                .and_then(|port| port.trim().parse().ok())
                .unwrap_or(DEFAULT_REDIS_PORT),
            sentinels_allowed: bootstrap.allow_sentinels,
        },
    };

    Ok(ValidatedSpec {
        spec,
        storage,
        mode,
        warnings,
        defaults,
    })
}
