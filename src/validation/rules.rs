//! Invariant checks over a defaulted spec.
//!
//! Each check appends to the shared list and never stops early, so one
//! round-trip reports every problem.

use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::PersistentVolumeClaim;

use super::labels::is_valid_label_key;
use super::violation::{Violation, ViolationCode};
use crate::crd::{
    Exporter, MAX_NAME_LENGTH, MIN_SENTINEL_QUORUM, PodScheduling, RedisCommandRename,
    RedisFailoverSpec, RedisStorage,
};

/// Run every check on a defaulted spec except label keys, which
/// [`check_label_whitelist`] checks on the raw whitelist.
pub fn check_spec(spec: &RedisFailoverSpec) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_redis_replicas(spec, &mut violations);
    check_sentinel_replicas(spec, &mut violations);
    check_command_renames(&spec.redis.custom_command_renames, &mut violations);
    check_storage(&spec.redis.storage, &mut violations);
    check_exporter(&spec.redis.exporter, "spec.redis.exporter", &mut violations);
    check_exporter(
        &spec.sentinel.exporter,
        "spec.sentinel.exporter",
        &mut violations,
    );
    check_grace_period(&spec.redis.scheduling, "spec.redis", &mut violations);
    check_grace_period(&spec.sentinel.scheduling, "spec.sentinel", &mut violations);
    check_auth(spec, &mut violations);
    check_bootstrap(spec, &mut violations);
    violations
}

/// Check the descriptor name leaves room for generated resource names.
pub fn check_name(name: &str, violations: &mut Vec<Violation>) {
    if name.len() > MAX_NAME_LENGTH {
        violations.push(Violation::error(
            ViolationCode::NameTooLong,
            "metadata.name",
            format!(
                "name '{}' is {} characters long, maximum is {}",
                name,
                name.len(),
                MAX_NAME_LENGTH
            ),
        ));
    }
}

fn check_redis_replicas(spec: &RedisFailoverSpec, violations: &mut Vec<Violation>) {
    if let Some(replicas) = spec.redis.replicas
        && replicas < 0
    {
        violations.push(Violation::error(
            ViolationCode::RedisReplicasNegative,
            "spec.redis.replicas",
            format!("replica count {} cannot be negative", replicas),
        ));
    }
}

fn check_sentinel_replicas(spec: &RedisFailoverSpec, violations: &mut Vec<Violation>) {
    let Some(replicas) = spec.sentinel.replicas else {
        return;
    };
    let field = "spec.sentinel.replicas";

    if replicas < 0 {
        violations.push(Violation::error(
            ViolationCode::SentinelReplicasNegative,
            field,
            format!("replica count {} cannot be negative", replicas),
        ));
    } else if replicas == 0 {
        if !spec.sentinels_allowed() {
            violations.push(Violation::error(
                ViolationCode::SentinelQuorumTooSmall,
                field,
                "no sentinels means no automatic failover; set bootstrapNode.allowSentinels \
                 to delegate sentinel duties to the bootstrap source",
            ));
        }
    } else if replicas < MIN_SENTINEL_QUORUM {
        violations.push(Violation::warning(
            ViolationCode::SentinelQuorumTooSmall,
            field,
            format!(
                "{} sentinel(s) cannot form a majority after a failure, at least {} are recommended",
                replicas, MIN_SENTINEL_QUORUM
            ),
        ));
    }
}

/// Redis command names are case-insensitive, so renames are compared that way.
fn check_command_renames(renames: &[RedisCommandRename], violations: &mut Vec<Violation>) {
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();

    for (index, rename) in renames.iter().enumerate() {
        let field = format!("spec.redis.customCommandRenames[{}].from", index);
        let from = rename.from.trim();

        if from.is_empty() {
            violations.push(Violation::error(
                ViolationCode::EmptyCommandRenameSource,
                field,
                "command to rename cannot be empty",
            ));
            continue;
        }

        let key = from.to_ascii_uppercase();
        if !seen.insert(key.clone()) && reported.insert(key) {
            violations.push(Violation::error(
                ViolationCode::DuplicateCommandRenameSource,
                field,
                format!("command '{}' is renamed more than once", from),
            ));
        }
    }
}

fn check_storage(storage: &RedisStorage, violations: &mut Vec<Violation>) {
    match (&storage.empty_dir, &storage.persistent_volume_claim) {
        (Some(_), Some(_)) => violations.push(Violation::error(
            ViolationCode::ConflictingStorageBackends,
            "spec.redis.storage",
            "emptyDir and persistentVolumeClaim are mutually exclusive",
        )),
        (None, Some(claim)) => {
            if !requests_storage(claim) {
                violations.push(Violation::error(
                    ViolationCode::PersistentClaimMissingSize,
                    "spec.redis.storage.persistentVolumeClaim.spec.resources.requests.storage",
                    "persistent volume claim must request a storage size",
                ));
            }
        }
        (_, None) => {
            if storage.keep_after_deletion {
                violations.push(Violation::warning(
                    ViolationCode::KeepAfterDeletionIgnored,
                    "spec.redis.storage.keepAfterDeletion",
                    "keepAfterDeletion has no effect on ephemeral storage",
                ));
            }
        }
    }
}

fn requests_storage(claim: &PersistentVolumeClaim) -> bool {
    claim
        .spec
        .as_ref()
        .and_then(|spec| spec.resources.as_ref())
        .and_then(|resources| resources.requests.as_ref())
        .is_some_and(|requests| requests.contains_key("storage"))
}

fn check_exporter(exporter: &Exporter, field: &str, violations: &mut Vec<Violation>) {
    if !exporter.enabled && exporter.is_configured() {
        violations.push(Violation::warning(
            ViolationCode::ExporterConfiguredButDisabled,
            format!("{}.enabled", field),
            "exporter settings are ignored while the exporter is disabled",
        ));
    }
}

fn check_grace_period(scheduling: &PodScheduling, prefix: &str, violations: &mut Vec<Violation>) {
    if let Some(seconds) = scheduling.termination_grace_period_seconds
        && seconds < 0
    {
        violations.push(Violation::error(
            ViolationCode::NegativeTerminationGracePeriod,
            format!("{}.terminationGracePeriod", prefix),
            format!("termination grace period {}s cannot be negative", seconds),
        ));
    }
}

fn check_auth(spec: &RedisFailoverSpec, violations: &mut Vec<Violation>) {
    if spec.auth.disabled {
        violations.push(Violation::warning(
            ViolationCode::AuthDisabled,
            "spec.auth.disabled",
            "authentication is disabled; any client reaching the pods can issue commands",
        ));
        return;
    }

    let secret_path = spec.auth.secret_path.as_deref().map(str::trim);
    if secret_path.is_none_or(str::is_empty) {
        violations.push(Violation::error(
            ViolationCode::InvalidAuthReference,
            "spec.auth.secretPath",
            "auth.secretPath is required unless auth.disabled is set",
        ));
    }
}

fn check_bootstrap(spec: &RedisFailoverSpec, violations: &mut Vec<Violation>) {
    let Some(bootstrap) = &spec.bootstrap_node else {
        return;
    };

    if bootstrap.host.trim().is_empty() {
        violations.push(Violation::error(
            ViolationCode::BootstrapMissingEndpoint,
            "spec.bootstrapNode.host",
            "bootstrapNode must include a host",
        ));
    }

    match bootstrap.port.as_deref().map(str::trim) {
        Some("") => violations.push(Violation::error(
            ViolationCode::BootstrapMissingEndpoint,
            "spec.bootstrapNode.port",
            "bootstrapNode port cannot be empty",
        )),
        Some(port) if !is_valid_port(port) => violations.push(Violation::error(
            ViolationCode::BootstrapInvalidPort,
            "spec.bootstrapNode.port",
            format!("port '{}' is not a number between 1 and 65535", port),
        )),
        _ => {}
    }
}

fn is_valid_port(port: &str) -> bool {
    port.parse::<u16>().is_ok_and(|port| port != 0)
}

/// Check whitelist keys as the user wrote them, so indices match the document.
pub fn check_label_whitelist(whitelist: &[String], violations: &mut Vec<Violation>) {
    for (index, key) in whitelist.iter().enumerate() {
        if !is_valid_label_key(key) {
            violations.push(Violation::error(
                ViolationCode::InvalidLabelWhitelistKey,
                format!("spec.labelWhitelist[{}]", index),
                format!("'{}' is not a valid label key", key),
            ));
        }
    }
}
