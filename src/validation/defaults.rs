//! Defaulting of absent fields.
//!
//! Every rule fills an absent field only, so applying the defaults to an
//! already-defaulted spec changes nothing and records nothing.

use std::collections::HashSet;

use k8s_openapi::api::core::v1::EmptyDirVolumeSource;
use tracing::debug;

use super::labels::dedup_whitelist;
use super::violation::DefaultApplied;
use crate::crd::{
    BOOTSTRAP_REDIS_CUSTOM_CONFIG, DEFAULT_DNS_POLICY, DEFAULT_IMAGE_PULL_POLICY,
    DEFAULT_REDIS_CUSTOM_CONFIG, DEFAULT_REDIS_EXPORTER_IMAGE, DEFAULT_REDIS_IMAGE,
    DEFAULT_REDIS_PORT, DEFAULT_REDIS_REPLICAS, DEFAULT_SENTINEL_CUSTOM_CONFIG,
    DEFAULT_SENTINEL_EXPORTER_IMAGE, DEFAULT_SENTINEL_IMAGE, DEFAULT_SENTINEL_REPLICAS,
    DEFAULT_TERMINATION_GRACE_PERIOD_SECONDS, Exporter, PodScheduling, RedisFailoverSpec,
};

/// Return a defaulted copy of `spec` and a record of each substitution.
pub fn apply(spec: &RedisFailoverSpec) -> (RedisFailoverSpec, Vec<DefaultApplied>) {
    let mut spec = spec.clone();
    let mut applied = Vec::new();
    let bootstrapping = spec.bootstrapping();

    let redis = &mut spec.redis;
    fill(
        &mut redis.image,
        DEFAULT_REDIS_IMAGE.to_string(),
        "spec.redis.image",
        &mut applied,
    );
    fill(
        &mut redis.image_pull_policy,
        DEFAULT_IMAGE_PULL_POLICY.to_string(),
        "spec.redis.imagePullPolicy",
        &mut applied,
    );
    fill(
        &mut redis.replicas,
        DEFAULT_REDIS_REPLICAS,
        "spec.redis.replicas",
        &mut applied,
    );
    let redis_base = if bootstrapping {
        BOOTSTRAP_REDIS_CUSTOM_CONFIG
    } else {
        DEFAULT_REDIS_CUSTOM_CONFIG
    };
    prepend_config(
        &mut redis.custom_config,
        redis_base,
        "spec.redis.customConfig",
        &mut applied,
    );
    if redis.storage.empty_dir.is_none() && redis.storage.persistent_volume_claim.is_none() {
        redis.storage.empty_dir = Some(EmptyDirVolumeSource::default());
        applied.push(DefaultApplied::new("spec.redis.storage.emptyDir", "{}"));
    }
    fill_exporter(
        &mut redis.exporter,
        DEFAULT_REDIS_EXPORTER_IMAGE,
        "spec.redis.exporter",
        &mut applied,
    );
    fill_scheduling(&mut redis.scheduling, "spec.redis", &mut applied);

    let sentinel = &mut spec.sentinel;
    fill(
        &mut sentinel.image,
        DEFAULT_SENTINEL_IMAGE.to_string(),
        "spec.sentinel.image",
        &mut applied,
    );
    fill(
        &mut sentinel.image_pull_policy,
        DEFAULT_IMAGE_PULL_POLICY.to_string(),
        "spec.sentinel.imagePullPolicy",
        &mut applied,
    );
    fill(
        &mut sentinel.replicas,
        DEFAULT_SENTINEL_REPLICAS,
        "spec.sentinel.replicas",
        &mut applied,
    );
    prepend_config(
        &mut sentinel.custom_config,
        DEFAULT_SENTINEL_CUSTOM_CONFIG,
        "spec.sentinel.customConfig",
        &mut applied,
    );
    fill_exporter(
        &mut sentinel.exporter,
        DEFAULT_SENTINEL_EXPORTER_IMAGE,
        "spec.sentinel.exporter",
        &mut applied,
    );
    fill_scheduling(&mut sentinel.scheduling, "spec.sentinel", &mut applied);

    if let Some(bootstrap) = spec.bootstrap_node.as_mut() {
        fill(
            &mut bootstrap.port,
            DEFAULT_REDIS_PORT.to_string(),
            "spec.bootstrapNode.port",
            &mut applied,
        );
    }

    let deduped = dedup_whitelist(&spec.label_whitelist);
    if deduped.len() != spec.label_whitelist.len() {
        applied.push(DefaultApplied::new(
            "spec.labelWhitelist",
            format!(
                "removed {} duplicate key(s)",
                spec.label_whitelist.len() - deduped.len()
            ),
        ));
        spec.label_whitelist = deduped;
    }

    for default in &applied {
        debug!(field = %default.field, value = %default.value, "Applied default");
    }

    (spec, applied)
}

fn fill<T: ToString>(
    slot: &mut Option<T>,
    value: T,
    field: &str,
    applied: &mut Vec<DefaultApplied>,
) {
    if slot.is_none() {
        applied.push(DefaultApplied::new(field, value.to_string()));
        *slot = Some(value);
    }
}

/// Exporter sidecars are only defaulted when enabled.
fn fill_exporter(
    exporter: &mut Exporter,
    image: &str,
    prefix: &str,
    applied: &mut Vec<DefaultApplied>,
) {
    if !exporter.enabled {
        return;
    }
    fill(
        &mut exporter.image,
        image.to_string(),
        &format!("{prefix}.image"),
        applied,
    );
    fill(
        &mut exporter.image_pull_policy,
        DEFAULT_IMAGE_PULL_POLICY.to_string(),
        &format!("{prefix}.imagePullPolicy"),
        applied,
    );
}

fn fill_scheduling(
    scheduling: &mut PodScheduling,
    prefix: &str,
    applied: &mut Vec<DefaultApplied>,
) {
    fill(
        &mut scheduling.dns_policy,
        DEFAULT_DNS_POLICY.to_string(),
        &format!("{prefix}.dnsPolicy"),
        applied,
    );
    fill(
        &mut scheduling.termination_grace_period_seconds,
        DEFAULT_TERMINATION_GRACE_PERIOD_SECONDS,
        &format!("{prefix}.terminationGracePeriod"),
        applied,
    );
}

/// Prefix `base` lines to `config`, then drop repeated lines.
///
/// User lines come after the base lines, so a user setting for the same
/// directive wins when the config file is read top to bottom.
fn prepend_config(
    config: &mut Vec<String>,
    base: &[&str],
    field: &str,
    applied: &mut Vec<DefaultApplied>,
) {
    let mut seen = HashSet::new();
    let merged: Vec<String> = base
        .iter()
        .map(|line| line.to_string())
        .chain(config.iter().cloned())
        .filter(|line| seen.insert(line.clone()))
        .collect();

    if merged != *config {
        applied.push(DefaultApplied::new(field, base.join(", ")));
        *config = merged;
    }
}
