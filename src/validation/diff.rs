//! Comparison of two descriptor revisions.
//!
//! Compare normalized specs; on raw specs an absent field and its default
//! show up as a change.

use crate::crd::{RedisFailover, RedisFailoverSpec, StorageKind};

/// Result of comparing old and new spec
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecDiff {
    /// Redis replica delta (positive = up, negative = down)
    pub redis_replica_delta: i32,
    /// Sentinel replica delta (positive = up, negative = down)
    pub sentinel_replica_delta: i32,
    /// Redis or sentinel image changed
    pub image_changed: bool,
    /// Storage backend kind changed (emptyDir <-> persistentVolumeClaim)
    pub storage_kind_changed: bool,
    /// Persistent claim template changed while staying persistent
    pub storage_claim_changed: bool,
    /// Bootstrap node added, removed or retargeted
    pub bootstrap_changed: bool,
    /// Auth reference changed
    pub auth_changed: bool,
    /// Custom config or command renames changed
    pub config_changed: bool,
    /// Label whitelist changed
    pub labels_changed: bool,
}

impl SpecDiff {
    /// Compare two revisions of a spec.
    pub fn between(old: &RedisFailoverSpec, new: &RedisFailoverSpec) -> Self {
        Self {
            redis_replica_delta: new
                .redis
                .replicas
                .unwrap_or_default()
                .saturating_sub(old.redis.replicas.unwrap_or_default()),
            sentinel_replica_delta: new
                .sentinel
                .replicas
                .unwrap_or_default()
                .saturating_sub(old.sentinel.replicas.unwrap_or_default()),
            image_changed: old.redis.image != new.redis.image
                || old.sentinel.image != new.sentinel.image,
            storage_kind_changed: storage_kind(old) != storage_kind(new),
            storage_claim_changed: old.redis.storage.persistent_volume_claim.is_some()
                && new.redis.storage.persistent_volume_claim.is_some()
                && old.redis.storage.persistent_volume_claim
                    != new.redis.storage.persistent_volume_claim,
            bootstrap_changed: old.bootstrap_node != new.bootstrap_node,
            auth_changed: old.auth != new.auth,
            config_changed: old.redis.custom_config != new.redis.custom_config
                || old.redis.custom_command_renames != new.redis.custom_command_renames
                || old.sentinel.custom_config != new.sentinel.custom_config,
            labels_changed: old.label_whitelist != new.label_whitelist,
        }
    }

    /// Check if there are any changes tracked by this diff
    pub fn has_changes(&self) -> bool {
        self.redis_replica_delta != 0
            || self.sentinel_replica_delta != 0
            || self.image_changed
            || self.storage_kind_changed
            || self.storage_claim_changed
            || self.bootstrap_changed
            || self.auth_changed
            || self.config_changed
            || self.labels_changed
    }

    /// Check if this is a scale-only operation
    pub fn is_scale_only(&self) -> bool {
        (self.redis_replica_delta != 0 || self.sentinel_replica_delta != 0)
            && !self.image_changed
            && !self.storage_kind_changed
            && !self.storage_claim_changed
            && !self.bootstrap_changed
            && !self.auth_changed
            && !self.config_changed
            && !self.labels_changed
    }

    /// Whether the reconciler has to switch between fresh and bootstrap mode
    pub fn changes_reconcile_mode(&self, old: &RedisFailoverSpec, new: &RedisFailoverSpec) -> bool {
        self.bootstrap_changed && old.bootstrapping() != new.bootstrapping()
    }

    /// Whether the change cannot be applied to existing storage in place
    pub fn changes_storage(&self) -> bool {
        self.storage_kind_changed || self.storage_claim_changed
    }
}

/// `None` for conflicting backends, which never compare equal to a valid one.
pub(crate) fn storage_kind(spec: &RedisFailoverSpec) -> Option<StorageKind> {
    spec.redis.storage.backend().map(|backend| backend.kind())
}

/// Check if generation has changed since it was last validated
pub fn generation_changed(resource: &RedisFailover) -> bool {
    let generation = resource.metadata.generation;
    let observed = resource.status.as_ref().and_then(|s| s.observed_generation);

    match (generation, observed) {
        (Some(current_gen), Some(obs)) => current_gen != obs,
        (Some(_), None) => true, // Never validated
        _ => false,
    }
}
