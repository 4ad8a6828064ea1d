//! Storage immutability policy.
//!
//! Tier 2 (Update): Only enforced on UPDATE operations
//!
//! Validates:
//! - The storage backend kind cannot change after creation
//! - The persistent claim template cannot change after creation
//!
//! An old object with conflicting backends has no storage to preserve, so any
//! update that resolves the conflict is allowed.

use super::{ValidationContext, ValidationResult};
use crate::crd::StorageKind;
use crate::validation::SpecDiff;
use crate::validation::diff::storage_kind;

/// Validate immutability constraints on UPDATE operations
pub fn validate(ctx: &ValidationContext<'_>) -> ValidationResult {
    let old = match ctx.old_resource {
        Some(r) => r,
        None => return ValidationResult::allowed(), // Not an UPDATE
    };

    let new = ctx.resource;
    if storage_kind(&old.spec).is_none() {
        return ValidationResult::allowed();
    }
    let diff = SpecDiff::between(&old.spec, &new.spec);

    if diff.storage_kind_changed {
        let describe = |kind: Option<StorageKind>| {
            kind.map(|k| k.to_string())
                .unwrap_or_else(|| "conflicting".to_string())
        };
        return ValidationResult::denied(
            "ImmutableStorage",
            &format!(
                "spec.redis.storage cannot change from {} to {}. Delete and recreate the resource instead.",
                describe(storage_kind(&old.spec)),
                describe(storage_kind(&new.spec)),
            ),
        );
    }

    if diff.storage_claim_changed {
        return ValidationResult::denied(
            "ImmutableStorage",
            "spec.redis.storage.persistentVolumeClaim cannot change after creation",
        );
    }

    ValidationResult::allowed()
}
