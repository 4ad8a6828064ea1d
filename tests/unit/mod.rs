// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Unit tests for redis-failover.
//!
//! These tests run without a Kubernetes cluster and exercise the public
//! validation surface on descriptors parsed from JSON.

#[path = "../common/mod.rs"]
mod common;

use common::fixtures::RedisFailoverBuilder;
use redis_failover::crd::RedisFailoverSpec;
use serde_json::json;

fn parse(value: serde_json::Value) -> RedisFailoverSpec {
    serde_json::from_value(value).expect("spec parses")
}

mod crd_tests {
    use super::*;
    use kube::CustomResourceExt;
    use redis_failover::crd::{Condition, RedisFailover, StorageKind};

    #[test]
    fn test_crd_identity() {
        let crd = RedisFailover::crd();
        assert_eq!(crd.spec.group, "databases.spotahome.com");
        assert_eq!(crd.spec.names.kind, "RedisFailover");
        assert_eq!(crd.spec.names.plural, "redisfailovers");
        assert_eq!(
            crd.spec.names.short_names.as_deref(),
            Some(&["rf".to_string()][..])
        );
    }

    #[test]
    fn test_condition_spec_valid() {
        let condition = Condition::spec_valid(true, "Validated", "spec is valid", Some(1));
        assert_eq!(condition.r#type, "SpecValid");
        assert_eq!(condition.status, "True");
        assert_eq!(condition.observed_generation, Some(1));
    }

    #[test]
    fn test_storage_kind_display() {
        assert_eq!(StorageKind::Ephemeral.to_string(), "emptyDir");
        assert_eq!(StorageKind::PersistentClaim.to_string(), "persistentVolumeClaim");
    }

    #[test]
    fn test_legacy_bootstrap_key() {
        let spec = parse(json!({"bootstrap": {"host": "10.0.0.1"}}));
        assert!(spec.bootstrapping());
        assert!(!spec.sentinels_allowed());
    }
}

mod validation_tests {
    use super::*;
    use redis_failover::crd::{
        DEFAULT_DNS_POLICY, DEFAULT_REDIS_IMAGE, DEFAULT_SENTINEL_IMAGE, StorageBackend,
    };
    use redis_failover::{ReconcileMode, ViolationCode, validate, validate_failover};

    #[test]
    fn test_documented_minimal_example() {
        let raw = parse(json!({
            "redis": {"replicas": 3},
            "sentinel": {"replicas": 3},
            "auth": {"secretPath": "redis-auth"}
        }));

        let validated = validate(&raw).unwrap();
        assert_eq!(validated.spec().redis.image.as_deref(), Some(DEFAULT_REDIS_IMAGE));
        assert_eq!(
            validated.spec().sentinel.image.as_deref(),
            Some(DEFAULT_SENTINEL_IMAGE)
        );
        assert!(matches!(validated.storage(), StorageBackend::Ephemeral(_)));
        assert!(validated.warnings().is_empty());
    }

    #[test]
    fn test_negative_redis_replicas_rejected() {
        let rejected = validate(&parse(json!({"redis": {"replicas": -1}}))).unwrap_err();
        assert!(rejected.contains(ViolationCode::RedisReplicasNegative));
        assert_eq!(rejected.count(ViolationCode::RedisReplicasNegative), 1);
    }

    #[test]
    fn test_every_error_is_reported() {
        let raw = parse(json!({
            "redis": {
                "replicas": -2,
                "customCommandRenames": [
                    {"from": "FLUSHALL", "to": ""},
                    {"from": "flushall", "to": "nope"},
                    {"from": " ", "to": "x"}
                ],
                "storage": {"emptyDir": {}, "persistentVolumeClaim": {}}
            },
            "sentinel": {"replicas": -1},
            "labelWhitelist": ["app.kubernetes.io/name", "bad key"]
        }));

        let rejected = validate(&raw).unwrap_err();
        let codes: Vec<ViolationCode> = rejected.errors().map(|v| v.code).collect();
        assert_eq!(
            codes,
            vec![
                ViolationCode::RedisReplicasNegative,
                ViolationCode::SentinelReplicasNegative,
                ViolationCode::DuplicateCommandRenameSource,
                ViolationCode::EmptyCommandRenameSource,
                ViolationCode::ConflictingStorageBackends,
                ViolationCode::InvalidAuthReference,
                ViolationCode::InvalidLabelWhitelistKey,
            ]
        );
        assert_eq!(
            rejected.all()[2].field,
            "spec.redis.customCommandRenames[1].from"
        );
    }

    #[test]
    fn test_normalized_spec_is_fixed_point() {
        let raw = parse(json!({
            "redis": {"customConfig": ["maxmemory 100mb"], "exporter": {"enabled": true}},
            "sentinel": {"replicas": 5},
            "auth": {"secretPath": "redis-auth"},
            "labelWhitelist": ["team", "team"]
        }));

        let first = validate(&raw).unwrap();
        let second = validate(first.spec()).unwrap();

        assert_eq!(
            serde_json::to_string(first.spec()).unwrap(),
            serde_json::to_string(second.spec()).unwrap()
        );
        assert!(second.defaults().is_empty());
        assert_eq!(first.warnings(), second.warnings());
    }

    #[test]
    fn test_defaulting_is_deterministic() {
        let raw = RedisFailoverBuilder::new("cache").rename("KEYS", "").spec();
        let a = serde_json::to_vec(validate(&raw).unwrap().spec()).unwrap();
        let b = serde_json::to_vec(validate(&raw).unwrap().spec()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_defaults_fill_scheduling() {
        let validated = validate(&RedisFailoverBuilder::new("cache").spec()).unwrap();
        let redis = &validated.spec().redis.scheduling;
        assert_eq!(redis.dns_policy.as_deref(), Some(DEFAULT_DNS_POLICY));
        assert_eq!(redis.termination_grace_period_seconds, Some(30));
    }

    #[test]
    fn test_explicit_zero_redis_is_kept() {
        let validated = validate(&RedisFailoverBuilder::new("cache").redis_replicas(0).spec()).unwrap();
        assert_eq!(validated.redis_replicas(), 0);
    }

    #[test]
    fn test_conflicting_storage_reported_once() {
        let raw = RedisFailoverBuilder::new("cache")
            .empty_dir()
            .persistent("1Gi")
            .keep_after_deletion()
            .spec();
        let rejected = validate(&raw).unwrap_err();
        assert_eq!(rejected.count(ViolationCode::ConflictingStorageBackends), 1);
    }

    #[test]
    fn test_persistent_storage_kept_after_deletion() {
        let raw = RedisFailoverBuilder::new("cache")
            .persistent("10Gi")
            .keep_after_deletion()
            .spec();
        let validated = validate(&raw).unwrap();
        assert!(validated.storage().is_persistent());
        assert!(validated.keeps_data_after_deletion());
    }

    #[test]
    fn test_keep_after_deletion_on_ephemeral_warns() {
        let raw = RedisFailoverBuilder::new("cache").keep_after_deletion().spec();
        let validated = validate(&raw).unwrap();
        assert_eq!(validated.warnings().len(), 1);
        assert_eq!(
            validated.warnings()[0].code,
            ViolationCode::KeepAfterDeletionIgnored
        );
        assert!(!validated.keeps_data_after_deletion());
    }

    #[test]
    fn test_duplicate_rename_reported_once() {
        let raw = RedisFailoverBuilder::new("cache")
            .rename("FLUSHALL", "")
            .rename("FLUSHALL", "RENAMED")
            .rename("FLUSHALL", "")
            .spec();
        let rejected = validate(&raw).unwrap_err();
        assert_eq!(rejected.count(ViolationCode::DuplicateCommandRenameSource), 1);
    }

    #[test]
    fn test_zero_sentinels_need_allow_sentinels() {
        let base = RedisFailoverBuilder::new("cache").sentinel_replicas(0);

        let rejected = validate(&base.clone().spec()).unwrap_err();
        assert!(rejected.contains(ViolationCode::SentinelQuorumTooSmall));

        let with_bootstrap = base.clone().bootstrap("10.0.0.1", None, false).spec();
        assert!(validate(&with_bootstrap).is_err());

        let delegated = base.bootstrap("10.0.0.1", Some("6380"), true).spec();
        let validated = validate(&delegated).unwrap();
        assert_eq!(
            validated.mode(),
            &ReconcileMode::Bootstrap {
                host: "10.0.0.1".to_string(),
                port: 6380,
                sentinels_allowed: true,
            }
        );
    }

    #[test]
    fn test_bootstrap_endpoint_checks() {
        let missing_host = RedisFailoverBuilder::new("cache").bootstrap("", None, false).spec();
        let rejected = validate(&missing_host).unwrap_err();
        assert!(rejected.contains(ViolationCode::BootstrapMissingEndpoint));

        let bad_port = RedisFailoverBuilder::new("cache")
            .bootstrap("10.0.0.1", Some("70000"), false)
            .spec();
        let rejected = validate(&bad_port).unwrap_err();
        assert!(rejected.contains(ViolationCode::BootstrapInvalidPort));
    }

    #[test]
    fn test_disabled_auth_warns() {
        let raw = parse(json!({"auth": {"disabled": true}}));
        let validated = validate(&raw).unwrap();
        assert_eq!(validated.warnings()[0].code, ViolationCode::AuthDisabled);
    }

    #[test]
    fn test_missing_auth_rejected() {
        let raw = RedisFailoverBuilder::new("cache").auth_secret(None).spec();
        let rejected = validate(&raw).unwrap_err();
        assert!(rejected.contains(ViolationCode::InvalidAuthReference));
    }

    #[test]
    fn test_name_length_checked() {
        let resource = RedisFailoverBuilder::new("a".repeat(49)).build();
        let rejected = validate_failover(&resource).unwrap_err();
        assert!(rejected.contains(ViolationCode::NameTooLong));

        let resource = RedisFailoverBuilder::new("a".repeat(48)).build();
        assert!(validate_failover(&resource).is_ok());
    }
}

mod label_tests {
    use super::*;
    use redis_failover::validate;
    use redis_failover::validation::filter_labels;
    use std::collections::BTreeMap;

    #[test]
    fn test_whitelist_filters_resource_labels() {
        let resource = RedisFailoverBuilder::new("cache")
            .whitelist("team")
            .whitelist("team")
            .label("team", "payments")
            .label("internal", "yes")
            .build();

        let validated = validate(&resource.spec).unwrap();
        assert_eq!(validated.label_whitelist(), &["team".to_string()]);

        let labels = resource.metadata.labels.clone().unwrap_or_default();
        let propagated = filter_labels(validated.label_whitelist(), &labels);
        assert_eq!(
            propagated,
            BTreeMap::from([("team".to_string(), "payments".to_string())])
        );
    }
}

mod status_tests {
    use super::*;
    use redis_failover::crd::ConditionType;
    use redis_failover::status::{conditions_for, get_condition_reason, is_condition_true};
    use redis_failover::validate_failover;

    #[test]
    fn test_conditions_for_rejected_resource() {
        let resource = RedisFailoverBuilder::new("cache")
            .redis_replicas(-1)
            .generation(3)
            .build();
        let conditions = conditions_for(
            &validate_failover(&resource),
            resource.metadata.generation,
        );

        assert!(!is_condition_true(&conditions, ConditionType::SpecValid));
        assert_eq!(
            get_condition_reason(&conditions, ConditionType::SpecValid),
            Some("RedisReplicasNegative")
        );
        assert_eq!(conditions[0].observed_generation, Some(3));
    }
}

mod diff_tests {
    use super::*;
    use redis_failover::validate;
    use redis_failover::validation::SpecDiff;

    #[test]
    fn test_normalized_specs_compare_cleanly() {
        let old = validate(&RedisFailoverBuilder::new("cache").spec()).unwrap();
        let new = validate(&RedisFailoverBuilder::new("cache").redis_replicas(3).spec()).unwrap();

        let diff = SpecDiff::between(old.spec(), new.spec());
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_scale_and_storage_detected() {
        let old = validate(&RedisFailoverBuilder::new("cache").spec()).unwrap();
        let new = validate(
            &RedisFailoverBuilder::new("cache")
                .redis_replicas(5)
                .persistent("1Gi")
                .spec(),
        )
        .unwrap();

        let diff = SpecDiff::between(old.spec(), new.spec());
        assert_eq!(diff.redis_replica_delta, 2);
        assert!(diff.changes_storage());
        assert!(!diff.is_scale_only());
    }
}
