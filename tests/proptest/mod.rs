// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Property-based tests for redis-failover.
//!
//! Uses proptest to generate random descriptors and verify the validation
//! invariants.

use proptest::prelude::*;

use k8s_openapi::api::core::v1::{EmptyDirVolumeSource, PersistentVolumeClaim};
use redis_failover::crd::{
    AuthSettings, BootstrapSettings, RedisCommandRename, RedisFailoverSpec,
};
use redis_failover::{ViolationCode, validate};

/// Strategy for generating valid sentinel counts (3-20).
fn valid_sentinels() -> impl Strategy<Value = i32> {
    3..=20i32
}

/// Strategy for generating valid redis counts (0-50).
fn valid_redis() -> impl Strategy<Value = i32> {
    0..=50i32
}

/// Strategy for optional replica counts, including negative ones.
fn any_replicas() -> impl Strategy<Value = Option<i32>> {
    prop::option::of(-5..=10i32)
}

/// Strategy for Redis command names, mixed case.
fn command_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("FLUSHALL".to_string()),
        Just("flushdb".to_string()),
        Just("CONFIG".to_string()),
        Just("Keys".to_string()),
        "[A-Za-z]{1,10}",
    ]
}

fn any_renames() -> impl Strategy<Value = Vec<RedisCommandRename>> {
    prop::collection::vec(
        (command_name(), "[A-Za-z0-9]{0,8}").prop_map(|(from, to)| RedisCommandRename { from, to }),
        0..5,
    )
}

fn any_bootstrap() -> impl Strategy<Value = Option<BootstrapSettings>> {
    prop::option::of(
        (
            prop_oneof![Just("10.0.0.1".to_string()), Just(String::new())],
            prop::option::of(prop_oneof![
                Just("6379".to_string()),
                Just("0".to_string()),
                "[0-9]{1,6}",
            ]),
            any::<bool>(),
        )
            .prop_map(|(host, port, allow_sentinels)| BootstrapSettings {
                host,
                port,
                allow_sentinels,
            }),
    )
}

/// Strategy for arbitrary, possibly invalid, descriptors.
fn any_spec() -> impl Strategy<Value = RedisFailoverSpec> {
    (
        any_replicas(),
        any_replicas(),
        any_renames(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        prop::option::of("[a-z-]{0,12}"),
        any_bootstrap(),
        prop::collection::vec(prop_oneof![Just("team".to_string()), "[a-z]{1,6}"], 0..4),
    )
        .prop_map(
            |(
                redis,
                sentinel,
                renames,
                empty_dir,
                claim,
                keep,
                secret_path,
                bootstrap_node,
                label_whitelist,
            )| {
                let mut spec = RedisFailoverSpec {
                    auth: AuthSettings {
                        secret_path,
                        ..Default::default()
                    },
                    label_whitelist,
                    bootstrap_node,
                    ..Default::default()
                };
                spec.redis.replicas = redis;
                spec.sentinel.replicas = sentinel;
                spec.redis.custom_command_renames = renames;
                spec.redis.storage.keep_after_deletion = keep;
                if empty_dir {
                    spec.redis.storage.empty_dir = Some(EmptyDirVolumeSource::default());
                }
                if claim {
                    spec.redis.storage.persistent_volume_claim =
                        Some(PersistentVolumeClaim::default());
                }
                spec
            },
        )
}

fn authed(redis: i32, sentinel: i32) -> RedisFailoverSpec {
    let mut spec = RedisFailoverSpec {
        auth: AuthSettings {
            secret_path: Some("redis-auth".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    spec.redis.replicas = Some(redis);
    spec.sentinel.replicas = Some(sentinel);
    spec
}

proptest! {
    /// Property: sentinel >= 3 and redis >= 0 produce no violations at all.
    #[test]
    fn test_valid_counts_have_no_violations(
        redis in valid_redis(),
        sentinel in valid_sentinels()
    ) {
        let validated = validate(&authed(redis, sentinel)).unwrap();
        prop_assert!(validated.warnings().is_empty());
        prop_assert_eq!(validated.redis_replicas(), redis);
        prop_assert_eq!(validated.sentinel_replicas(), sentinel);
    }

    /// Property: Validating a normalized spec returns it unchanged, with the
    /// same warnings and no new defaults.
    #[test]
    fn test_normalization_is_idempotent(spec in any_spec()) {
        if let Ok(first) = validate(&spec) {
            let second = validate(first.spec()).unwrap();
            prop_assert_eq!(first.spec(), second.spec());
            prop_assert_eq!(first.warnings(), second.warnings());
            prop_assert!(second.defaults().is_empty());
        }
    }

    /// Property: Same raw spec always yields byte-identical output.
    #[test]
    fn test_validation_is_deterministic(spec in any_spec()) {
        let a = validate(&spec);
        let b = validate(&spec);
        match (a, b) {
            (Ok(a), Ok(b)) => prop_assert_eq!(
                serde_json::to_vec(a.spec()).unwrap(),
                serde_json::to_vec(b.spec()).unwrap()
            ),
            (Err(a), Err(b)) => prop_assert_eq!(a.all(), b.all()),
            _ => prop_assert!(false, "outcomes differ between runs"),
        }
    }

    /// Property: Both storage backends set is reported exactly once.
    #[test]
    fn test_conflicting_storage_exactly_once(spec in any_spec()) {
        let mut spec = spec;
        spec.redis.storage.empty_dir = Some(EmptyDirVolumeSource::default());
        spec.redis.storage.persistent_volume_claim = Some(PersistentVolumeClaim::default());

        let rejected = validate(&spec).unwrap_err();
        prop_assert_eq!(rejected.count(ViolationCode::ConflictingStorageBackends), 1);
    }

    /// Property: A duplicated rename source is reported once whatever the targets are.
    #[test]
    fn test_duplicate_rename_exactly_once(
        to_a in "[A-Za-z0-9]{0,8}",
        to_b in "[A-Za-z0-9]{0,8}",
        copies in 2..5usize
    ) {
        let mut spec = authed(3, 3);
        spec.redis.custom_command_renames = (0..copies)
            .map(|i| RedisCommandRename {
                from: "FLUSHALL".to_string(),
                to: if i % 2 == 0 { to_a.clone() } else { to_b.clone() },
            })
            .collect();

        let rejected = validate(&spec).unwrap_err();
        prop_assert_eq!(rejected.count(ViolationCode::DuplicateCommandRenameSource), 1);
    }

    /// Property: Zero sentinels are fatal unless the bootstrap source allows it.
    #[test]
    fn test_zero_sentinels_fatal_without_allow(redis in valid_redis(), allow in any::<bool>()) {
        let mut spec = authed(redis, 0);
        spec.bootstrap_node = Some(BootstrapSettings {
            host: "10.0.0.1".to_string(),
            port: None,
            allow_sentinels: allow,
        });

        prop_assert_eq!(validate(&spec).is_ok(), allow);
    }

    /// Property: Negative redis counts never produce a normalized spec.
    #[test]
    fn test_negative_redis_rejected(redis in -1000..0i32, sentinel in valid_sentinels()) {
        let rejected = validate(&authed(redis, sentinel)).unwrap_err();
        prop_assert!(rejected.contains(ViolationCode::RedisReplicasNegative));
    }
}
