//! RedisFailover Custom Resource Definition.
//!
//! Describes the desired topology of a Redis primary/replica set supervised
//! by a Sentinel quorum. The resource is pure intent: the reconciler reads
//! it, never writes the spec.
//!
//! Fields are `Option` wherever the defaulting rules need to tell "absent"
//! from "explicitly zero". See [`crate::validation::validate`] for the
//! normalized form.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Affinity, EmptyDirVolumeSource, EnvVar, LocalObjectReference, PersistentVolumeClaim,
    PodSecurityContext, ResourceRequirements, Toleration,
};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// RedisFailover describes one Redis HA deployment.
///
/// Example:
/// ```yaml
/// apiVersion: databases.spotahome.com/v1
/// kind: RedisFailover
/// metadata:
///   name: cache
/// spec:
///   redis:
///     replicas: 3
///     customCommandRenames:
///       - from: FLUSHALL
///         to: ""
///   sentinel:
///     replicas: 3
///   auth:
///     secretPath: redis-auth
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "databases.spotahome.com",
    version = "v1",
    kind = "RedisFailover",
    plural = "redisfailovers",
    singular = "redisfailover",
    shortname = "rf",
    status = "RedisFailoverStatus",
    namespaced,
    printcolumn = r#"{"name":"Redis", "type":"integer", "jsonPath":".spec.redis.replicas"}"#,
    printcolumn = r#"{"name":"Sentinels", "type":"integer", "jsonPath":".spec.sentinel.replicas"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RedisFailoverSpec {
    /// Redis server tier.
    #[serde(default)]
    pub redis: RedisSettings,

    /// Sentinel quorum tier.
    #[serde(default)]
    pub sentinel: SentinelSettings,

    /// Reference to the secret holding the Redis AUTH password.
    #[serde(default)]
    pub auth: AuthSettings,

    /// Label keys copied from the RedisFailover onto generated resources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_whitelist: Vec<String>,

    /// Existing Redis or Sentinel endpoint to adopt instead of starting empty.
    #[serde(
        default,
        alias = "bootstrap",
        skip_serializing_if = "Option::is_none"
    )]
    pub bootstrap_node: Option<BootstrapSettings>,
}

impl RedisFailoverSpec {
    /// Whether this revision adopts an existing endpoint.
    pub fn bootstrapping(&self) -> bool {
        self.bootstrap_node.is_some()
    }

    /// Whether sentinel responsibilities are delegated to the bootstrap source.
    pub fn sentinels_allowed(&self) -> bool {
        self.bootstrap_node
            .as_ref()
            .is_some_and(|bootstrap| bootstrap.allow_sentinels)
    }
}

/// A `rename-command` entry. An empty `to` disables the command.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedisCommandRename {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

/// Redis server tier settings.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedisSettings {
    /// Redis container image (default: redis:6.2.6-alpine).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Image pull policy (default: Always).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// Number of Redis pods (default: 3). Zero pauses the tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Extra `redis.conf` lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_config: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_command_renames: Vec<RedisCommandRename>,

    /// Container command override.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// ConfigMap holding the shutdown hook script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutdown_config_map: Option<String>,

    #[serde(default)]
    pub storage: RedisStorage,

    #[serde(default)]
    pub exporter: RedisExporter,

    #[serde(flatten)]
    pub scheduling: PodScheduling,
}

/// Sentinel tier settings. Sentinel is stateless: no storage, no renames.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SentinelSettings {
    /// Sentinel container image (default: redis:6.2.6-alpine).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Image pull policy (default: Always).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// Number of Sentinel pods (default: 3). Below 3 there is no real quorum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Extra `sentinel.conf` lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_config: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    #[serde(default)]
    pub exporter: SentinelExporter,

    #[serde(flatten)]
    pub scheduling: PodScheduling,
}

/// Pod scheduling hints shared by both tiers.
///
/// These are platform types carried through verbatim; nothing in this crate
/// looks inside them.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodScheduling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<PodSecurityContext>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<LocalObjectReference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<Toleration>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pod_annotations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub service_annotations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub host_network: bool,

    /// Pod DNS policy (default: ClusterFirst).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_policy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    /// Termination grace period in seconds (default: 30).
    #[serde(
        default,
        rename = "terminationGracePeriod",
        skip_serializing_if = "Option::is_none"
    )]
    pub termination_grace_period_seconds: Option<i64>,
}

/// Authentication settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    /// Name of the secret holding the password. Required unless `disabled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_path: Option<String>,

    /// Run without AUTH. Allowed, but reported as a warning.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

/// Existing endpoint the managed topology grows around.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapSettings {
    #[serde(default)]
    pub host: String,

    /// Port as a string, matching the upstream API (default: 6379).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,

    /// The target is a Sentinel endpoint that keeps sentinel duties.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_sentinels: bool,
}

/// Metrics exporter sidecar.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Exporter {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

impl Exporter {
    /// Whether any sidecar setting besides `enabled` was supplied.
    pub fn is_configured(&self) -> bool {
        self.image.is_some()
            || self.image_pull_policy.is_some()
            || !self.args.is_empty()
            || !self.env.is_empty()
    }
}

pub type RedisExporter = Exporter;
pub type SentinelExporter = Exporter;

/// Redis data storage as it appears on the wire.
///
/// At most one of `emptyDir` and `persistentVolumeClaim` may be set; use
/// [`RedisStorage::backend`] for the checked form.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedisStorage {
    /// Keep the persistent volume when the RedisFailover is deleted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub keep_after_deletion: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PersistentVolumeClaim>,
}

impl RedisStorage {
    /// The selected backend, or `None` when both are set.
    ///
    /// Neither set means ephemeral.
    pub fn backend(&self) -> Option<StorageBackend> {
        match (&self.empty_dir, &self.persistent_volume_claim) {
            (Some(_), Some(_)) => None,
            (None, Some(claim)) => Some(StorageBackend::PersistentClaim(Box::new(claim.clone()))),
            (Some(empty_dir), None) => Some(StorageBackend::Ephemeral(empty_dir.clone())),
            (None, None) => Some(StorageBackend::Ephemeral(EmptyDirVolumeSource::default())),
        }
    }
}

/// Checked storage backend: exactly one of the two.
#[derive(Clone, Debug, PartialEq)]
pub enum StorageBackend {
    Ephemeral(EmptyDirVolumeSource),
    PersistentClaim(Box<PersistentVolumeClaim>),
}

impl StorageBackend {
    pub fn is_persistent(&self) -> bool {
        matches!(self, StorageBackend::PersistentClaim(_))
    }

    pub fn kind(&self) -> StorageKind {
        match self {
            StorageBackend::Ephemeral(_) => StorageKind::Ephemeral,
            StorageBackend::PersistentClaim(_) => StorageKind::PersistentClaim,
        }
    }
}

/// Discriminant of [`StorageBackend`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StorageKind {
    Ephemeral,
    PersistentClaim,
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKind::Ephemeral => write!(f, "emptyDir"),
            StorageKind::PersistentClaim => write!(f, "persistentVolumeClaim"),
        }
    }
}

/// Status of a RedisFailover, written by whoever surfaces validation results.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedisFailoverStatus {
    /// The generation most recently validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Condition describes one aspect of the descriptor at a point in time.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition.
    pub r#type: String,
    /// Status of the condition ("True", "False", "Unknown").
    pub status: String,
    /// Machine-readable reason for the condition's last transition.
    pub reason: String,
    /// Human-readable message indicating details about last transition.
    pub message: String,
    /// Last time the condition transitioned from one status to another.
    pub last_transition_time: String,
    /// The generation of the resource this condition was observed for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    /// Create a new condition stamped with the current time.
    pub fn new(
        condition_type: ConditionType,
        status: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> Self {
        Self {
            r#type: condition_type.to_string(),
            status: if status {
                "True".to_string()
            } else {
                "False".to_string()
            },
            reason: reason.to_string(),
            message: message.to_string(),
            last_transition_time: jiff::Timestamp::now().to_string(),
            observed_generation: generation,
        }
    }

    /// Create a "SpecValid" condition.
    pub fn spec_valid(valid: bool, reason: &str, message: &str, generation: Option<i64>) -> Self {
        Self::new(ConditionType::SpecValid, valid, reason, message, generation)
    }

    /// Create a "ConfigurationWarning" condition.
    pub fn configuration_warning(
        warning: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> Self {
        Self::new(
            ConditionType::ConfigurationWarning,
            warning,
            reason,
            message,
            generation,
        )
    }
}

/// Types of conditions for RedisFailover.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionType {
    /// The spec passed validation and was normalized.
    SpecValid,
    /// The spec is accepted but has degraded or discouraged settings.
    ConfigurationWarning,
}

impl std::fmt::Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionType::SpecValid => write!(f, "SpecValid"),
            ConditionType::ConfigurationWarning => write!(f, "ConfigurationWarning"),
        }
    }
}

/// Built-in Redis image.
pub const DEFAULT_REDIS_IMAGE: &str = "redis:6.2.6-alpine";

/// Built-in Sentinel image.
pub const DEFAULT_SENTINEL_IMAGE: &str = "redis:6.2.6-alpine";

/// Built-in Redis exporter image.
pub const DEFAULT_REDIS_EXPORTER_IMAGE: &str = "quay.io/oliver006/redis_exporter:v1.43.0";

/// Built-in Sentinel exporter image.
pub const DEFAULT_SENTINEL_EXPORTER_IMAGE: &str = "quay.io/oliver006/redis_exporter:v1.43.0";

pub const DEFAULT_IMAGE_PULL_POLICY: &str = "Always";

pub const DEFAULT_REDIS_REPLICAS: i32 = 3;

pub const DEFAULT_SENTINEL_REPLICAS: i32 = 3;

/// Smallest sentinel set that survives one sentinel failure with a majority.
pub const MIN_SENTINEL_QUORUM: i32 = 3;

pub const DEFAULT_REDIS_PORT: u16 = 6379;

pub const DEFAULT_DNS_POLICY: &str = "ClusterFirst";

/// Must stay above the reconciler's sentinel `down-after-milliseconds`.
pub const DEFAULT_TERMINATION_GRACE_PERIOD_SECONDS: i64 = 30;

/// Longest name that leaves room for generated resource prefixes.
pub const MAX_NAME_LENGTH: usize = 48;

/// Config lines prepended to every fresh Redis tier.
pub const DEFAULT_REDIS_CUSTOM_CONFIG: &[&str] = &["replica-priority 100"];

/// Config lines prepended when adopting a bootstrap node, so managed
/// replicas never get promoted over it.
pub const BOOTSTRAP_REDIS_CUSTOM_CONFIG: &[&str] = &["replica-priority 0"];

pub const DEFAULT_SENTINEL_CUSTOM_CONFIG: &[&str] =
    &["down-after-milliseconds 5000", "failover-timeout 10000"];
