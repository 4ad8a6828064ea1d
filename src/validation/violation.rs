//! Violation records and the error that carries them.

use serde::Serialize;
use thiserror::Error;

/// Machine-readable violation code.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
pub enum ViolationCode {
    RedisReplicasNegative,
    SentinelReplicasNegative,
    SentinelQuorumTooSmall,
    DuplicateCommandRenameSource,
    EmptyCommandRenameSource,
    ConflictingStorageBackends,
    PersistentClaimMissingSize,
    KeepAfterDeletionIgnored,
    BootstrapMissingEndpoint,
    BootstrapInvalidPort,
    InvalidAuthReference,
    AuthDisabled,
    InvalidLabelWhitelistKey,
    NegativeTerminationGracePeriod,
    ExporterConfiguredButDisabled,
    NameTooLong,
}

impl std::fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ViolationCode::RedisReplicasNegative => "RedisReplicasNegative",
            ViolationCode::SentinelReplicasNegative => "SentinelReplicasNegative",
            ViolationCode::SentinelQuorumTooSmall => "SentinelQuorumTooSmall",
            ViolationCode::DuplicateCommandRenameSource => "DuplicateCommandRenameSource",
            ViolationCode::EmptyCommandRenameSource => "EmptyCommandRenameSource",
            ViolationCode::ConflictingStorageBackends => "ConflictingStorageBackends",
            ViolationCode::PersistentClaimMissingSize => "PersistentClaimMissingSize",
            ViolationCode::KeepAfterDeletionIgnored => "KeepAfterDeletionIgnored",
            ViolationCode::BootstrapMissingEndpoint => "BootstrapMissingEndpoint",
            ViolationCode::BootstrapInvalidPort => "BootstrapInvalidPort",
            ViolationCode::InvalidAuthReference => "InvalidAuthReference",
            ViolationCode::AuthDisabled => "AuthDisabled",
            ViolationCode::InvalidLabelWhitelistKey => "InvalidLabelWhitelistKey",
            ViolationCode::NegativeTerminationGracePeriod => "NegativeTerminationGracePeriod",
            ViolationCode::ExporterConfiguredButDisabled => "ExporterConfiguredButDisabled",
            ViolationCode::NameTooLong => "NameTooLong",
        };
        f.write_str(code)
    }
}

/// Whether a violation rejects the descriptor.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Severity {
    /// The descriptor is rejected.
    Error,
    /// The descriptor is accepted but degraded or discouraged.
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One `(code, field path, message)` record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub code: ViolationCode,
    pub severity: Severity,
    /// Dotted path using wire names, e.g. `spec.redis.customCommandRenames[1].from`.
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn error(code: ViolationCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn warning(
        code: ViolationCode,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.field, self.message)
    }
}

/// A default substituted for an absent field.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

impl DefaultApplied {
    pub fn new(field: impl Into<String>, value: impl ToString) -> Self {
        Self {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

/// Rejection of a descriptor: every violation found, errors and warnings.
///
/// Never empty and always holds at least one error.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{}", summarize(.0))]
pub struct Violations(pub(crate) Vec<Violation>);

impl Violations {
    /// Pass through warning-only lists; reject any list holding an error.
    pub(crate) fn check(violations: Vec<Violation>) -> Result<Vec<Violation>, Self> {
        if violations.iter().any(Violation::is_error) {
            Err(Self(violations))
        } else {
            Ok(violations)
        }
    }

    pub fn all(&self) -> &[Violation] {
        &self.0
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter().filter(|v| v.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter().filter(|v| !v.is_error())
    }

    /// First error, used as the condition / admission reason.
    pub fn first_error(&self) -> Option<&Violation> {
        self.errors().next()
    }

    pub fn contains(&self, code: ViolationCode) -> bool {
        self.0.iter().any(|v| v.code == code)
    }

    pub fn count(&self, code: ViolationCode) -> usize {
        self.0.iter().filter(|v| v.code == code).count()
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }
}

fn summarize(violations: &[Violation]) -> String {
    let errors: Vec<String> = violations
        .iter()
        .filter(|v| v.is_error())
        .map(ToString::to_string)
        .collect();
    format!(
        "{} validation error(s): {}",
        errors.len(),
        errors.join("; ")
    )
}
