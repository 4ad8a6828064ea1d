//! Status management utilities.
//!
//! Turns a validation outcome into status conditions. Surfacing them on
//! the resource is the caller's job; a reconciler reading them back gates
//! on [`is_condition_true`] and reports [`get_condition_reason`].

use crate::crd::{Condition, ConditionType};
use crate::validation::{ValidatedSpec, Violation, Violations};

/// Builder for managing conditions list
pub struct ConditionBuilder {
    conditions: Vec<Condition>,
}

impl ConditionBuilder {
    /// Create a new condition builder
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Start from conditions already on the resource
    pub fn from_existing(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Add or update a condition
    pub fn set(&mut self, condition: Condition) -> &mut Self {
        if let Some(existing) = self
            .conditions
            .iter_mut()
            .find(|c| c.r#type == condition.r#type)
        {
            // Keep the transition time when the status did not flip
            if existing.status == condition.status {
                let last_transition_time = existing.last_transition_time.clone();
                *existing = Condition {
                    last_transition_time,
                    ..condition
                };
            } else {
                *existing = condition;
            }
        } else {
            self.conditions.push(condition);
        }
        self
    }

    /// Drop a condition type
    pub fn remove(&mut self, condition_type: ConditionType) -> &mut Self {
        let condition_type = condition_type.to_string();
        self.conditions.retain(|c| c.r#type != condition_type);
        self
    }

    /// Build the conditions list
    pub fn build(self) -> Vec<Condition> {
        self.conditions
    }
}

impl Default for ConditionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Conditions describing a validation outcome.
///
/// `SpecValid` is always set. `ConfigurationWarning` is set when the
/// outcome carries warnings.
pub fn conditions_for(
    outcome: &Result<ValidatedSpec, Violations>,
    generation: Option<i64>,
) -> Vec<Condition> {
    let mut builder = ConditionBuilder::new();
    apply_outcome(&mut builder, outcome, generation);
    builder.build()
}

/// Update an existing condition list with a validation outcome.
pub fn apply_outcome(
    builder: &mut ConditionBuilder,
    outcome: &Result<ValidatedSpec, Violations>,
    generation: Option<i64>,
) {
    let warnings: Vec<&Violation> = match outcome {
        Ok(validated) => {
            builder.set(Condition::spec_valid(
                true,
                "Validated",
                "spec is valid",
                generation,
            ));
            validated.warnings().iter().collect()
        }
        Err(rejected) => {
            let reason = rejected
                .first_error()
                .map(|v| v.code.to_string())
                .unwrap_or_else(|| "ValidationFailed".to_string());
            builder.set(Condition::spec_valid(
                false,
                &reason,
                &join(rejected.errors()),
                generation,
            ));
            rejected.warnings().collect()
        }
    };

    match warnings.first() {
        Some(first) => {
            builder.set(Condition::configuration_warning(
                true,
                &first.code.to_string(),
                &join(warnings.iter().copied()),
                generation,
            ));
        }
        None => {
            builder.remove(ConditionType::ConfigurationWarning);
        }
    }
}

fn join<'a>(violations: impl Iterator<Item = &'a Violation>) -> String {
    violations
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check if a condition type is true, e.g. `SpecValid` before reconciling
pub fn is_condition_true(conditions: &[Condition], condition_type: ConditionType) -> bool {
    let condition_type = condition_type.to_string();
    conditions
        .iter()
        .find(|c| c.r#type == condition_type)
        .is_some_and(|c| c.status == "True")
}

/// Get the reason for a condition, i.e. the first violation code
pub fn get_condition_reason(conditions: &[Condition], condition_type: ConditionType) -> Option<&str> {
    let condition_type = condition_type.to_string();
    conditions
        .iter()
        .find(|c| c.r#type == condition_type)
        .map(|c| c.reason.as_str())
}
