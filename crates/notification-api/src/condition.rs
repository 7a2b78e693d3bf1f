//! # Status Conditions
//!
//! Observation records kept in the v1beta1 status. At most one condition
//! exists per `type`; writers replace by type.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type set once the Provider has been observed and accepted
pub const READY_CONDITION: &str = "Ready";

/// Ternary status of a condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, Default)]
pub enum ConditionStatus {
    /// Condition holds
    True,

    /// Condition does not hold
    False,

    /// Condition has not been determined
    #[default]
    Unknown,
}

/// One observation of the resource's state
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type tag, e.g. `Ready`
    #[serde(rename = "type")]
    #[schemars(length(min = 1, max = 316))]
    pub type_: String,

    /// Status of the condition
    pub status: ConditionStatus,

    /// Generation the condition was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last time the status changed
    pub last_transition_time: DateTime<Utc>,

    /// Machine readable CamelCase reason
    #[schemars(length(min = 1, max = 1024))]
    pub reason: String,

    /// Human readable details
    #[schemars(length(max = 32768))]
    pub message: String,
}

impl Condition {
    /// Create a condition transitioning now
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            observed_generation: None,
            last_transition_time: Utc::now(),
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// Set the observed generation and return self for chaining
    pub fn observed_generation(mut self, generation: i64) -> Self {
        self.observed_generation = Some(generation);
        self
    }

    /// Whether the condition holds
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

/// Find the condition with the given type
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Insert or replace the condition with the same type
///
/// The previous transition time is kept when the status did not change.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) {
    match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        Some(existing) => {
            if existing.status == condition.status {
                condition.last_transition_time = existing.last_transition_time;
            }
            *existing = condition;
        }
        None => conditions.push(condition),
    }
}

/// Collapse duplicate types, keeping the last record for each type in the
/// position of its first occurrence
pub fn dedup_conditions(conditions: Vec<Condition>) -> Vec<Condition> {
    let mut out: Vec<Condition> = Vec::with_capacity(conditions.len());
    for condition in conditions {
        match out.iter_mut().find(|c| c.type_ == condition.type_) {
            Some(existing) => *existing = condition,
            None => out.push(condition),
        }
    }
    out
}
