//! Provider Custom Resource Definition (v1beta1)
//!
//! Deprecated version kept for clients that have not migrated. Carries a
//! status subresource which v1beta3 no longer stores.

use std::time::Duration;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ProviderType;
use crate::condition::{self, Condition, READY_CONDITION};
use crate::duration::{DEFAULT_TIMEOUT, DurationFormat, parse_duration};
use crate::error::{FieldWarning, ValidationErrors};
use crate::kind::ApiVersion;
use crate::references::LocalObjectReference;
use crate::validation::{SpecFields, Validator};

/// Requeue interval assumed when a v1beta1 Provider does not set one
pub const DEFAULT_REQUEUE_AFTER: Duration = Duration::from_secs(600);

/// ProviderSpec defines the desired state of a v1beta1 Provider
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "notification.toolkit.fluxcd.io",
    version = "v1beta1",
    kind = "Provider",
    namespaced,
    status = "ProviderStatus",
    derive = "PartialEq",
    deprecated = "v1beta1 Provider is deprecated, upgrade to v1beta3",
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.conditions[?(@.type==\"Ready\")].message"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// Which Provider implementation to use
    #[serde(rename = "type")]
    pub type_: ProviderType,

    /// Interval at which to reconcile the Provider with its secret references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(regex(pattern = r"^([0-9]+(\.[0-9]+)?(ms|s|m|h))+$"))]
    pub interval: Option<String>,

    /// Channel to post events to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 2048))]
    pub channel: Option<String>,

    /// Bot username used when posting events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 2048))]
    pub username: Option<String>,

    /// HTTP/S webhook address of this Provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 2048), regex(pattern = r"^(http|https)://.*$"))]
    pub address: Option<String>,

    /// Timeout for sending event notifications, defaults to 15s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(regex(pattern = r"^([0-9]+(\.[0-9]+)?(ms|s|m))+$"))]
    pub timeout: Option<String>,

    /// HTTP/S address of the proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 2048), regex(pattern = r"^(http|https)://.*$"))]
    pub proxy: Option<String>,

    /// Secret holding authentication credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalObjectReference>,

    /// Secret holding TLS material
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_secret_ref: Option<LocalObjectReference>,

    /// Tells the controller to ignore events for this Provider
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suspend: bool,
}

/// ProviderStatus defines the observed state of a v1beta1 Provider
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    /// Token of the last reconcile request handled by the controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_handled_reconcile_at: Option<String>,

    /// Last observed generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Latest observations, at most one per type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ProviderSpec {
    /// Create a spec of the given type with every optional field unset
    pub fn new(type_: ProviderType) -> Self {
        Self {
            type_,
            interval: None,
            channel: None,
            username: None,
            address: None,
            timeout: None,
            proxy: None,
            secret_ref: None,
            cert_secret_ref: None,
            suspend: false,
        }
    }

    /// Request timeout, 15s when unset or unparseable
    pub fn get_timeout(&self) -> Duration {
        self.timeout
            .as_deref()
            .and_then(|t| parse_duration(t, DurationFormat::Timeout).ok())
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Reconcile interval, 10m when unset or unparseable
    pub fn get_requeue_after(&self) -> Duration {
        self.interval
            .as_deref()
            .and_then(|i| parse_duration(i, DurationFormat::Interval).ok())
            .unwrap_or(DEFAULT_REQUEUE_AFTER)
    }

    /// Check field formats
    ///
    /// v1beta1 requires an HTTP/S scheme on `address` for every kind.
    pub fn validate(&self) -> Result<Vec<FieldWarning>, ValidationErrors> {
        let mut v = Validator::default();
        v.spec_fields(&self.fields(), ApiVersion::V1beta1);
        v.finish()
    }

    fn fields(&self) -> SpecFields<'_> {
        SpecFields {
            interval: self.interval.as_deref(),
            channel: self.channel.as_deref(),
            username: self.username.as_deref(),
            address: self.address.as_deref(),
            timeout: self.timeout.as_deref(),
            proxy: self.proxy.as_deref(),
            proxy_secret_ref: None,
            secret_ref: self.secret_ref.as_ref().map(|r| r.name.as_str()),
            cert_secret_ref: self.cert_secret_ref.as_ref().map(|r| r.name.as_str()),
        }
    }
}

impl Provider {
    /// Request timeout, 15s when unset
    pub fn get_timeout(&self) -> Duration {
        self.spec.get_timeout()
    }

    /// Reconcile interval, 10m when unset
    pub fn get_requeue_after(&self) -> Duration {
        self.spec.get_requeue_after()
    }

    /// Whether the consumer should skip events for this Provider
    pub fn is_suspended(&self) -> bool {
        self.spec.suspend
    }

    /// Validate the spec, see [`ProviderSpec::validate`]
    pub fn validate(&self) -> Result<Vec<FieldWarning>, ValidationErrors> {
        self.spec.validate()
    }

    /// Current status conditions, empty when no status was written
    pub fn get_conditions(&self) -> &[Condition] {
        self.status
            .as_ref()
            .map(|s| s.conditions.as_slice())
            .unwrap_or_default()
    }

    /// Replace all conditions; duplicate types collapse to the last record
    pub fn set_conditions(&mut self, conditions: Vec<Condition>) {
        self.status.get_or_insert_with(ProviderStatus::default).conditions =
            condition::dedup_conditions(conditions);
    }

    /// Insert or replace a single condition by type
    pub fn set_condition(&mut self, condition: Condition) {
        condition::set_condition(self.get_status_conditions(), condition);
    }

    /// Mutable handle on the status conditions
    ///
    /// Retained for older consumers; callers must keep at most one
    /// condition per type.
    pub fn get_status_conditions(&mut self) -> &mut Vec<Condition> {
        &mut self.status.get_or_insert_with(ProviderStatus::default).conditions
    }

    /// Whether the `Ready` condition is `True`
    pub fn is_ready(&self) -> bool {
        condition::find_condition(self.get_conditions(), READY_CONDITION).is_some_and(Condition::is_true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionStatus;
    use crate::error::FieldError;

    fn provider() -> Provider {
        Provider::new("alerts", ProviderSpec::new(ProviderType::Slack))
    }

    #[test]
    fn test_defaults() {
        let p = provider();
        assert_eq!(p.get_timeout(), Duration::from_secs(15));
        assert_eq!(p.get_requeue_after(), Duration::from_secs(600));
        assert!(!p.is_suspended());
        assert!(p.get_conditions().is_empty());
        assert!(!p.is_ready());
    }

    #[test]
    fn test_requeue_after_uses_interval() {
        let mut p = provider();
        p.spec.interval = Some("1h".to_string());
        assert_eq!(p.get_requeue_after(), Duration::from_secs(3600));
    }

    #[test]
    fn test_malformed_interval_is_rejected() {
        let mut p = provider();
        p.spec.interval = Some("1d".to_string());
        let errors = p.validate().unwrap_err().into_inner();
        assert!(matches!(
            errors.as_slice(),
            [FieldError::MalformedDuration { field, value, .. }] if field == "spec.interval" && value == "1d"
        ));
        assert_eq!(p.get_requeue_after(), DEFAULT_REQUEUE_AFTER, "accessor falls back");

        p.spec.interval = Some("1h30m".to_string());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_address_must_be_http() {
        let mut p = provider();
        p.spec.address = Some("https://hooks.slack.com/services/x".to_string());
        assert!(p.validate().is_ok());

        p.spec.address = Some("nats://nats:4222".to_string());
        let errors = p.validate().unwrap_err().into_inner();
        assert!(matches!(
            errors.as_slice(),
            [FieldError::PatternMismatch { field, .. }] if field == "spec.address"
        ));
    }

    #[test]
    fn test_set_conditions_keeps_one_per_type() {
        let mut p = provider();
        p.set_conditions(vec![
            Condition::new(READY_CONDITION, ConditionStatus::False, "Progressing", ""),
            Condition::new(READY_CONDITION, ConditionStatus::True, "Succeeded", "Initialized"),
        ]);
        assert_eq!(p.get_conditions().len(), 1);
        assert!(p.is_ready());
    }

    #[test]
    fn test_set_condition_replaces_by_type() {
        let mut p = provider();
        p.set_condition(Condition::new(READY_CONDITION, ConditionStatus::Unknown, "Progressing", ""));
        p.set_condition(Condition::new(READY_CONDITION, ConditionStatus::False, "ValidationFailed", "bad"));
        assert_eq!(p.get_conditions().len(), 1);
        assert_eq!(p.get_conditions()[0].reason, "ValidationFailed");
    }

    #[test]
    fn test_status_conditions_handle_mutates_in_place() {
        let mut p = provider();
        p.get_status_conditions()
            .push(Condition::new(READY_CONDITION, ConditionStatus::True, "Succeeded", ""));
        assert!(p.is_ready());
        assert!(p.status.is_some());
    }

    #[test]
    fn test_status_wire_shape_omits_empty_fields() {
        let json = serde_json::to_value(ProviderStatus::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
