//! Provider Custom Resource Definition (v1beta3, storage version)
//!
//! Describes how the notification controller reaches one external endpoint
//! and which credentials it uses to do so.

use std::time::Duration;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ProviderType;
use crate::duration::{DEFAULT_TIMEOUT, DurationFormat, parse_duration};
use crate::error::{FieldError, FieldWarning, ValidationErrors};
use crate::kind::ApiVersion;
use crate::references::LocalObjectReference;
use crate::validation::{SpecFields, Validator};

/// ProviderSpec defines the desired state of a Provider
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "notification.toolkit.fluxcd.io",
    version = "v1beta3",
    kind = "Provider",
    namespaced,
    derive = "PartialEq",
    printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.type"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
#[schemars(extend("x-kubernetes-validations" = [{
    "rule": "self.type == 'github' || self.type == 'gitlab' || self.type == 'gitea' || self.type == 'bitbucketserver' || self.type == 'bitbucket' || self.type == 'azuredevops' || !has(self.commitStatusExpr)",
    "message": "spec.commitStatusExpr is only supported for the 'github', 'gitlab', 'gitea', 'bitbucketserver', 'bitbucket', 'azuredevops' provider types"
}]))]
pub struct ProviderSpec {
    /// Which Provider implementation to use
    #[serde(rename = "type")]
    pub type_: ProviderType,

    /// Deprecated: not used in v1beta3, kept for wire compatibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(regex(pattern = r"^([0-9]+(\.[0-9]+)?(ms|s|m|h))+$"))]
    pub interval: Option<String>,

    /// Channel to post events to (Slack channel, Matrix room, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 2048))]
    pub channel: Option<String>,

    /// Bot username used when posting events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 2048))]
    pub username: Option<String>,

    /// Endpoint address; its meaning depends on the provider type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 2048))]
    pub address: Option<String>,

    /// Timeout for sending event notifications, defaults to 15s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(regex(pattern = r"^([0-9]+(\.[0-9]+)?(ms|s|m))+$"))]
    pub timeout: Option<String>,

    /// Deprecated: use `proxySecretRef`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 2048), regex(pattern = r"^(http|https)://.*$"))]
    pub proxy: Option<String>,

    /// Secret holding the proxy address and optional credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_secret_ref: Option<LocalObjectReference>,

    /// Secret holding authentication credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalObjectReference>,

    /// Service account exchanged for cloud credentials; honored for
    /// azureeventhub, azuredevops and googlepubsub
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    /// Secret holding TLS material
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_secret_ref: Option<LocalObjectReference>,

    /// Tells the controller to ignore events for this Provider
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suspend: bool,

    /// CEL expression producing the commit status key; forge types only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_status_expr: Option<String>,
}

/// Where the proxy for outgoing requests comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxySource<'a> {
    /// `proxySecretRef`, which wins when both are set
    SecretRef(&'a LocalObjectReference),

    /// Deprecated scalar `proxy` address
    Address(&'a str),

    /// No proxy configured
    None,
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
            proxy_secret_ref: None,
            secret_ref: None,
            service_account_name: None,
            cert_secret_ref: None,
            suspend: false,
            commit_status_expr: None,
        }
    }

    /// Request timeout, 15s when unset or unparseable
    pub fn get_timeout(&self) -> Duration {
        self.timeout
            .as_deref()
            .and_then(|t| parse_duration(t, DurationFormat::Timeout).ok())
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Parsed deprecated interval, if set and valid
    pub fn get_interval(&self) -> Option<Duration> {
        self.interval
            .as_deref()
            .and_then(|i| parse_duration(i, DurationFormat::Interval).ok())
    }

    /// Proxy the consumer should use; the secret reference wins over the
    /// scalar address
    pub fn proxy_source(&self) -> ProxySource<'_> {
        match (&self.proxy_secret_ref, &self.proxy) {
            (Some(reference), _) => ProxySource::SecretRef(reference),
            (None, Some(address)) => ProxySource::Address(address),
            (None, None) => ProxySource::None,
        }
    }

    /// Whether credentials come from the service account rather than a secret
    pub fn uses_workload_identity(&self) -> bool {
        self.service_account_name.is_some() && self.type_.supports_workload_identity()
    }

    /// Check field formats and cross-field rules
    ///
    /// Returns the warnings for deprecated or ignored fields when the spec
    /// is valid, otherwise every violated constraint.
    pub fn validate(&self) -> Result<Vec<FieldWarning>, ValidationErrors> {
        self.check(false)
    }

    /// [`validate`](Self::validate) plus the rules applied when the
    /// controller resolves credentials
    pub fn validate_for_consume(&self) -> Result<Vec<FieldWarning>, ValidationErrors> {
        self.check(true)
    }

    fn check(&self, consume: bool) -> Result<Vec<FieldWarning>, ValidationErrors> {
        let mut v = Validator::default();

        v.spec_fields(
            &SpecFields {
                interval: self.interval.as_deref(),
                channel: self.channel.as_deref(),
                username: self.username.as_deref(),
                address: self.address.as_deref(),
                timeout: self.timeout.as_deref(),
                proxy: self.proxy.as_deref(),
                proxy_secret_ref: self.proxy_secret_ref.as_ref().map(|r| r.name.as_str()),
                secret_ref: self.secret_ref.as_ref().map(|r| r.name.as_str()),
                cert_secret_ref: self.cert_secret_ref.as_ref().map(|r| r.name.as_str()),
            },
            ApiVersion::V1beta3,
        );

        if self.commit_status_expr.is_some() && !self.type_.supports_commit_status() {
            v.error(commit_status_violation(self.type_.as_str()));
        }

        if consume && self.service_account_name.is_some() && self.secret_ref.is_some() {
            v.error(FieldError::CrossFieldViolation {
                field: "spec.serviceAccountName".to_string(),
                message: "cannot be combined with spec.secretRef static credentials".to_string(),
            });
        }

        if self.interval.is_some() {
            v.warn("spec.interval", "deprecated and has no effect in v1beta3");
        }
        match (&self.proxy, &self.proxy_secret_ref) {
            (Some(_), Some(_)) => v.warn("spec.proxy", "ignored because spec.proxySecretRef is set"),
            (Some(_), None) => v.warn("spec.proxy", "deprecated, use spec.proxySecretRef"),
            _ => {}
        }
        if self.service_account_name.is_some() && !self.type_.supports_workload_identity() {
            if consume {
                v.error(FieldError::CrossFieldViolation {
                    field: "spec.serviceAccountName".to_string(),
                    message: format!(
                        "only supported for the 'azureeventhub', 'azuredevops', 'googlepubsub' provider types, not '{}'",
                        self.type_
                    ),
                });
            } else {
                v.warn(
                    "spec.serviceAccountName",
                    format!("ignored for provider type '{}'", self.type_),
                );
            }
        }

        v.finish()
    }
}

/// Violation reported when `commitStatusExpr` is set on a kind that does
/// not post commit statuses
pub(crate) fn commit_status_violation(kind: &str) -> FieldError {
    FieldError::CrossFieldViolation {
        field: "spec.commitStatusExpr".to_string(),
        message: format!(
            "only supported for the 'github', 'gitlab', 'gitea', 'bitbucketserver', 'bitbucket', 'azuredevops' provider types, not '{kind}'"
        ),
    }
}

impl Provider {
    /// Request timeout, 15s when unset
    pub fn get_timeout(&self) -> Duration {
        self.spec.get_timeout()
    }

    /// Whether the consumer should skip events for this Provider
    pub fn is_suspended(&self) -> bool {
        self.spec.suspend
    }

    /// Validate the spec, see [`ProviderSpec::validate`]
    pub fn validate(&self) -> Result<Vec<FieldWarning>, ValidationErrors> {
        self.spec.validate()
    }
}
