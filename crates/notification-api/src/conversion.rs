//! # Version Conversion
//!
//! v1beta3 is the storage version. v1beta1 objects are upgraded on write
//! and downgraded on read:
//!
//! - upgrade passes every field through and stashes the v1beta1 status in
//!   the [`STATUS_ANNOTATION`] sidecar, since v1beta3 stores no status
//! - downgrade drops `proxySecretRef`, `serviceAccountName` and
//!   `commitStatusExpr`, restores the sidecar status and refuses kinds
//!   v1beta1 does not serve
//!
//! Round-tripping through the other version is lossless for objects that
//! only use fields both versions share.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{Error, FieldError, FieldWarning, Result};
use crate::kind::ApiVersion;
use crate::{v1beta1, v1beta3};

/// Annotation carrying the serialized v1beta1 status on stored objects
pub const STATUS_ANNOTATION: &str = "notification.toolkit.fluxcd.io/v1beta1-status";

/// How a downgrade treats fields the older version cannot hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversionPolicy {
    /// Fail with [`Error::ConversionLoss`] when any set field would be dropped
    #[default]
    Strict,

    /// Drop unrepresentable fields and report each as a warning
    AllowLossy,
}

/// Result of a conversion together with the warnings it produced
#[derive(Debug, Clone, PartialEq)]
pub struct Converted<T> {
    /// Converted object
    pub object: T,
    /// Dropped or unrecoverable data
    pub warnings: Vec<FieldWarning>,
}

impl From<v1beta1::ProviderType> for v1beta3::ProviderType {
    fn from(t: v1beta1::ProviderType) -> Self {
        use v1beta1::ProviderType as Old;
        use v1beta3::ProviderType as New;

        match t {
            Old::Generic => New::Generic,
            Old::GenericHmac => New::GenericHmac,
            Old::Slack => New::Slack,
            Old::Grafana => New::Grafana,
            Old::Discord => New::Discord,
            Old::MsTeams => New::MsTeams,
            Old::Rocket => New::Rocket,
            Old::GitHubDispatch => New::GitHubDispatch,
            Old::GitHub => New::GitHub,
            Old::GitLab => New::GitLab,
            Old::Bitbucket => New::Bitbucket,
            Old::AzureDevOps => New::AzureDevOps,
            Old::GoogleChat => New::GoogleChat,
            Old::Webex => New::Webex,
            Old::Sentry => New::Sentry,
            Old::AzureEventHub => New::AzureEventHub,
            Old::Telegram => New::Telegram,
            Old::Lark => New::Lark,
            Old::Matrix => New::Matrix,
            Old::OpsGenie => New::OpsGenie,
            Old::AlertManager => New::AlertManager,
        }
    }
}

impl TryFrom<v1beta3::ProviderType> for v1beta1::ProviderType {
    type Error = FieldError;

    fn try_from(t: v1beta3::ProviderType) -> std::result::Result<Self, Self::Error> {
        t.as_str().parse()
    }
}

impl From<v1beta1::ProviderSpec> for v1beta3::ProviderSpec {
    fn from(spec: v1beta1::ProviderSpec) -> Self {
        Self {
            type_: spec.type_.into(),
            interval: spec.interval,
            channel: spec.channel,
            username: spec.username,
            address: spec.address,
            timeout: spec.timeout,
            proxy: spec.proxy,
            proxy_secret_ref: None,
            secret_ref: spec.secret_ref,
            service_account_name: None,
            cert_secret_ref: spec.cert_secret_ref,
            suspend: spec.suspend,
            commit_status_expr: None,
        }
    }
}

/// Convert a v1beta1 Provider to the storage version
///
/// The status, if any, is serialized into [`STATUS_ANNOTATION`]. Without a
/// status any existing annotation of that name is removed.
pub fn upgrade(provider: v1beta1::Provider) -> Result<v1beta3::Provider> {
    let mut out = v1beta3::Provider::new("", provider.spec.into());
    out.metadata = provider.metadata;

    match provider.status {
        Some(status) => {
            let encoded = serde_json::to_string(&status)?;
            out.metadata
                .annotations
                .get_or_insert_with(BTreeMap::new)
                .insert(STATUS_ANNOTATION.to_string(), encoded);
        }
        // A sidecar left over from an earlier write no longer describes this object.
        None => {
            if let Some(annotations) = out.metadata.annotations.as_mut() {
                annotations.remove(STATUS_ANNOTATION);
            }
            if out.metadata.annotations.as_ref().is_some_and(BTreeMap::is_empty) {
                out.metadata.annotations = None;
            }
        }
    }

    debug!(name = ?out.metadata.name, "upgraded Provider from v1beta1 to v1beta3");
    Ok(out)
}

/// Convert a stored v1beta3 Provider to v1beta1
///
/// Kinds absent from v1beta1 always fail. Set fields that v1beta1 lacks
/// fail under [`ConversionPolicy::Strict`] and become warnings under
/// [`ConversionPolicy::AllowLossy`].
pub fn downgrade(
    provider: v1beta3::Provider,
    policy: ConversionPolicy,
) -> Result<Converted<v1beta1::Provider>> {
    let spec = provider.spec;
    let type_ = v1beta1::ProviderType::try_from(spec.type_);

    let mut lost = Vec::new();
    if type_.is_err() {
        lost.push(format!("spec.type={}", spec.type_));
    }
    if spec.proxy_secret_ref.is_some() {
        lost.push("spec.proxySecretRef".to_string());
    }
    if spec.service_account_name.is_some() {
        lost.push("spec.serviceAccountName".to_string());
    }
    if spec.commit_status_expr.is_some() {
        lost.push("spec.commitStatusExpr".to_string());
    }

    let type_ = match type_ {
        Ok(t) if lost.is_empty() || policy == ConversionPolicy::AllowLossy => t,
        _ => {
            return Err(Error::ConversionLoss {
                from: ApiVersion::V1beta3,
                to: ApiVersion::V1beta1,
                lost,
            });
        }
    };

    let mut warnings: Vec<FieldWarning> = lost
        .into_iter()
        .map(|field| FieldWarning::new(field, "dropped: not representable in v1beta1"))
        .collect();

    let mut out = v1beta1::Provider::new(
        "",
        v1beta1::ProviderSpec {
            type_,
            interval: spec.interval,
            channel: spec.channel,
            username: spec.username,
            address: spec.address,
            timeout: spec.timeout,
            proxy: spec.proxy,
            secret_ref: spec.secret_ref,
            cert_secret_ref: spec.cert_secret_ref,
            suspend: spec.suspend,
        },
    );
    out.metadata = provider.metadata;

    let stashed = out
        .metadata
        .annotations
        .as_mut()
        .and_then(|annotations| annotations.remove(STATUS_ANNOTATION));
    if out.metadata.annotations.as_ref().is_some_and(BTreeMap::is_empty) {
        out.metadata.annotations = None;
    }
    if let Some(encoded) = stashed {
        match serde_json::from_str::<v1beta1::ProviderStatus>(&encoded) {
            Ok(status) => out.status = Some(status),
            Err(e) => warnings.push(FieldWarning::new(
                format!("metadata.annotations[{STATUS_ANNOTATION}]"),
                format!("discarded unreadable v1beta1 status: {e}"),
            )),
        }
    }

    for warning in &warnings {
        warn!(name = ?out.metadata.name, field = %warning.field, "lossy conversion to v1beta1: {}", warning.message);
    }

    Ok(Converted {
        object: out,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, ConditionStatus, READY_CONDITION};
    use crate::references::LocalObjectReference;

    fn v1beta1_slack() -> v1beta1::Provider {
        let mut spec = v1beta1::ProviderSpec::new(v1beta1::ProviderType::Slack);
        spec.channel = Some("ops".to_string());
        let mut provider = v1beta1::Provider::new("alerts", spec);
        provider.metadata.namespace = Some("flux-system".to_string());
        provider
    }

    #[test]
    fn test_every_v1beta1_type_upgrades_to_same_identifier() {
        for t in v1beta1::ProviderType::ALL {
            let upgraded: v1beta3::ProviderType = t.into();
            assert_eq!(upgraded.as_str(), t.as_str());
            assert_eq!(v1beta1::ProviderType::try_from(upgraded), Ok(t));
        }
    }

    #[test]
    fn test_upgrade_passes_fields_through() {
        let upgraded = upgrade(v1beta1_slack()).unwrap();
        assert_eq!(upgraded.spec.type_, v1beta3::ProviderType::Slack);
        assert_eq!(upgraded.spec.channel.as_deref(), Some("ops"));
        assert_eq!(upgraded.spec.proxy_secret_ref, None);
        assert_eq!(upgraded.spec.service_account_name, None);
        assert_eq!(upgraded.spec.commit_status_expr, None);
        assert_eq!(upgraded.metadata.name.as_deref(), Some("alerts"));
        assert_eq!(upgraded.metadata.annotations, None, "no status, no sidecar");
    }

    #[test]
    fn test_upgrade_without_status_drops_stale_sidecar() {
        let mut provider = v1beta1_slack();
        let annotations = provider.metadata.annotations.get_or_insert_with(BTreeMap::new);
        annotations.insert(STATUS_ANNOTATION.to_string(), r#"{"observedGeneration":7}"#.to_string());
        annotations.insert("team".to_string(), "platform".to_string());

        let stored = upgrade(provider).unwrap();
        let annotations = stored.metadata.annotations.clone().unwrap();
        assert!(!annotations.contains_key(STATUS_ANNOTATION));
        assert_eq!(annotations.get("team").map(String::as_str), Some("platform"));

        let restored = downgrade(stored, ConversionPolicy::Strict).unwrap();
        assert_eq!(restored.object.status, None, "no status comes back from a stale sidecar");
    }

    #[test]
    fn test_upgrade_without_status_clears_empty_annotations() {
        let mut provider = v1beta1_slack();
        provider
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(STATUS_ANNOTATION.to_string(), "{}".to_string());

        let stored = upgrade(provider).unwrap();
        assert_eq!(stored.metadata.annotations, None);
    }

    #[test]
    fn test_status_survives_round_trip() {
        let mut original = v1beta1_slack();
        original.set_condition(
            Condition::new(READY_CONDITION, ConditionStatus::True, "Succeeded", "Initialized").observed_generation(2),
        );
        original.status.as_mut().unwrap().observed_generation = Some(2);

        let stored = upgrade(original.clone()).unwrap();
        assert!(stored.metadata.annotations.as_ref().unwrap().contains_key(STATUS_ANNOTATION));

        let restored = downgrade(stored, ConversionPolicy::Strict).unwrap();
        assert!(restored.warnings.is_empty());
        assert_eq!(restored.object, original);
    }

    #[test]
    fn test_downgrade_rejects_newer_kind() {
        let provider = v1beta3::Provider::new("bus", v1beta3::ProviderSpec::new(v1beta3::ProviderType::Nats));
        for policy in [ConversionPolicy::Strict, ConversionPolicy::AllowLossy] {
            let err = downgrade(provider.clone(), policy).unwrap_err();
            assert!(
                matches!(&err, Error::ConversionLoss { lost, .. } if lost == &vec!["spec.type=nats".to_string()]),
                "unexpected error: {err}"
            );
        }
    }

    #[test]
    fn test_strict_downgrade_rejects_dropped_fields() {
        let mut spec = v1beta3::ProviderSpec::new(v1beta3::ProviderType::GitHub);
        spec.commit_status_expr = Some("event.involvedObject.kind".to_string());
        spec.proxy_secret_ref = Some(LocalObjectReference::new("proxy"));
        let provider = v1beta3::Provider::new("forge", spec);

        let err = downgrade(provider, ConversionPolicy::Strict).unwrap_err();
        match err {
            Error::ConversionLoss { lost, .. } => {
                assert_eq!(lost, vec!["spec.proxySecretRef", "spec.commitStatusExpr"]);
            }
            other => panic!("expected ConversionLoss, got {other}"),
        }
    }

    #[test]
    fn test_lossy_downgrade_warns() {
        let mut spec = v1beta3::ProviderSpec::new(v1beta3::ProviderType::AzureEventHub);
        spec.service_account_name = Some("notifier".to_string());
        let provider = v1beta3::Provider::new("hub", spec);

        let converted = downgrade(provider, ConversionPolicy::AllowLossy).unwrap();
        assert_eq!(converted.object.spec.type_, v1beta1::ProviderType::AzureEventHub);
        assert_eq!(converted.warnings.len(), 1);
        assert_eq!(converted.warnings[0].field, "spec.serviceAccountName");
    }

    #[test]
    fn test_downgrade_then_upgrade_is_identity_for_shared_fields() {
        let mut spec = v1beta3::ProviderSpec::new(v1beta3::ProviderType::Generic);
        spec.address = Some("https://example/h".to_string());
        spec.timeout = Some("2m30s".to_string());
        spec.suspend = true;
        let original = v1beta3::Provider::new("hook", spec);

        let downgraded = downgrade(original.clone(), ConversionPolicy::Strict).unwrap();
        let upgraded = upgrade(downgraded.object).unwrap();
        assert_eq!(upgraded, original);
    }

    #[test]
    fn test_unreadable_sidecar_is_reported() {
        let mut provider = v1beta3::Provider::new("alerts", v1beta3::ProviderSpec::new(v1beta3::ProviderType::Slack));
        provider
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(STATUS_ANNOTATION.to_string(), "not json".to_string());

        let converted = downgrade(provider, ConversionPolicy::Strict).unwrap();
        assert_eq!(converted.object.status, None);
        assert_eq!(converted.object.metadata.annotations, None);
        assert_eq!(converted.warnings.len(), 1);
    }
}
