//! Provider kind registry
//!
//! Stable string identifiers for every provider kind, grouped by the API
//! version that introduced them. Identifiers are lower-case, case-sensitive
//! and never renamed; later versions only add to the set.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{v1beta1, v1beta3};

/// API group shared by every served version of the Provider resource
pub const GROUP: &str = "notification.toolkit.fluxcd.io";

/// Resource kind of the Provider object
pub const PROVIDER_KIND: &str = "Provider";

/// Plain JSON webhook
pub const GENERIC_PROVIDER: &str = "generic";
/// JSON webhook signed with an HMAC of the payload
pub const GENERIC_HMAC_PROVIDER: &str = "generic-hmac";
/// Slack incoming webhook or chat API
pub const SLACK_PROVIDER: &str = "slack";
/// Grafana annotations API
pub const GRAFANA_PROVIDER: &str = "grafana";
/// Discord webhook
pub const DISCORD_PROVIDER: &str = "discord";
/// Microsoft Teams incoming webhook or workflow
pub const MSTEAMS_PROVIDER: &str = "msteams";
/// Rocket.Chat incoming webhook
pub const ROCKET_PROVIDER: &str = "rocket";
/// GitHub repository dispatch event
pub const GITHUB_DISPATCH_PROVIDER: &str = "githubdispatch";
/// GitHub commit status
pub const GITHUB_PROVIDER: &str = "github";
/// GitLab commit status
pub const GITLAB_PROVIDER: &str = "gitlab";
/// Bitbucket Cloud commit status
pub const BITBUCKET_PROVIDER: &str = "bitbucket";
/// Azure DevOps commit status
pub const AZURE_DEVOPS_PROVIDER: &str = "azuredevops";
/// Google Chat webhook
pub const GOOGLE_CHAT_PROVIDER: &str = "googlechat";
/// Webex room message
pub const WEBEX_PROVIDER: &str = "webex";
/// Sentry event
pub const SENTRY_PROVIDER: &str = "sentry";
/// Azure Event Hubs message
pub const AZURE_EVENT_HUB_PROVIDER: &str = "azureeventhub";
/// Telegram bot message
pub const TELEGRAM_PROVIDER: &str = "telegram";
/// Lark bot message
pub const LARK_PROVIDER: &str = "lark";
/// Matrix room message
pub const MATRIX_PROVIDER: &str = "matrix";
/// Opsgenie alert
pub const OPSGENIE_PROVIDER: &str = "opsgenie";
/// Prometheus Alertmanager alert
pub const ALERTMANAGER_PROVIDER: &str = "alertmanager";

/// Gitea commit status
pub const GITEA_PROVIDER: &str = "gitea";
/// Bitbucket Server / Data Center commit status
pub const BITBUCKET_SERVER_PROVIDER: &str = "bitbucketserver";
/// Google Cloud Pub/Sub message
pub const GOOGLE_PUBSUB_PROVIDER: &str = "googlepubsub";
/// PagerDuty event
pub const PAGERDUTY_PROVIDER: &str = "pagerduty";
/// Datadog event
pub const DATADOG_PROVIDER: &str = "datadog";
/// NATS subject publish
pub const NATS_PROVIDER: &str = "nats";
/// Zulip stream message
pub const ZULIP_PROVIDER: &str = "zulip";
/// OpenTelemetry trace export
pub const OTEL_PROVIDER: &str = "otel";
/// GitHub pull request comment
pub const GITHUB_PULL_REQUEST_COMMENT_PROVIDER: &str = "githubpullrequestcomment";

/// Kinds that post commit statuses to a source forge and therefore accept
/// `commitStatusExpr`
pub const COMMIT_STATUS_PROVIDERS: [&str; 6] = [
    GITHUB_PROVIDER,
    GITLAB_PROVIDER,
    GITEA_PROVIDER,
    BITBUCKET_SERVER_PROVIDER,
    BITBUCKET_PROVIDER,
    AZURE_DEVOPS_PROVIDER,
];

/// Kinds that can authenticate through a Kubernetes service account
/// exchanged for cloud credentials
pub const WORKLOAD_IDENTITY_PROVIDERS: [&str; 3] = [
    AZURE_EVENT_HUB_PROVIDER,
    AZURE_DEVOPS_PROVIDER,
    GOOGLE_PUBSUB_PROVIDER,
];

/// Served versions of the Provider resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Deprecated version, still served and carrying a status subresource
    V1beta1,

    /// Storage version
    V1beta3,
}

impl ApiVersion {
    /// Every served version, oldest first
    pub const ALL: [ApiVersion; 2] = [ApiVersion::V1beta1, ApiVersion::V1beta3];

    /// Version used for persistence
    pub const STORAGE: ApiVersion = ApiVersion::V1beta3;

    /// Version name, e.g. `v1beta3`
    pub const fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1beta1 => "v1beta1",
            ApiVersion::V1beta3 => "v1beta3",
        }
    }

    /// Fully qualified `apiVersion` value, e.g.
    /// `notification.toolkit.fluxcd.io/v1beta3`
    pub fn api_version(self) -> String {
        format!("{GROUP}/{}", self.as_str())
    }

    /// Parse a fully qualified `apiVersion` value
    pub fn from_api_version(api_version: &str) -> Option<Self> {
        let (group, version) = api_version.split_once('/')?;
        if group != GROUP {
            return None;
        }
        Self::ALL.into_iter().find(|v| v.as_str() == version)
    }

    /// Whether this is the storage version
    pub const fn is_storage(self) -> bool {
        matches!(self, ApiVersion::V1beta3)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `kind` names a provider kind served by `version`
///
/// Matching is exact: `GitHub` is not `github`.
pub fn is_valid_kind(version: ApiVersion, kind: &str) -> bool {
    match version {
        ApiVersion::V1beta1 => v1beta1::ProviderType::ALL.iter().any(|t| t.as_str() == kind),
        ApiVersion::V1beta3 => v1beta3::ProviderType::ALL.iter().any(|t| t.as_str() == kind),
    }
}

/// Every provider kind served by `version`, lexically sorted
pub fn all_kinds(version: ApiVersion) -> BTreeSet<&'static str> {
    match version {
        ApiVersion::V1beta1 => v1beta1::ProviderType::ALL.iter().map(|t| t.as_str()).collect(),
        ApiVersion::V1beta3 => v1beta3::ProviderType::ALL.iter().map(|t| t.as_str()).collect(),
    }
}
