//! Provider kinds served by v1beta3

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FieldError;
use crate::kind::{self, ApiVersion};

/// Endpoint family a v1beta3 Provider targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Plain JSON webhook
    Generic,
    /// JSON webhook signed with an HMAC of the payload
    #[serde(rename = "generic-hmac")]
    GenericHmac,
    /// Slack incoming webhook or chat API
    Slack,
    /// Grafana annotations API
    Grafana,
    /// Discord webhook
    Discord,
    /// Microsoft Teams incoming webhook or workflow
    MsTeams,
    /// Rocket.Chat incoming webhook
    Rocket,
    /// GitHub repository dispatch event
    GitHubDispatch,
    /// GitHub commit status
    GitHub,
    /// GitLab commit status
    GitLab,
    /// Gitea commit status
    Gitea,
    /// Bitbucket Server / Data Center commit status
    BitbucketServer,
    /// Bitbucket Cloud commit status
    Bitbucket,
    /// Azure DevOps commit status
    AzureDevOps,
    /// Google Chat webhook
    GoogleChat,
    /// Google Cloud Pub/Sub message
    GooglePubSub,
    /// Webex room message
    Webex,
    /// Sentry event
    Sentry,
    /// Azure Event Hubs message
    AzureEventHub,
    /// Telegram bot message
    Telegram,
    /// Lark bot message
    Lark,
    /// Matrix room message
    Matrix,
    /// Opsgenie alert
    OpsGenie,
    /// Prometheus Alertmanager alert
    AlertManager,
    /// PagerDuty event
    PagerDuty,
    /// Datadog event
    DataDog,
    /// NATS subject publish
    Nats,
    /// Zulip stream message
    Zulip,
    /// OpenTelemetry trace export
    Otel,
    /// GitHub pull request comment
    GitHubPullRequestComment,
}

impl ProviderType {
    /// Every v1beta3 kind, in declaration order
    pub const ALL: [ProviderType; 30] = [
        ProviderType::Generic,
        ProviderType::GenericHmac,
        ProviderType::Slack,
        ProviderType::Grafana,
        ProviderType::Discord,
        ProviderType::MsTeams,
        ProviderType::Rocket,
        ProviderType::GitHubDispatch,
        ProviderType::GitHub,
        ProviderType::GitLab,
        ProviderType::Gitea,
        ProviderType::BitbucketServer,
        ProviderType::Bitbucket,
        ProviderType::AzureDevOps,
        ProviderType::GoogleChat,
        ProviderType::GooglePubSub,
        ProviderType::Webex,
        ProviderType::Sentry,
        ProviderType::AzureEventHub,
        ProviderType::Telegram,
        ProviderType::Lark,
        ProviderType::Matrix,
        ProviderType::OpsGenie,
        ProviderType::AlertManager,
        ProviderType::PagerDuty,
        ProviderType::DataDog,
        ProviderType::Nats,
        ProviderType::Zulip,
        ProviderType::Otel,
        ProviderType::GitHubPullRequestComment,
    ];

    /// Wire identifier
    pub const fn as_str(self) -> &'static str {
        match self {
            ProviderType::Generic => kind::GENERIC_PROVIDER,
            ProviderType::GenericHmac => kind::GENERIC_HMAC_PROVIDER,
            ProviderType::Slack => kind::SLACK_PROVIDER,
            ProviderType::Grafana => kind::GRAFANA_PROVIDER,
            ProviderType::Discord => kind::DISCORD_PROVIDER,
            ProviderType::MsTeams => kind::MSTEAMS_PROVIDER,
            ProviderType::Rocket => kind::ROCKET_PROVIDER,
            ProviderType::GitHubDispatch => kind::GITHUB_DISPATCH_PROVIDER,
            ProviderType::GitHub => kind::GITHUB_PROVIDER,
            ProviderType::GitLab => kind::GITLAB_PROVIDER,
            ProviderType::Gitea => kind::GITEA_PROVIDER,
            ProviderType::BitbucketServer => kind::BITBUCKET_SERVER_PROVIDER,
            ProviderType::Bitbucket => kind::BITBUCKET_PROVIDER,
            ProviderType::AzureDevOps => kind::AZURE_DEVOPS_PROVIDER,
            ProviderType::GoogleChat => kind::GOOGLE_CHAT_PROVIDER,
            ProviderType::GooglePubSub => kind::GOOGLE_PUBSUB_PROVIDER,
            ProviderType::Webex => kind::WEBEX_PROVIDER,
            ProviderType::Sentry => kind::SENTRY_PROVIDER,
            ProviderType::AzureEventHub => kind::AZURE_EVENT_HUB_PROVIDER,
            ProviderType::Telegram => kind::TELEGRAM_PROVIDER,
            ProviderType::Lark => kind::LARK_PROVIDER,
            ProviderType::Matrix => kind::MATRIX_PROVIDER,
            ProviderType::OpsGenie => kind::OPSGENIE_PROVIDER,
            ProviderType::AlertManager => kind::ALERTMANAGER_PROVIDER,
            ProviderType::PagerDuty => kind::PAGERDUTY_PROVIDER,
            ProviderType::DataDog => kind::DATADOG_PROVIDER,
            ProviderType::Nats => kind::NATS_PROVIDER,
            ProviderType::Zulip => kind::ZULIP_PROVIDER,
            ProviderType::Otel => kind::OTEL_PROVIDER,
            ProviderType::GitHubPullRequestComment => kind::GITHUB_PULL_REQUEST_COMMENT_PROVIDER,
        }
    }

    /// Whether `commitStatusExpr` may be set for this kind
    pub fn supports_commit_status(self) -> bool {
        kind::COMMIT_STATUS_PROVIDERS.contains(&self.as_str())
    }

    /// Whether `serviceAccountName` is honored for this kind
    pub fn supports_workload_identity(self) -> bool {
        kind::WORKLOAD_IDENTITY_PROVIDERS.contains(&self.as_str())
    }
}

// Flat string enum over the wire identifiers, no per-variant subschemas.
impl JsonSchema for ProviderType {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("ProviderType")
    }

    fn inline_schema() -> bool {
        true
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::from("string"));
        schema.insert(
            "enum".to_string(),
            Self::ALL.iter().map(|t| t.as_str()).collect::<Value>(),
        );
        Schema::from(schema)
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FieldError::InvalidKind {
                field: "spec.type".to_string(),
                value: Some(s.to_string()),
                version: ApiVersion::V1beta3,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_flat_string_enum() {
        let schema = schemars::schema_for!(ProviderType);
        let kinds = schema.get("enum").and_then(Value::as_array).unwrap();
        assert_eq!(kinds.len(), ProviderType::ALL.len());
        assert_eq!(schema.get("type"), Some(&Value::from("string")));
        assert!(schema.get("oneOf").is_none());
    }

    #[test]
    fn test_serde_matches_registry_identifiers() {
        for t in ProviderType::ALL {
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, serde_json::Value::String(t.as_str().to_string()), "{t:?}");
            let back: ProviderType = serde_json::from_value(json).unwrap();
            assert_eq!(back, t);
        }
    }

    #[test]
    fn test_from_str_is_case_sensitive() {
        assert_eq!("github".parse::<ProviderType>(), Ok(ProviderType::GitHub));
        assert!(matches!(
            "GitHub".parse::<ProviderType>(),
            Err(FieldError::InvalidKind { value: Some(ref v), .. }) if v == "GitHub"
        ));
    }

    #[test]
    fn test_commit_status_subset() {
        let forges: Vec<_> = ProviderType::ALL
            .into_iter()
            .filter(|t| t.supports_commit_status())
            .map(ProviderType::as_str)
            .collect();
        assert_eq!(forges, vec!["github", "gitlab", "gitea", "bitbucketserver", "bitbucket", "azuredevops"]);
    }

    #[test]
    fn test_workload_identity_subset() {
        assert!(ProviderType::AzureEventHub.supports_workload_identity());
        assert!(ProviderType::AzureDevOps.supports_workload_identity());
        assert!(ProviderType::GooglePubSub.supports_workload_identity());
        assert!(!ProviderType::Slack.supports_workload_identity());
    }
}
