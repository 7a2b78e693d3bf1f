//! Provider kinds served by v1beta1

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FieldError;
use crate::kind::{self, ApiVersion};

/// Endpoint family a v1beta1 Provider targets
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
    /// Bitbucket Cloud commit status
    Bitbucket,
    /// Azure DevOps commit status
    AzureDevOps,
    /// Google Chat webhook
    GoogleChat,
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
}

impl ProviderType {
    /// Every v1beta1 kind, in declaration order
    pub const ALL: [ProviderType; 21] = [
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
        ProviderType::Bitbucket,
        ProviderType::AzureDevOps,
        ProviderType::GoogleChat,
        ProviderType::Webex,
        ProviderType::Sentry,
        ProviderType::AzureEventHub,
        ProviderType::Telegram,
        ProviderType::Lark,
        ProviderType::Matrix,
        ProviderType::OpsGenie,
        ProviderType::AlertManager,
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
            ProviderType::Bitbucket => kind::BITBUCKET_PROVIDER,
            ProviderType::AzureDevOps => kind::AZURE_DEVOPS_PROVIDER,
            ProviderType::GoogleChat => kind::GOOGLE_CHAT_PROVIDER,
            ProviderType::Webex => kind::WEBEX_PROVIDER,
            ProviderType::Sentry => kind::SENTRY_PROVIDER,
            ProviderType::AzureEventHub => kind::AZURE_EVENT_HUB_PROVIDER,
            ProviderType::Telegram => kind::TELEGRAM_PROVIDER,
            ProviderType::Lark => kind::LARK_PROVIDER,
            ProviderType::Matrix => kind::MATRIX_PROVIDER,
            ProviderType::OpsGenie => kind::OPSGENIE_PROVIDER,
            ProviderType::AlertManager => kind::ALERTMANAGER_PROVIDER,
        }
    }

    /// Whether events for this kind are posted as commit statuses
    pub fn is_git_provider(self) -> bool {
        kind::COMMIT_STATUS_PROVIDERS.contains(&self.as_str())
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
                version: ApiVersion::V1beta1,
            })
    }
}
