//! v1beta3 Provider API (storage version)
//!
//! Adds to v1beta1:
//! - `proxySecretRef`, replacing the scalar `proxy`
//! - `serviceAccountName` for workload identity
//! - `commitStatusExpr` for forge providers
//! - gitea, bitbucketserver, googlepubsub, pagerduty, datadog, nats, zulip,
//!   otel and githubpullrequestcomment kinds
//!
//! The stored shape has no status.

pub mod provider;
pub mod provider_type;

pub use provider::*;
pub use provider_type::*;

/// List of v1beta3 Providers
pub type ProviderList = kube::core::ObjectList<Provider>;
