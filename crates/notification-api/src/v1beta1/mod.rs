//! v1beta1 Provider API
//!
//! Deprecated. Served for existing clients and converted to v1beta3 for
//! storage; its status travels in a conversion annotation.

pub mod provider;
pub mod provider_type;

pub use provider::*;
pub use provider_type::*;

/// List of v1beta1 Providers
pub type ProviderList = kube::core::ObjectList<Provider>;
