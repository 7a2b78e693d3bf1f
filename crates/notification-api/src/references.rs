//! Secret references for Provider CRDs
//!
//! References are weak: they name a companion object in the Provider's own
//! namespace and are resolved by the controller, never by this crate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to an object in the same namespace as the referencing Provider
///
/// Follows the Kubernetes `LocalObjectReference` pattern: only `name` is
/// carried, the namespace is implied by the owner.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub struct LocalObjectReference {
    /// Name of the referent
    #[schemars(length(min = 1))]
    pub name: String,
}

impl LocalObjectReference {
    /// Create a reference to `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl From<&str> for LocalObjectReference {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
