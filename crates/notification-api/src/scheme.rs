//! # Scheme Registration
//!
//! Records which Rust type serves each group/version/kind so the cluster API
//! client can list and watch Providers of either version.
//!
//! The process-wide scheme is installed once. Installing again with the
//! same registrations is logged and ignored; installing a divergent scheme
//! fails with [`Error::RegistrationConflict`].

use std::any::type_name;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::Resource;
use kube::core::CustomResourceExt;
use kube::core::crd::merge_crds;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::kind::ApiVersion;
use crate::{v1beta1, v1beta3};

static SCHEME: OnceLock<Scheme> = OnceLock::new();

/// Fully qualified resource type identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupVersionKind {
    /// API group, e.g. `notification.toolkit.fluxcd.io`
    pub group: String,
    /// Version within the group, e.g. `v1beta3`
    pub version: String,
    /// Resource kind, e.g. `Provider`
    pub kind: String,
}

impl GroupVersionKind {
    /// Build from its parts
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Identifier of a statically typed resource
    pub fn of<K: Resource<DynamicType = ()>>() -> Self {
        Self::new(K::group(&()), K::version(&()), K::kind(&()))
    }

    /// `group/version` as written in `apiVersion`
    pub fn api_version(&self) -> String {
        format!("{}/{}", self.group, self.version)
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}

/// Registry of known resource types and their storage versions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scheme {
    types: BTreeMap<GroupVersionKind, &'static str>,
    // (group, kind) -> version
    storage: BTreeMap<(String, String), String>,
}

impl Scheme {
    /// Empty scheme
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `K` under its group/version/kind
    ///
    /// Registering the same type twice is a no-op. Registering a different
    /// type under an identifier that is already taken fails.
    pub fn add_known_type<K: Resource<DynamicType = ()>>(&mut self) -> Result<()> {
        let gvk = GroupVersionKind::of::<K>();
        let name = type_name::<K>();

        match self.types.get(&gvk) {
            Some(existing) if *existing == name => Ok(()),
            Some(existing) => Err(Error::RegistrationConflict {
                message: format!("already registered as {existing}, refusing {name}"),
                gvk: gvk.to_string(),
            }),
            None => {
                self.types.insert(gvk, name);
                Ok(())
            }
        }
    }

    /// Mark `gvk` as the storage version of its group and kind
    pub fn set_storage_version(&mut self, gvk: &GroupVersionKind) -> Result<()> {
        if !self.recognizes(gvk) {
            return Err(Error::RegistrationConflict {
                gvk: gvk.to_string(),
                message: "storage version must be registered first".to_string(),
            });
        }

        let key = (gvk.group.clone(), gvk.kind.clone());
        match self.storage.get(&key) {
            Some(version) if version != &gvk.version => Err(Error::RegistrationConflict {
                gvk: gvk.to_string(),
                message: format!("storage version is already {version}"),
            }),
            _ => {
                self.storage.insert(key, gvk.version.clone());
                Ok(())
            }
        }
    }

    /// Whether a type is registered under `gvk`
    pub fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
        self.types.contains_key(gvk)
    }

    /// Rust type name registered under `gvk`
    pub fn type_name(&self, gvk: &GroupVersionKind) -> Option<&'static str> {
        self.types.get(gvk).copied()
    }

    /// Registered versions of a group and kind, sorted
    pub fn versions_for(&self, group: &str, kind: &str) -> Vec<&str> {
        self.types
            .keys()
            .filter(|gvk| gvk.group == group && gvk.kind == kind)
            .map(|gvk| gvk.version.as_str())
            .collect()
    }

    /// Storage version of a group and kind
    pub fn storage_version(&self, group: &str, kind: &str) -> Option<&str> {
        self.storage
            .get(&(group.to_string(), kind.to_string()))
            .map(String::as_str)
    }

    /// Every registered identifier, sorted
    pub fn known_types(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.types.keys()
    }

    // First identifier whose registration differs between the two schemes.
    fn divergence(&self, other: &Scheme) -> Option<String> {
        self.types
            .iter()
            .find(|(gvk, name)| other.types.get(*gvk) != Some(*name))
            .or_else(|| other.types.iter().find(|(gvk, _)| !self.types.contains_key(*gvk)))
            .map(|(gvk, _)| gvk.to_string())
    }
}

/// Register both Provider versions with v1beta3 as storage
pub fn add_to_scheme(scheme: &mut Scheme) -> Result<()> {
    scheme.add_known_type::<v1beta1::Provider>()?;
    scheme.add_known_type::<v1beta3::Provider>()?;
    scheme.set_storage_version(&GroupVersionKind::of::<v1beta3::Provider>())
}

/// Install the package scheme process-wide
pub fn install() -> Result<&'static Scheme> {
    let mut scheme = Scheme::new();
    add_to_scheme(&mut scheme)?;
    install_with(scheme)
}

/// Install `scheme` process-wide
pub fn install_with(scheme: Scheme) -> Result<&'static Scheme> {
    install_into(&SCHEME, scheme)
}

/// The installed process-wide scheme, if any
pub fn global() -> Option<&'static Scheme> {
    SCHEME.get()
}

fn install_into(cell: &OnceLock<Scheme>, scheme: Scheme) -> Result<&Scheme> {
    let mut pending = Some(scheme);
    let installed = cell.get_or_init(|| pending.take().unwrap_or_default());

    match pending {
        None => {
            debug!(types = installed.types.len(), "installed scheme");
            Ok(installed)
        }
        Some(repeat) if &repeat == installed => {
            warn!("scheme installed twice with identical registrations");
            Ok(installed)
        }
        Some(repeat) => {
            let gvk = installed
                .divergence(&repeat)
                .unwrap_or_else(|| "storage versions".to_string());
            Err(Error::RegistrationConflict {
                gvk,
                message: "scheme already installed with different registrations".to_string(),
            })
        }
    }
}

/// CustomResourceDefinition serving both Provider versions
pub fn crd() -> Result<CustomResourceDefinition> {
    let crds = vec![v1beta1::Provider::crd(), v1beta3::Provider::crd()];
    Ok(merge_crds(crds, ApiVersion::STORAGE.as_str())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{GROUP, PROVIDER_KIND};

    mod shadow {
        use kube::CustomResource;
        use schemars::JsonSchema;
        use serde::{Deserialize, Serialize};

        #[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
        #[kube(group = "notification.toolkit.fluxcd.io", version = "v1beta3", kind = "Provider", namespaced)]
        pub struct ShadowSpec {
            pub name: String,
        }
    }

    fn package_scheme() -> Scheme {
        let mut scheme = Scheme::new();
        add_to_scheme(&mut scheme).unwrap();
        scheme
    }

    #[test]
    fn test_both_versions_registered() {
        let scheme = package_scheme();
        assert_eq!(scheme.versions_for(GROUP, PROVIDER_KIND), vec!["v1beta1", "v1beta3"]);
        assert_eq!(scheme.storage_version(GROUP, PROVIDER_KIND), Some("v1beta3"));
        assert!(scheme.recognizes(&GroupVersionKind::new(GROUP, "v1beta1", PROVIDER_KIND)));
        assert!(!scheme.recognizes(&GroupVersionKind::new(GROUP, "v1beta2", PROVIDER_KIND)));
    }

    #[test]
    fn test_registered_type_names() {
        let scheme = package_scheme();
        let storage = GroupVersionKind::of::<v1beta3::Provider>();
        assert_eq!(scheme.type_name(&storage), Some(type_name::<v1beta3::Provider>()));
        assert_ne!(
            scheme.type_name(&GroupVersionKind::of::<v1beta1::Provider>()),
            scheme.type_name(&storage),
            "each version is served by its own type"
        );
        assert_eq!(scheme.type_name(&GroupVersionKind::new(GROUP, "v1", PROVIDER_KIND)), None);
    }

    #[test]
    fn test_known_types_are_sorted() {
        let scheme = package_scheme();
        let known: Vec<String> = scheme.known_types().map(GroupVersionKind::api_version).collect();
        assert_eq!(
            known,
            vec![
                "notification.toolkit.fluxcd.io/v1beta1".to_string(),
                "notification.toolkit.fluxcd.io/v1beta3".to_string(),
            ]
        );
        assert_eq!(Scheme::new().known_types().count(), 0);
    }

    #[test]
    fn test_gvk_display() {
        let gvk = GroupVersionKind::of::<v1beta3::Provider>();
        assert_eq!(gvk.to_string(), "notification.toolkit.fluxcd.io/v1beta3, Kind=Provider");
        assert_eq!(gvk.api_version(), "notification.toolkit.fluxcd.io/v1beta3");
    }

    #[test]
    fn test_same_type_twice_is_noop() {
        let mut scheme = package_scheme();
        scheme.add_known_type::<v1beta3::Provider>().unwrap();
        assert_eq!(scheme, package_scheme());
    }

    #[test]
    fn test_different_type_same_gvk_conflicts() {
        let mut scheme = package_scheme();
        let err = scheme.add_known_type::<shadow::Provider>().unwrap_err();
        assert!(matches!(
            err,
            Error::RegistrationConflict { ref gvk, .. } if gvk == "notification.toolkit.fluxcd.io/v1beta3, Kind=Provider"
        ));
    }

    #[test]
    fn test_storage_version_requires_registration() {
        let mut scheme = Scheme::new();
        let gvk = GroupVersionKind::of::<v1beta3::Provider>();
        assert!(scheme.set_storage_version(&gvk).is_err());
    }

    #[test]
    fn test_storage_version_cannot_move() {
        let mut scheme = package_scheme();
        let older = GroupVersionKind::of::<v1beta1::Provider>();
        assert!(scheme.set_storage_version(&older).is_err(), "storage is already v1beta3");
    }

    #[test]
    fn test_install_is_one_shot() {
        let cell = OnceLock::new();
        install_into(&cell, package_scheme()).unwrap();

        // identical repeat is tolerated
        let installed = install_into(&cell, package_scheme()).unwrap();
        assert_eq!(installed, &package_scheme());

        let mut partial = Scheme::new();
        partial.add_known_type::<v1beta1::Provider>().unwrap();
        let err = install_into(&cell, partial).unwrap_err();
        assert!(matches!(err, Error::RegistrationConflict { .. }), "divergent install must fail");
    }

    #[test]
    fn test_global_install() {
        let scheme = install().unwrap();
        assert_eq!(scheme.storage_version(GROUP, PROVIDER_KIND), Some("v1beta3"));
        assert!(global().is_some());
        assert!(install().is_ok());
    }

    #[test]
    fn test_merged_crd_versions() {
        let crd = crd().unwrap();
        assert_eq!(crd.spec.group, GROUP);
        assert_eq!(crd.spec.names.kind, PROVIDER_KIND);
        assert_eq!(crd.spec.versions.len(), 2);

        let v1beta1 = crd.spec.versions.iter().find(|v| v.name == "v1beta1").unwrap();
        assert!(v1beta1.served);
        assert!(!v1beta1.storage);
        assert_eq!(v1beta1.deprecated, Some(true));

        let v1beta3 = crd.spec.versions.iter().find(|v| v.name == "v1beta3").unwrap();
        assert!(v1beta3.storage);
        assert_ne!(v1beta3.deprecated, Some(true));
    }

    #[test]
    fn test_crd_schema_carries_constraints() {
        let json = serde_json::to_string(&crd().unwrap()).unwrap();
        assert!(json.contains("x-kubernetes-validations"), "CEL rule for commitStatusExpr");
        assert!(json.contains("\"maxLength\":2048"));
        assert!(json.contains("\"nats\""));
        assert!(json.contains("^(http|https)://.*$"));
    }
}
