//! # Decoding
//!
//! Turns a nested key/value document into typed Providers.
//!
//! `type` is checked against the version's kind registry before typed
//! decoding so a missing or unknown kind is reported as
//! [`FieldError::InvalidKind`] rather than an opaque serde message.
//! In [`DecodeMode::Strict`] the document is also walked against the
//! generated JSON schema and fields it does not define are rejected;
//! [`DecodeMode::Lenient`] ignores them for forward compatibility.

use schemars::{JsonSchema, Schema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, FieldError, Result};
use crate::kind::{ApiVersion, is_valid_kind};
use crate::validation::{SpecFields, Validator};
use crate::{conversion, v1beta1, v1beta3};

/// Treatment of fields the schema does not define
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Ignore unknown fields
    #[default]
    Lenient,

    /// Reject unknown fields with [`Error::UnknownFields`]
    Strict,
}

/// A Provider spec shape belonging to one API version
pub trait VersionedSpec: DeserializeOwned + JsonSchema {
    /// Version the shape belongs to
    const VERSION: ApiVersion;
}

/// A Provider resource belonging to one API version
pub trait VersionedResource: DeserializeOwned {
    /// Spec shape of the resource
    type Spec: VersionedSpec;

    /// Schema of the status section, `None` when the version stores no status
    fn status_schema() -> Option<Schema>;
}

impl VersionedSpec for v1beta1::ProviderSpec {
    const VERSION: ApiVersion = ApiVersion::V1beta1;
}

impl VersionedSpec for v1beta3::ProviderSpec {
    const VERSION: ApiVersion = ApiVersion::V1beta3;
}

impl VersionedResource for v1beta1::Provider {
    type Spec = v1beta1::ProviderSpec;

    fn status_schema() -> Option<Schema> {
        Some(schema_for!(v1beta1::ProviderStatus))
    }
}

impl VersionedResource for v1beta3::Provider {
    type Spec = v1beta3::ProviderSpec;

    fn status_schema() -> Option<Schema> {
        None
    }
}

/// A Provider of either served version
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedProvider {
    /// Deprecated v1beta1 object
    V1beta1(v1beta1::Provider),
    /// Storage version object
    V1beta3(v1beta3::Provider),
}

impl VersionedProvider {
    /// Version of the wrapped object
    pub fn version(&self) -> ApiVersion {
        match self {
            VersionedProvider::V1beta1(_) => ApiVersion::V1beta1,
            VersionedProvider::V1beta3(_) => ApiVersion::V1beta3,
        }
    }

    /// Convert to the storage version
    pub fn into_storage(self) -> Result<v1beta3::Provider> {
        match self {
            VersionedProvider::V1beta1(p) => conversion::upgrade(p),
            VersionedProvider::V1beta3(p) => Ok(p),
        }
    }
}

/// Decode a spec document such as `{"type": "slack"}`
pub fn decode_spec<S: VersionedSpec>(value: Value, mode: DecodeMode) -> Result<S> {
    check_kind(&value, S::VERSION, "spec")?;

    if mode == DecodeMode::Strict {
        let schema = schema_for!(S);
        let mut unknown = Vec::new();
        collect_unknown(&value, schema.as_value(), schema.as_value(), "spec", &mut unknown);
        if !unknown.is_empty() {
            return Err(Error::UnknownFields { paths: unknown });
        }
    }

    Ok(serde_json::from_value(value)?)
}

/// Decode a full resource document with `apiVersion`, `kind`, `metadata`
/// and `spec`
pub fn decode<R: VersionedResource>(value: Value, mode: DecodeMode) -> Result<R> {
    let version = <R::Spec as VersionedSpec>::VERSION;
    let spec = value.get("spec").cloned().unwrap_or(Value::Null);
    check_kind(&spec, version, "spec")?;

    if mode == DecodeMode::Strict {
        let mut unknown = Vec::new();
        let status_schema = R::status_schema();

        if let Some(object) = value.as_object() {
            for key in object.keys() {
                let allowed = matches!(key.as_str(), "apiVersion" | "kind" | "metadata" | "spec")
                    || (key == "status" && status_schema.is_some());
                if !allowed {
                    unknown.push(key.clone());
                }
            }
        }

        let spec_schema = schema_for!(R::Spec);
        collect_unknown(&spec, spec_schema.as_value(), spec_schema.as_value(), "spec", &mut unknown);

        if let (Some(status), Some(schema)) = (value.get("status"), status_schema.as_ref()) {
            collect_unknown(status, schema.as_value(), schema.as_value(), "status", &mut unknown);
        }

        if !unknown.is_empty() {
            return Err(Error::UnknownFields { paths: unknown });
        }
    }

    let resource = serde_json::from_value(value)?;
    debug!(version = %version, "decoded Provider");
    Ok(resource)
}

/// Decode a resource of whichever version its `apiVersion` names
pub fn decode_any(value: Value, mode: DecodeMode) -> Result<VersionedProvider> {
    let api_version = value.get("apiVersion").and_then(Value::as_str).unwrap_or_default();
    match ApiVersion::from_api_version(api_version) {
        Some(ApiVersion::V1beta1) => decode(value, mode).map(VersionedProvider::V1beta1),
        Some(ApiVersion::V1beta3) => decode(value, mode).map(VersionedProvider::V1beta3),
        None => Err(Error::UnsupportedVersion(api_version.to_string())),
    }
}

// A bad `type` keeps the typed spec from decoding, so the remaining field
// checks run on the raw document and every violation is reported together.
fn check_kind(spec: &Value, version: ApiVersion, prefix: &str) -> Result<()> {
    let field = format!("{prefix}.type");
    let (error, kind) = match spec.get("type") {
        None | Some(Value::Null) => (
            FieldError::InvalidKind {
                field,
                value: None,
                version,
            },
            String::new(),
        ),
        Some(Value::String(kind)) if is_valid_kind(version, kind) => return Ok(()),
        Some(Value::String(kind)) => (
            FieldError::InvalidKind {
                field,
                value: Some(kind.clone()),
                version,
            },
            kind.clone(),
        ),
        Some(other) => (
            FieldError::InvalidKind {
                field,
                value: Some(other.to_string()),
                version,
            },
            other.to_string(),
        ),
    };

    let mut v = Validator::default();
    v.error(error);
    v.spec_fields(&SpecFields::from_value(spec), version);
    // An unknown kind is never a forge kind.
    if version == ApiVersion::V1beta3 && spec.get("commitStatusExpr").is_some_and(|e| !e.is_null()) {
        v.error(v1beta3::provider::commit_status_violation(&kind));
    }
    Err(v.into_errors().into())
}

// Records paths of object keys the schema does not declare. Branches of
// anyOf/oneOf/allOf are searched for the first object or array schema.
fn collect_unknown(value: &Value, schema: &Value, root: &Value, path: &str, unknown: &mut Vec<String>) {
    match value {
        Value::Object(object) => {
            let Some(schema) = find_schema(schema, root, &|s: &Map<String, Value>| s.contains_key("properties")) else {
                return;
            };
            if schema.get("additionalProperties").is_some_and(|a| a != &Value::Bool(false)) {
                return;
            }
            let properties = schema.get("properties").and_then(Value::as_object);
            for (key, child) in object {
                let child_path = format!("{path}.{key}");
                match properties.and_then(|p| p.get(key)) {
                    Some(child_schema) => collect_unknown(child, child_schema, root, &child_path, unknown),
                    None => unknown.push(child_path),
                }
            }
        }
        Value::Array(items) => {
            let Some(schema) = find_schema(schema, root, &|s: &Map<String, Value>| s.contains_key("items")) else {
                return;
            };
            let Some(item_schema) = schema.get("items") else {
                return;
            };
            for (i, item) in items.iter().enumerate() {
                collect_unknown(item, item_schema, root, &format!("{path}[{i}]"), unknown);
            }
        }
        _ => {}
    }
}

fn find_schema<'a>(
    schema: &'a Value,
    root: &'a Value,
    accept: &dyn Fn(&Map<String, Value>) -> bool,
) -> Option<&'a Map<String, Value>> {
    let schema = resolve_ref(schema, root)?.as_object()?;
    if accept(schema) {
        return Some(schema);
    }
    ["allOf", "anyOf", "oneOf"]
        .iter()
        .filter_map(|key| schema.get(*key).and_then(Value::as_array))
        .flatten()
        .find_map(|branch| find_schema(branch, root, accept))
}

fn resolve_ref<'a>(schema: &'a Value, root: &'a Value) -> Option<&'a Value> {
    match schema.get("$ref").and_then(Value::as_str) {
        Some(reference) => root.pointer(reference.strip_prefix('#')?),
        None => Some(schema),
    }
}
