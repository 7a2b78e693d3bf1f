//! Shared field checks used by every Provider version.
//!
//! `Validator` accumulates errors and warnings instead of failing fast.

use std::sync::LazyLock;

use regex::Regex;

use serde_json::Value;

use crate::duration::{DurationFormat, parse_duration};
use crate::error::{FieldError, FieldWarning, ValidationErrors};
use crate::kind::ApiVersion;

pub use crate::duration::{INTERVAL_PATTERN, TIMEOUT_PATTERN};

/// Cap applied to channel, username, address and proxy
pub const MAX_STRING_LENGTH: usize = 2048;

/// Pattern for proxy addresses, and for every address in v1beta1
pub const URL_PATTERN: &str = r"^(http|https)://.*$";

#[allow(clippy::expect_used, reason = "pattern is a compile-time constant")]
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(URL_PATTERN).expect("url pattern compiles"));

/// Spec fields checked the same way by every version, borrowed from a typed
/// spec or from a raw document whose `type` could not be decoded.
/// References are carried by name.
#[derive(Debug, Default)]
pub(crate) struct SpecFields<'a> {
    pub(crate) interval: Option<&'a str>,
    pub(crate) channel: Option<&'a str>,
    pub(crate) username: Option<&'a str>,
    pub(crate) address: Option<&'a str>,
    pub(crate) timeout: Option<&'a str>,
    pub(crate) proxy: Option<&'a str>,
    pub(crate) proxy_secret_ref: Option<&'a str>,
    pub(crate) secret_ref: Option<&'a str>,
    pub(crate) cert_secret_ref: Option<&'a str>,
}

impl<'a> SpecFields<'a> {
    /// Non-string scalars are skipped; typed decoding reports them.
    pub(crate) fn from_value(spec: &'a Value) -> Self {
        let string = move |key: &str| spec.get(key).and_then(Value::as_str);
        let reference = move |key: &str| {
            spec.get(key)
                .filter(|r| !r.is_null())
                .map(|r| r.get("name").and_then(Value::as_str).unwrap_or_default())
        };
        Self {
            interval: string("interval"),
            channel: string("channel"),
            username: string("username"),
            address: string("address"),
            timeout: string("timeout"),
            proxy: string("proxy"),
            proxy_secret_ref: reference("proxySecretRef"),
            secret_ref: reference("secretRef"),
            cert_secret_ref: reference("certSecretRef"),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: Vec<FieldError>,
    warnings: Vec<FieldWarning>,
}

impl Validator {
    pub(crate) fn error(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub(crate) fn warn(&mut self, field: &str, message: impl Into<String>) {
        self.warnings.push(FieldWarning::new(field, message));
    }

    /// Returns false when the cap was exceeded so callers can skip
    /// format checks on the same field.
    pub(crate) fn max_length(&mut self, field: &str, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return true;
        };
        let actual = value.chars().count();
        if actual > MAX_STRING_LENGTH {
            self.error(FieldError::FieldTooLong {
                field: field.to_string(),
                max: MAX_STRING_LENGTH,
                actual,
            });
            return false;
        }
        true
    }

    pub(crate) fn url(&mut self, field: &str, value: Option<&str>) {
        let Some(value) = value else {
            return;
        };
        if !self.max_length(field, Some(value)) {
            return;
        }
        if !URL_REGEX.is_match(value) {
            self.error(FieldError::PatternMismatch {
                field: field.to_string(),
                value: value.to_string(),
                pattern: URL_PATTERN,
            });
        }
    }

    pub(crate) fn duration(&mut self, field: &str, value: Option<&str>, format: DurationFormat) {
        let Some(value) = value else {
            return;
        };
        if let Err(e) = parse_duration(value, format) {
            self.error(FieldError::MalformedDuration {
                field: field.to_string(),
                value: value.to_string(),
                reason: e.to_string(),
            });
        }
    }

    pub(crate) fn reference(&mut self, field: &str, name: Option<&str>) {
        if name.is_some_and(str::is_empty) {
            self.error(FieldError::Required {
                field: format!("{field}.name"),
            });
        }
    }

    /// Field format checks shared by both versions. v1beta1 additionally
    /// requires an HTTP/S `address`.
    pub(crate) fn spec_fields(&mut self, fields: &SpecFields<'_>, version: ApiVersion) {
        self.duration("spec.interval", fields.interval, DurationFormat::Interval);
        self.max_length("spec.channel", fields.channel);
        self.max_length("spec.username", fields.username);
        match version {
            ApiVersion::V1beta1 => self.url("spec.address", fields.address),
            ApiVersion::V1beta3 => {
                self.max_length("spec.address", fields.address);
            }
        }
        self.duration("spec.timeout", fields.timeout, DurationFormat::Timeout);
        self.url("spec.proxy", fields.proxy);
        self.reference("spec.proxySecretRef", fields.proxy_secret_ref);
        self.reference("spec.secretRef", fields.secret_ref);
        self.reference("spec.certSecretRef", fields.cert_secret_ref);
    }

    /// Errors collected so far, warnings discarded
    pub(crate) fn into_errors(self) -> ValidationErrors {
        ValidationErrors::new(self.errors)
    }

    pub(crate) fn finish(self) -> Result<Vec<FieldWarning>, ValidationErrors> {
        for warning in &self.warnings {
            tracing::warn!(field = %warning.field, "{}", warning.message);
        }
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(ValidationErrors::new(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversize_value_skips_pattern_check() {
        let mut v = Validator::default();
        let value = format!("ftp://{}", "x".repeat(MAX_STRING_LENGTH));
        v.url("spec.proxy", Some(&value));

        let errors = v.finish().unwrap_err().into_inner();
        assert_eq!(errors.len(), 1, "only the length violation should be reported");
        assert!(matches!(errors[0], FieldError::FieldTooLong { .. }));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let mut v = Validator::default();
        let value = "é".repeat(MAX_STRING_LENGTH);
        assert!(v.max_length("spec.channel", Some(&value)));
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_url_pattern() {
        let mut v = Validator::default();
        v.url("spec.proxy", Some("http://proxy:8080"));
        v.url("spec.address", Some("https://example.com"));
        assert!(v.finish().is_ok());

        let mut v = Validator::default();
        v.url("spec.proxy", Some("ftp://x"));
        let errors = v.finish().unwrap_err().into_inner();
        assert_eq!(
            errors,
            vec![FieldError::PatternMismatch {
                field: "spec.proxy".to_string(),
                value: "ftp://x".to_string(),
                pattern: URL_PATTERN,
            }]
        );
    }

    #[test]
    fn test_absent_values_are_not_checked() {
        let mut v = Validator::default();
        v.url("spec.proxy", None);
        v.duration("spec.timeout", None, DurationFormat::Timeout);
        v.reference("spec.secretRef", None);
        assert_eq!(v.finish(), Ok(Vec::new()));
    }

    #[test]
    fn test_empty_reference_name_is_required() {
        let mut v = Validator::default();
        v.reference("spec.secretRef", Some(""));
        let errors = v.finish().unwrap_err();
        assert_eq!(errors.for_field("spec.secretRef.name").count(), 1);
    }

    #[test]
    fn test_fields_read_from_raw_document() {
        let spec = serde_json::json!({
            "type": "GitHub",
            "channel": "ops",
            "timeout": 30,
            "secretRef": { "name": "" },
            "certSecretRef": {},
            "proxySecretRef": null
        });
        let fields = SpecFields::from_value(&spec);
        assert_eq!(fields.channel, Some("ops"));
        assert_eq!(fields.timeout, None, "non-string values are left to typed decoding");
        assert_eq!(fields.secret_ref, Some(""));
        assert_eq!(fields.cert_secret_ref, Some(""));
        assert_eq!(fields.proxy_secret_ref, None);

        let mut v = Validator::default();
        v.spec_fields(&fields, ApiVersion::V1beta3);
        let errors = v.into_errors();
        assert_eq!(errors.for_field("spec.secretRef.name").count(), 1);
        assert_eq!(errors.for_field("spec.certSecretRef.name").count(), 1);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_address_pattern_depends_on_version() {
        let fields = SpecFields {
            address: Some("nats://nats:4222"),
            ..SpecFields::default()
        };

        let mut v = Validator::default();
        v.spec_fields(&fields, ApiVersion::V1beta3);
        assert!(v.into_errors().is_empty());

        let mut v = Validator::default();
        v.spec_fields(&fields, ApiVersion::V1beta1);
        assert_eq!(v.into_errors().for_field("spec.address").count(), 1);
    }

    #[test]
    fn test_warnings_do_not_fail_validation() {
        let mut v = Validator::default();
        v.warn("spec.proxy", "deprecated");
        let warnings = v.finish().unwrap();
        assert_eq!(warnings, vec![FieldWarning::new("spec.proxy", "deprecated")]);
    }
}
