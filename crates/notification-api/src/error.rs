//! Error types for Provider validation, conversion and registration.

use std::fmt;

use thiserror::Error;

use crate::kind::ApiVersion;

/// A single violated constraint, addressed by its field path
/// (e.g. `spec.channel`)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// `type` is missing or not a member of the version's kind set
    #[error("{field}: {}", describe_kind(.value.as_deref(), .version))]
    InvalidKind {
        /// Field path
        field: String,
        /// Rejected value, `None` when the field is absent
        value: Option<String>,
        /// Version whose kind set was consulted
        version: ApiVersion,
    },

    /// Duration literal does not match its pattern, overflows or is not positive
    #[error("{field}: invalid duration {reason}")]
    MalformedDuration {
        /// Field path
        field: String,
        /// Rejected literal
        value: String,
        /// Human readable cause
        reason: String,
    },

    /// Bounded string exceeds its cap
    #[error("{field}: must be no more than {max} characters, got {actual}")]
    FieldTooLong {
        /// Field path
        field: String,
        /// Cap in characters
        max: usize,
        /// Actual length in characters
        actual: usize,
    },

    /// String does not match its pattern
    #[error("{field}: '{value}' does not match pattern {pattern}")]
    PatternMismatch {
        /// Field path
        field: String,
        /// Rejected value
        value: String,
        /// Expected pattern
        pattern: &'static str,
    },

    /// Required value is empty
    #[error("{field}: must not be empty")]
    Required {
        /// Field path
        field: String,
    },

    /// Constraint spanning several fields
    #[error("{field}: {message}")]
    CrossFieldViolation {
        /// Field path the violation is reported against
        field: String,
        /// Human readable cause
        message: String,
    },
}

fn describe_kind(value: Option<&str>, version: &ApiVersion) -> String {
    match value {
        Some(value) => format!("unsupported provider type '{value}' for {version}"),
        None => "provider type is required".to_string(),
    }
}

impl FieldError {
    /// Field path the error is reported against
    pub fn field(&self) -> &str {
        match self {
            FieldError::InvalidKind { field, .. }
            | FieldError::MalformedDuration { field, .. }
            | FieldError::FieldTooLong { field, .. }
            | FieldError::PatternMismatch { field, .. }
            | FieldError::Required { field }
            | FieldError::CrossFieldViolation { field, .. } => field,
        }
    }
}

/// Every constraint violated by one object
///
/// Validation does not stop at the first failure, so authoring tools can
/// show all problems at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Wrap a list of field errors
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    /// Whether no constraint was violated
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of violated constraints
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Violated constraints in reporting order
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Violations reported against `field`
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.0.iter().filter(move |e| e.field() == field)
    }

    /// Consume into the underlying list
    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Non-fatal finding: the object is accepted but uses a deprecated or
/// ignored field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWarning {
    /// Field path
    pub field: String,
    /// Human readable explanation
    pub message: String,
}

impl FieldWarning {
    /// Create a warning for `field`
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors returned by the notification API crate
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Object violates one or more schema constraints
    #[error("validation failed:\n{0}")]
    Validation(#[from] ValidationErrors),

    /// Converting between versions would drop data
    #[error("conversion from {from} to {to} would lose {}", .lost.join(", "))]
    ConversionLoss {
        /// Source version
        from: ApiVersion,
        /// Target version
        to: ApiVersion,
        /// Paths of the values that cannot be represented
        lost: Vec<String>,
    },

    /// A group/version/kind was registered twice with different types
    #[error("scheme registration conflict for {gvk}: {message}")]
    RegistrationConflict {
        /// Conflicting `group/version, Kind=kind`
        gvk: String,
        /// Human readable cause
        message: String,
    },

    /// Strict decode found fields the schema does not define
    #[error("unknown fields: {}", .paths.join(", "))]
    UnknownFields {
        /// Paths of the unknown fields
        paths: Vec<String>,
    },

    /// `apiVersion` is not served by this crate
    #[error("unsupported apiVersion '{0}'")]
    UnsupportedVersion(String),

    /// Document could not be decoded or encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Per-version CRDs could not be merged
    #[error("CRD merge failed: {0}")]
    CrdMerge(#[from] kube::core::crd::MergeError),
}

/// Result alias using the crate [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;
