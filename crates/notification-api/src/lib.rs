//! Notification Provider API
//!
//! Versioned Kubernetes Custom Resource Definitions for the notification
//! `Provider` resource: the kind registry, the v1beta1 and v1beta3 resource
//! shapes, field and cross-field validation, conversion between versions
//! and one-shot scheme registration.
//!
//! The crate is passive. It validates shape and exposes read-side helpers;
//! resolving secret references and dispatching events belong to the
//! controller that consumes these types.

pub mod condition;
pub mod conversion;
pub mod decode;
pub mod duration;
pub mod error;
pub mod kind;
pub mod references;
pub mod scheme;
pub mod v1beta1;
pub mod v1beta3;

mod validation;

pub use condition::{Condition, ConditionStatus, READY_CONDITION};
pub use conversion::{ConversionPolicy, Converted, STATUS_ANNOTATION, downgrade, upgrade};
pub use decode::{DecodeMode, VersionedProvider, decode, decode_any, decode_spec};
pub use duration::{DurationFormat, parse_duration};
pub use error::{Error, FieldError, FieldWarning, Result, ValidationErrors};
pub use kind::{ApiVersion, GROUP, PROVIDER_KIND, all_kinds, is_valid_kind};
pub use references::LocalObjectReference;
pub use validation::{INTERVAL_PATTERN, MAX_STRING_LENGTH, TIMEOUT_PATTERN, URL_PATTERN};
