//! DTO error types
//!
//! Error kinds:
//! - LOGIC: the object definition itself is broken (missing or malformed rules)
//! - INVALID_DATA: supplied values failed validation, always with field reasons
//! - UNDEFINED_PROPERTY: read or write of a property the object does not know
//! - IMMUTABLE_WRITE: a write outside the write-once path

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// Broad grouping of a [`DtoError`].
///
/// Callers can fix `InvalidData` by changing input. `Logic` means the
/// definition's author has to fix something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Logic,
    InvalidData,
    UndefinedProperty,
    ImmutableWrite,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Logic => write!(f, "LOGIC"),
            ErrorKind::InvalidData => write!(f, "INVALID_DATA"),
            ErrorKind::UndefinedProperty => write!(f, "UNDEFINED_PROPERTY"),
            ErrorKind::ImmutableWrite => write!(f, "IMMUTABLE_WRITE"),
        }
    }
}

/// Ordered field -> human readable reason map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReasons(IndexMap<String, String>);

impl ValidationReasons {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reason. The first reason recorded for a field wins.
    pub fn insert(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| reason.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Stable list of `(field, reason)` pairs.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Appends every reason of `other`, keeping existing entries.
    pub fn extend(&mut self, other: ValidationReasons) {
        for (field, reason) in other.0 {
            self.insert(field, reason);
        }
    }

    /// Merges a child's reasons under `prefix`, e.g. `myDTO.name`.
    pub fn nest(&mut self, prefix: &str, child: ValidationReasons) {
        for (field, reason) in child.0 {
            self.insert(format!("{}.{}", prefix, field), reason);
        }
    }

    /// "There was 1 validation error." / "There were N validation errors."
    pub fn summary(&self) -> String {
        match self.len() {
            1 => "There was 1 validation error.".to_string(),
            n => format!("There were {} validation errors.", n),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ValidationReasons {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut reasons = ValidationReasons::new();
        for (k, v) in iter {
            reasons.insert(k, v);
        }
        reasons
    }
}

/// Errors raised while defining, building, reading, writing or restoring DTOs.
#[derive(Debug, Clone, Error)]
pub enum DtoError {
    /// The object definition is unusable.
    #[error("{0}")]
    Logic(String),

    /// One or more values failed validation.
    #[error("{message}")]
    InvalidData {
        message: String,
        reasons: ValidationReasons,
    },

    #[error("Undefined property: {class}::${property}.")]
    UndefinedProperty { class: String, property: String },

    #[error("DTOs are immutable. Create a new one to set a new value.")]
    ImmutableWrite,

    #[error("Unknown DTO class: {0}")]
    UnknownClass(String),

    #[error("DTO class '{0}' is already registered")]
    DuplicateClass(String),

    #[error("Malformed definition file '{path}': {reason}")]
    MalformedDefinition { path: String, reason: String },

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

impl DtoError {
    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic(message.into())
    }

    /// Aggregated validation failure; the message states the count.
    pub fn invalid(reasons: ValidationReasons) -> Self {
        Self::InvalidData {
            message: reasons.summary(),
            reasons,
        }
    }

    /// Validation failure with a message of its own.
    pub fn invalid_with_message(message: impl Into<String>, reasons: ValidationReasons) -> Self {
        Self::InvalidData {
            message: message.into(),
            reasons,
        }
    }

    pub fn undefined_property(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UndefinedProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    pub fn malformed_definition(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDefinition {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DtoError::InvalidData { .. } | DtoError::MalformedSnapshot(_) => ErrorKind::InvalidData,
            DtoError::UndefinedProperty { .. } => ErrorKind::UndefinedProperty,
            DtoError::ImmutableWrite => ErrorKind::ImmutableWrite,
            DtoError::Logic(_)
            | DtoError::UnknownClass(_)
            | DtoError::DuplicateClass(_)
            | DtoError::MalformedDefinition { .. } => ErrorKind::Logic,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DtoError::Logic(_) => "DTO_LOGIC_ERROR",
            DtoError::InvalidData { .. } => "DTO_INVALID_DATA",
            DtoError::UndefinedProperty { .. } => "DTO_UNDEFINED_PROPERTY",
            DtoError::ImmutableWrite => "DTO_IMMUTABLE_WRITE",
            DtoError::UnknownClass(_) => "DTO_UNKNOWN_CLASS",
            DtoError::DuplicateClass(_) => "DTO_DUPLICATE_CLASS",
            DtoError::MalformedDefinition { .. } => "DTO_MALFORMED_DEFINITION",
            DtoError::MalformedSnapshot(_) => "DTO_MALFORMED_SNAPSHOT",
        }
    }

    /// Field reasons, if this is a validation failure.
    pub fn reasons(&self) -> Option<&ValidationReasons> {
        match self {
            DtoError::InvalidData { reasons, .. } => Some(reasons),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DtoError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedSnapshot(e.to_string())
    }
}

/// Result type for DTO operations
pub type DtoResult<T> = Result<T, DtoError>;
