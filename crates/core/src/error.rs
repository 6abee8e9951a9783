//! Error types for Tidemark.

use crate::types::PropertyType;
use alloc::string::String;
use thiserror::Error;

/// Result type alias for Tidemark operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid arguments to a lookup or builder. Reported to the caller.
    Usage,
    /// A native schema buffer holds a value outside its declared domain.
    Format,
    /// An upstream producer broke its contract (e.g. a diff index out of range).
    InternalConsistency,
}

/// Error types for Tidemark operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A class or property name was empty.
    #[error("{what} name must be a non-empty string")]
    EmptyName { what: &'static str },
    /// A class with the same name was already staged.
    #[error("duplicate class name: {name}")]
    DuplicateClass { name: String },
    /// A property with the same name already exists on the class.
    #[error("duplicate property {property} on class {class}")]
    DuplicateProperty { class: String, property: String },
    /// More than one property of a class is flagged as primary key.
    #[error("class {class} declares more than one primary key ({first}, {second})")]
    MultiplePrimaryKeys {
        class: String,
        first: String,
        second: String,
    },
    /// An indexed property has a type that cannot back a search index.
    #[error("property {property} on class {class} has type {property_type:?}, which cannot be indexed")]
    UnindexableProperty {
        class: String,
        property: String,
        property_type: PropertyType,
    },
    /// A schema was built with no classes.
    #[error("no storable classes were registered; a database cannot open with an empty schema")]
    EmptySchema,
    /// A property type code is outside the known enum.
    #[error("invalid property type code {code}")]
    InvalidPropertyType { code: i32 },
    /// An object's property range does not fit the property array.
    #[error("class {class} has property range [{start}, {end}) outside 0..{len}")]
    PropertyRange {
        class: String,
        start: i64,
        end: i64,
        len: usize,
    },
    /// Any other structural problem in a native schema buffer.
    #[error("malformed schema buffer: {message}")]
    MalformedSchema { message: String },
    /// A diff index lies outside its index space.
    #[error("{set} index {index} is out of range for a collection of length {len}")]
    IndexOutOfRange {
        set: &'static str,
        index: usize,
        len: usize,
    },
    /// The sizes of a diff do not add up.
    #[error("inconsistent diff: {message}")]
    InconsistentDiff { message: String },
}

impl Error {
    /// Creates an empty class name error.
    pub fn empty_class_name() -> Self {
        Error::EmptyName { what: "object schema" }
    }

    /// Creates an empty property name error.
    pub fn empty_property_name() -> Self {
        Error::EmptyName { what: "property" }
    }

    /// Creates a duplicate class error.
    pub fn duplicate_class(name: impl Into<String>) -> Self {
        Error::DuplicateClass { name: name.into() }
    }

    /// Creates a duplicate property error.
    pub fn duplicate_property(class: impl Into<String>, property: impl Into<String>) -> Self {
        Error::DuplicateProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    /// Creates a malformed schema error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedSchema {
            message: message.into(),
        }
    }

    /// Creates an inconsistent diff error.
    pub fn inconsistent_diff(message: impl Into<String>) -> Self {
        Error::InconsistentDiff {
            message: message.into(),
        }
    }

    /// Returns which part of the error taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::EmptyName { .. }
            | Error::DuplicateClass { .. }
            | Error::DuplicateProperty { .. }
            | Error::MultiplePrimaryKeys { .. }
            | Error::UnindexableProperty { .. }
            | Error::EmptySchema => ErrorCategory::Usage,
            Error::InvalidPropertyType { .. }
            | Error::PropertyRange { .. }
            | Error::MalformedSchema { .. } => ErrorCategory::Format,
            Error::IndexOutOfRange { .. } | Error::InconsistentDiff { .. } => {
                ErrorCategory::InternalConsistency
            }
        }
    }
}
