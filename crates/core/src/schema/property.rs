//! Property descriptor for Tidemark schemas.

use crate::types::PropertyType;
use alloc::string::String;

/// One stored property of a class.
///
/// Properties are plain values: once placed in an [`ObjectSchema`](super::ObjectSchema)
/// they are never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// Property name, unique within its class.
    name: String,
    /// Stored type.
    property_type: PropertyType,
    /// Target class name for link types.
    object_type: Option<String>,
    /// Whether this property is the class's primary key.
    is_primary_key: bool,
    /// Whether this property allows null values.
    is_nullable: bool,
    /// Whether this property is indexed.
    is_indexed: bool,
}

impl Property {
    /// Creates a new property descriptor.
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            object_type: None,
            is_primary_key: false,
            is_nullable: property_type.is_nullable_by_default(),
            is_indexed: false,
        }
    }

    /// Creates a link property targeting `target`.
    pub fn link(
        name: impl Into<String>,
        property_type: PropertyType,
        target: impl Into<String>,
    ) -> Self {
        Self::new(name, property_type).object_type(Some(target.into()))
    }

    /// Sets the link target class.
    pub fn object_type(mut self, object_type: Option<String>) -> Self {
        self.object_type = object_type;
        self
    }

    /// Sets whether this property is the primary key.
    pub fn primary_key(mut self, value: bool) -> Self {
        self.is_primary_key = value;
        self
    }

    /// Sets whether this property is nullable.
    pub fn nullable(mut self, value: bool) -> Self {
        self.is_nullable = value;
        self
    }

    /// Sets whether this property is indexed.
    pub fn indexed(mut self, value: bool) -> Self {
        self.is_indexed = value;
        self
    }

    /// Returns the property name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stored type.
    #[inline]
    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// Returns the link target class, if any.
    #[inline]
    pub fn target(&self) -> Option<&str> {
        self.object_type.as_deref()
    }

    /// Returns whether this property is the primary key.
    #[inline]
    pub fn is_primary_key(&self) -> bool {
        self.is_primary_key
    }

    /// Returns whether this property is nullable.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    /// Returns whether this property is indexed.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.is_indexed
    }
}
