//! Property type definitions for Tidemark.
//!
//! This module defines the kinds of values a stored property can hold, along
//! with the stable `i32` codes used by the native schema buffer.

use crate::error::{Error, Result};

/// Supported property types.
///
/// The discriminants are the wire codes exchanged with the storage engine and
/// must never be renumbered.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// 64-bit signed integer
    Int = 0,
    /// Boolean (true/false)
    Bool = 1,
    /// UTF-8 string
    String = 2,
    /// Opaque binary data
    Data = 4,
    /// Dynamically typed value
    Any = 6,
    /// Timestamp
    Date = 8,
    /// 32-bit floating point number
    Float = 9,
    /// 64-bit floating point number
    Double = 10,
    /// Link to a single object of `object_type`
    Object = 12,
    /// Ordered list of links to objects of `object_type`
    List = 13,
    /// Computed backlinks from objects of `object_type`
    LinkingObjects = 14,
}

impl PropertyType {
    /// All property types, in wire code order.
    pub const ALL: [PropertyType; 11] = [
        PropertyType::Int,
        PropertyType::Bool,
        PropertyType::String,
        PropertyType::Data,
        PropertyType::Any,
        PropertyType::Date,
        PropertyType::Float,
        PropertyType::Double,
        PropertyType::Object,
        PropertyType::List,
        PropertyType::LinkingObjects,
    ];

    /// Returns the wire code for this type.
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Returns whether this type refers to another class.
    #[inline]
    pub fn is_link(self) -> bool {
        matches!(
            self,
            PropertyType::Object | PropertyType::List | PropertyType::LinkingObjects
        )
    }

    /// Returns whether this type can back a search index.
    pub fn is_indexable(self) -> bool {
        matches!(
            self,
            PropertyType::Int | PropertyType::Bool | PropertyType::String | PropertyType::Date
        )
    }

    /// Returns whether properties of this type are nullable unless stated otherwise.
    pub fn is_nullable_by_default(self) -> bool {
        matches!(
            self,
            PropertyType::String | PropertyType::Data | PropertyType::Object
        )
    }
}

impl TryFrom<i32> for PropertyType {
    type Error = Error;

    fn try_from(code: i32) -> Result<Self> {
        PropertyType::ALL
            .iter()
            .copied()
            .find(|ty| ty.code() == code)
            .ok_or(Error::InvalidPropertyType { code })
    }
}

impl From<PropertyType> for i32 {
    fn from(ty: PropertyType) -> Self {
        ty.code()
    }
}
