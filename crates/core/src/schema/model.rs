//! The schema model: every class a database can store.

use super::object::ObjectSchema;
use crate::error::{Error, Result};
use alloc::string::String;
use alloc::vec::Vec;
use core::slice;
use hashbrown::HashMap;

/// An immutable, name-keyed set of object descriptors.
///
/// A `Schema` is built once (from a [`SchemaBuilder`](super::SchemaBuilder) or
/// by decoding a [`NativeSchema`](super::NativeSchema)) and only read afterwards.
/// Iteration yields classes in the order they were staged; that order is stable
/// for the lifetime of the instance but callers must not rely on it across rebuilds.
#[derive(Clone, Debug)]
pub struct Schema {
    /// Descriptors in staging order.
    objects: Vec<ObjectSchema>,
    /// Class name -> position in `objects`.
    by_name: HashMap<String, usize>,
}

impl Schema {
    /// Creates a schema from descriptors whose names are already known to be unique.
    pub(crate) fn from_unique(objects: Vec<ObjectSchema>) -> Self {
        let by_name = objects
            .iter()
            .enumerate()
            .map(|(i, o)| (String::from(o.name()), i))
            .collect();
        Self { objects, by_name }
    }

    /// Creates a schema from a set of class declarations.
    ///
    /// Equivalent to staging every class on a builder and building it.
    pub fn from_classes<I>(classes: I) -> Result<Self>
    where
        I: IntoIterator<Item = ObjectSchema>,
    {
        let mut builder = super::SchemaBuilder::new();
        for class in classes {
            builder.add(class)?;
        }
        builder.build()
    }

    /// Finds the definition of a class.
    ///
    /// Returns `Ok(None)` when the class is not part of this schema; an empty
    /// name is a usage error.
    pub fn find(&self, name: &str) -> Result<Option<&ObjectSchema>> {
        if name.is_empty() {
            return Err(Error::empty_class_name());
        }
        Ok(self.by_name.get(name).map(|&i| &self.objects[i]))
    }

    /// Returns true if a class with this name is part of the schema.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns the number of known classes.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the schema has no classes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterates over the object descriptors.
    pub fn iter(&self) -> slice::Iter<'_, ObjectSchema> {
        self.objects.iter()
    }

    /// Iterates over the class names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.name())
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.objects == other.objects
    }
}

impl Eq for Schema {}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a ObjectSchema;
    type IntoIter = slice::Iter<'a, ObjectSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
