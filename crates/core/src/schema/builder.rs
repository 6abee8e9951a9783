//! Schema builder: stages object descriptors and produces a [`Schema`].

use super::model::Schema;
use super::native::NativeSchema;
use super::object::ObjectSchema;
use crate::error::{Error, Result};
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashSet;

/// Accumulates object descriptors before building a [`Schema`].
///
/// Classes are kept in the order they were added; that order decides the
/// layout of the flattened [`NativeSchema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    objects: Vec<ObjectSchema>,
    names: HashSet<String>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a class.
    pub fn add(&mut self, object: ObjectSchema) -> Result<&mut Self> {
        if self.names.contains(object.name()) {
            return Err(Error::duplicate_class(object.name()));
        }
        self.names.insert(object.name().into());
        self.objects.push(object);
        Ok(self)
    }

    /// Stages a class, consuming and returning the builder.
    pub fn class(mut self, object: ObjectSchema) -> Result<Self> {
        self.add(object)?;
        Ok(self)
    }

    /// Returns the number of staged classes.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if nothing has been staged.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Builds the schema model.
    pub fn build(self) -> Result<Schema> {
        if self.objects.is_empty() {
            return Err(Error::EmptySchema);
        }
        Ok(Schema::from_unique(self.objects))
    }

    /// Builds the schema model together with its flattened native layout.
    ///
    /// The layout is what the storage engine receives when opening or
    /// migrating a database.
    pub fn build_native(self) -> Result<(Schema, NativeSchema)> {
        let schema = self.build()?;
        let native = NativeSchema::flatten(&schema)?;
        Ok((schema, native))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ObjectSchemaBuilder, Property};
    use crate::types::PropertyType;

    fn class(name: &str, props: &[(&str, PropertyType)]) -> ObjectSchema {
        let mut builder = ObjectSchemaBuilder::new(name).unwrap();
        for (prop, ty) in props {
            builder.add(Property::new(*prop, *ty)).unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_build() {
        let person = class("Person", &[("name", PropertyType::String)]);
        let schema = SchemaBuilder::new()
            .class(person.clone())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(schema.find("Person").unwrap(), Some(&person));
    }

    #[test]
    fn test_build_empty() {
        assert_eq!(SchemaBuilder::new().build().err(), Some(Error::EmptySchema));
    }

    #[test]
    fn test_add_duplicate() {
        let mut builder = SchemaBuilder::new();
        builder.add(class("Person", &[])).unwrap();
        let result = builder.add(class("Person", &[("age", PropertyType::Int)]));

        assert_eq!(result.err(), Some(Error::duplicate_class("Person")));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_build_native_tiles_properties() {
        let (schema, native) = SchemaBuilder::new()
            .class(class("A", &[("x", PropertyType::Int), ("y", PropertyType::Int)]))
            .unwrap()
            .class(class("B", &[]))
            .unwrap()
            .class(class("C", &[("z", PropertyType::Double)]))
            .unwrap()
            .build_native()
            .unwrap();

        assert_eq!(schema.len(), 3);
        let ranges: Vec<(i32, i32)> = native
            .objects()
            .iter()
            .map(|o| (o.properties_start, o.properties_end))
            .collect();
        assert_eq!(ranges, [(0, 2), (2, 2), (2, 3)]);
        assert!(native.is_tiled());
    }

    #[test]
    fn test_build_native_empty() {
        assert_eq!(
            SchemaBuilder::new().build_native().err(),
            Some(Error::EmptySchema)
        );
    }
}
