//! Object descriptor for Tidemark schemas.

use super::property::Property;
use crate::error::{Error, Result};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::slice;

/// A stored class: a name plus its properties in declaration order.
///
/// Declaration order is the on-disk column order and is preserved through
/// flattening and decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSchema {
    /// Class name.
    name: String,
    /// Properties in declaration order.
    properties: Vec<Property>,
}

impl ObjectSchema {
    /// Returns the class name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the properties in declaration order.
    #[inline]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Returns the number of properties.
    #[inline]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if the class has no properties.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterates over the properties in declaration order.
    pub fn iter(&self) -> slice::Iter<'_, Property> {
        self.properties.iter()
    }

    /// Gets a property by name.
    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Returns the primary key property if one is declared.
    pub fn primary_key(&self) -> Option<&Property> {
        self.properties.iter().find(|p| p.is_primary_key())
    }
}

impl<'a> IntoIterator for &'a ObjectSchema {
    type Item = &'a Property;
    type IntoIter = slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builder for creating object descriptors.
#[derive(Debug)]
pub struct ObjectSchemaBuilder {
    name: String,
    properties: Vec<Property>,
}

impl ObjectSchemaBuilder {
    /// Creates a new object builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::empty_class_name());
        }
        Ok(Self {
            name,
            properties: Vec::new(),
        })
    }

    /// Appends a property.
    pub fn add(&mut self, property: Property) -> Result<&mut Self> {
        if property.name().is_empty() {
            return Err(Error::empty_property_name());
        }
        if self.properties.iter().any(|p| p.name() == property.name()) {
            return Err(Error::duplicate_property(&self.name, property.name()));
        }
        if property.is_indexed() && !property.property_type().is_indexable() {
            return Err(Error::UnindexableProperty {
                class: self.name.clone(),
                property: property.name().to_string(),
                property_type: property.property_type(),
            });
        }
        self.properties.push(property);
        Ok(self)
    }

    /// Appends a property, consuming and returning the builder.
    pub fn property(mut self, property: Property) -> Result<Self> {
        self.add(property)?;
        Ok(self)
    }

    /// Builds the object descriptor.
    pub fn build(self) -> Result<ObjectSchema> {
        let mut primary_keys = self.properties.iter().filter(|p| p.is_primary_key());
        if let (Some(first), Some(second)) = (primary_keys.next(), primary_keys.next()) {
            return Err(Error::MultiplePrimaryKeys {
                class: self.name.clone(),
                first: first.name().to_string(),
                second: second.name().to_string(),
            });
        }

        Ok(ObjectSchema {
            name: self.name,
            properties: self.properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PropertyType;

    fn person() -> ObjectSchema {
        ObjectSchemaBuilder::new("Person")
            .unwrap()
            .property(Property::new("id", PropertyType::Int).primary_key(true))
            .unwrap()
            .property(Property::new("name", PropertyType::String))
            .unwrap()
            .property(Property::link("dogs", PropertyType::List, "Dog"))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_object_builder() {
        let object = person();
        assert_eq!(object.name(), "Person");
        assert_eq!(object.len(), 3);
        assert_eq!(object.primary_key().map(|p| p.name()), Some("id"));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let object = person();
        let names: Vec<&str> = object.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["id", "name", "dogs"]);
    }

    #[test]
    fn test_find_property() {
        let object = person();
        assert!(object.find_property("name").is_some());
        assert!(object.find_property("unknown").is_none());
    }

    #[test]
    fn test_empty_class_name() {
        assert_eq!(
            ObjectSchemaBuilder::new("").err(),
            Some(Error::empty_class_name())
        );
    }

    #[test]
    fn test_duplicate_property() {
        let result = ObjectSchemaBuilder::new("Dog")
            .unwrap()
            .property(Property::new("name", PropertyType::String))
            .unwrap()
            .property(Property::new("name", PropertyType::Int));

        assert_eq!(result.err(), Some(Error::duplicate_property("Dog", "name")));
    }

    #[test]
    fn test_empty_property_name() {
        let mut builder = ObjectSchemaBuilder::new("Dog").unwrap();
        let result = builder.add(Property::new("", PropertyType::Int));
        assert_eq!(result.err(), Some(Error::empty_property_name()));
    }

    #[test]
    fn test_multiple_primary_keys() {
        let result = ObjectSchemaBuilder::new("Dog")
            .unwrap()
            .property(Property::new("a", PropertyType::Int).primary_key(true))
            .unwrap()
            .property(Property::new("b", PropertyType::String).primary_key(true))
            .unwrap()
            .build();

        assert!(matches!(
            result,
            Err(Error::MultiplePrimaryKeys { ref first, ref second, .. })
                if first == "a" && second == "b"
        ));
    }

    #[test]
    fn test_indexed_property_types() {
        let mut builder = ObjectSchemaBuilder::new("Dog").unwrap();
        builder
            .add(Property::new("name", PropertyType::String).indexed(true))
            .unwrap()
            .add(Property::new("born", PropertyType::Date).indexed(true))
            .unwrap()
            .add(Property::new("weight", PropertyType::Double))
            .unwrap();

        let result = builder.add(Property::new("photo", PropertyType::Data).indexed(true));
        assert!(matches!(
            result,
            Err(Error::UnindexableProperty { ref property, property_type: PropertyType::Data, .. })
                if property == "photo"
        ));

        let err = ObjectSchemaBuilder::new("Dog")
            .unwrap()
            .property(Property::link("owner", PropertyType::Object, "Person").indexed(true))
            .unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Usage);
    }

    #[test]
    fn test_class_without_properties() {
        let object = ObjectSchemaBuilder::new("Marker").unwrap().build().unwrap();
        assert!(object.is_empty());
        assert!(object.primary_key().is_none());
    }
}
