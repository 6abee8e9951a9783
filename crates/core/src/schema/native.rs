//! Native schema layout exchanged with the storage engine.
//!
//! The engine describes a schema as two contiguous arrays: object records, each
//! naming a half-open range `[properties_start, properties_end)` into a shared
//! array of property records. This module keeps both arrays as owned arenas and
//! only ever reads a range through a bounds-checked slice.
//!
//! ```text
//! objects:    [ A: 0..2 ][ B: 2..2 ][ C: 2..3 ]
//! properties: [ A.x ][ A.y ][ C.z ]
//! ```

use super::model::Schema;
use super::object::{ObjectSchema, ObjectSchemaBuilder};
use super::property::Property;
use crate::error::{Error, Result};
use crate::types::PropertyType;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashSet;

/// One object record of the native layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeObject {
    /// Class name
    pub name: String,
    /// First property index (inclusive)
    pub properties_start: i32,
    /// Last property index (exclusive)
    pub properties_end: i32,
}

/// One property record of the native layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeProperty {
    /// Property name
    pub name: String,
    /// Raw [`PropertyType`] code
    pub type_code: i32,
    /// Link target class, if any
    pub object_type: Option<String>,
    /// Primary key flag
    pub is_primary: bool,
    /// Nullability flag
    pub is_nullable: bool,
    /// Index flag
    pub is_indexed: bool,
}

impl From<&Property> for NativeProperty {
    fn from(property: &Property) -> Self {
        Self {
            name: property.name().to_string(),
            type_code: property.property_type().code(),
            object_type: property.target().map(ToString::to_string),
            is_primary: property.is_primary_key(),
            is_nullable: property.is_nullable(),
            is_indexed: property.is_indexed(),
        }
    }
}

impl NativeProperty {
    /// Decodes this record into a property descriptor.
    pub fn to_property(&self) -> Result<Property> {
        let property_type = PropertyType::try_from(self.type_code)?;
        Ok(Property::new(self.name.clone(), property_type)
            .object_type(self.object_type.clone())
            .primary_key(self.is_primary)
            .nullable(self.is_nullable)
            .indexed(self.is_indexed))
    }
}

/// The flattened, array-of-structs schema layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NativeSchema {
    objects: Vec<NativeObject>,
    properties: Vec<NativeProperty>,
}

impl NativeSchema {
    /// Creates a native schema from raw arenas, e.g. as handed over by the engine.
    ///
    /// No validation happens here; [`decode`](Self::decode) checks every range.
    pub fn new(objects: Vec<NativeObject>, properties: Vec<NativeProperty>) -> Self {
        Self {
            objects,
            properties,
        }
    }

    /// Flattens a schema model.
    ///
    /// Classes are visited in the schema's order and their properties appended
    /// to the shared arena, so the same input always yields the same ranges.
    pub fn flatten(schema: &Schema) -> Result<Self> {
        let mut objects = Vec::with_capacity(schema.len());
        let mut properties: Vec<NativeProperty> = Vec::new();

        for object in schema {
            let start = arena_index(properties.len())?;
            properties.extend(object.iter().map(NativeProperty::from));
            let end = arena_index(properties.len())?;

            objects.push(NativeObject {
                name: object.name().to_string(),
                properties_start: start,
                properties_end: end,
            });
        }

        Ok(Self {
            objects,
            properties,
        })
    }

    /// Returns the object records.
    #[inline]
    pub fn objects(&self) -> &[NativeObject] {
        &self.objects
    }

    /// Returns the property records.
    #[inline]
    pub fn properties(&self) -> &[NativeProperty] {
        &self.properties
    }

    /// Returns the property records belonging to the object at `index`.
    pub fn object_properties(&self, index: usize) -> Result<&[NativeProperty]> {
        let object = self
            .objects
            .get(index)
            .ok_or_else(|| Error::malformed(format!("no object record at index {}", index)))?;
        self.range(object)
    }

    /// Returns true if the object ranges tile the property arena in order,
    /// with no gaps or overlaps. Layouts produced by [`flatten`](Self::flatten)
    /// always tile.
    pub fn is_tiled(&self) -> bool {
        let mut expected = 0i64;
        for object in &self.objects {
            if i64::from(object.properties_start) != expected
                || object.properties_end < object.properties_start
            {
                return false;
            }
            expected = i64::from(object.properties_end);
        }
        usize::try_from(expected).map_or(false, |end| end == self.properties.len())
    }

    /// Decodes the layout into a schema model.
    ///
    /// Every object range is bounds-checked and every type code validated; the
    /// first problem aborts the whole decode.
    pub fn decode(&self) -> Result<Schema> {
        let result = self.decode_objects();
        if let Err(err) = &result {
            tracing::warn!(error = %err, "failed to decode native schema");
        }
        result
    }

    fn decode_objects(&self) -> Result<Schema> {
        let mut names = HashSet::with_capacity(self.objects.len());
        let mut objects = Vec::with_capacity(self.objects.len());

        for record in &self.objects {
            if !names.insert(record.name.as_str()) {
                return Err(Error::malformed(format!(
                    "class {} appears more than once",
                    record.name
                )));
            }
            objects.push(self.decode_object(record)?);
        }

        Ok(Schema::from_unique(objects))
    }

    fn decode_object(&self, record: &NativeObject) -> Result<ObjectSchema> {
        let mut builder = ObjectSchemaBuilder::new(record.name.clone()).map_err(as_format)?;
        for property in self.range(record)? {
            builder.add(property.to_property()?).map_err(as_format)?;
        }
        builder.build().map_err(as_format)
    }

    fn range(&self, object: &NativeObject) -> Result<&[NativeProperty]> {
        let out_of_range = || Error::PropertyRange {
            class: object.name.clone(),
            start: i64::from(object.properties_start),
            end: i64::from(object.properties_end),
            len: self.properties.len(),
        };
        let start = usize::try_from(object.properties_start).map_err(|_| out_of_range())?;
        let end = usize::try_from(object.properties_end).map_err(|_| out_of_range())?;
        self.properties.get(start..end).ok_or_else(out_of_range)
    }
}

fn arena_index(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::malformed("property arena exceeds i32 range"))
}

/// Builder errors inside a decoded buffer are format problems, not caller mistakes.
fn as_format(err: Error) -> Error {
    match err {
        Error::MalformedSchema { .. } | Error::InvalidPropertyType { .. } => err,
        other => Error::malformed(other.to_string()),
    }
}
