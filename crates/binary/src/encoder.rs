//! Encoder for the native schema buffer.

use super::{flags, BufferLayout, HEADER_SIZE, MAGIC, NO_STRING, VERSION};
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use tidemark_core::schema::{NativeProperty, NativeSchema};
use tidemark_core::{Error, Result};

/// Serializes a [`NativeSchema`] into its byte layout.
pub struct NativeSchemaEncoder {
    layout: BufferLayout,
    /// Header plus fixed-size records
    buffer: Vec<u8>,
    /// String section
    strings: Vec<u8>,
    /// Interned strings -> (offset, len) in the string section
    interned: HashMap<String, (u32, u32)>,
}

impl NativeSchemaEncoder {
    /// Encodes a native schema.
    pub fn encode(native: &NativeSchema) -> Result<Vec<u8>> {
        let layout = BufferLayout::new(native.objects().len(), native.properties().len())
            .ok_or_else(|| Error::malformed("schema too large to encode"))?;

        let mut encoder = Self {
            layout,
            buffer: Vec::with_capacity(layout.fixed_size()),
            strings: Vec::new(),
            interned: HashMap::new(),
        };
        encoder.write_header()?;
        for object in native.objects() {
            let (offset, len) = encoder.intern(&object.name)?;
            encoder.write_u32(offset);
            encoder.write_u32(len);
            encoder.write_i32(object.properties_start);
            encoder.write_i32(object.properties_end);
        }
        for property in native.properties() {
            encoder.write_property(property)?;
        }

        debug_assert_eq!(encoder.buffer.len(), encoder.layout.fixed_size());
        let mut bytes = encoder.buffer;
        bytes.extend_from_slice(&encoder.strings);
        Ok(bytes)
    }

    fn write_header(&mut self) -> Result<()> {
        let object_count = to_u32(self.layout.object_count)?;
        let property_count = to_u32(self.layout.property_count)?;

        self.buffer.extend_from_slice(&MAGIC);
        self.buffer.extend_from_slice(&VERSION.to_le_bytes());
        self.buffer.extend_from_slice(&0u16.to_le_bytes());
        self.write_u32(object_count);
        self.write_u32(property_count);
        debug_assert_eq!(self.buffer.len(), HEADER_SIZE);
        Ok(())
    }

    fn write_property(&mut self, property: &NativeProperty) -> Result<()> {
        let (name_offset, name_len) = self.intern(&property.name)?;
        let (target_offset, target_len) = match &property.object_type {
            Some(target) => self.intern(target)?,
            None => (NO_STRING, 0),
        };

        let mut bits = 0u8;
        if property.is_primary {
            bits |= flags::PRIMARY;
        }
        if property.is_nullable {
            bits |= flags::NULLABLE;
        }
        if property.is_indexed {
            bits |= flags::INDEXED;
        }

        self.write_u32(name_offset);
        self.write_u32(name_len);
        self.write_i32(property.type_code);
        self.write_u32(target_offset);
        self.write_u32(target_len);
        self.buffer.extend_from_slice(&[bits, 0, 0, 0]);
        Ok(())
    }

    /// Returns the (offset, len) of `s` in the string section, appending it once.
    fn intern(&mut self, s: &str) -> Result<(u32, u32)> {
        if let Some(&slot) = self.interned.get(s) {
            return Ok(slot);
        }
        let slot = (to_u32(self.strings.len())?, to_u32(s.len())?);
        if slot.0 == NO_STRING {
            return Err(Error::malformed("string section too large to encode"));
        }
        self.strings.extend_from_slice(s.as_bytes());
        self.interned.insert(s.into(), slot);
        Ok(slot)
    }

    #[inline]
    fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::malformed("schema too large to encode"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OBJECT_RECORD_SIZE, PROPERTY_RECORD_SIZE};
    use alloc::vec;
    use tidemark_core::schema::NativeObject;

    fn sample() -> NativeSchema {
        NativeSchema::new(
            vec![NativeObject {
                name: "Dog".into(),
                properties_start: 0,
                properties_end: 2,
            }],
            vec![
                NativeProperty {
                    name: "name".into(),
                    type_code: 2,
                    object_type: None,
                    is_primary: true,
                    is_nullable: false,
                    is_indexed: true,
                },
                NativeProperty {
                    name: "friend".into(),
                    type_code: 12,
                    object_type: Some("Dog".into()),
                    is_primary: false,
                    is_nullable: true,
                    is_indexed: false,
                },
            ],
        )
    }

    #[test]
    fn test_header() {
        let bytes = NativeSchemaEncoder::encode(&sample()).unwrap();
        assert_eq!(&bytes[0..4], b"TDMK");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), VERSION);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 2);
    }

    #[test]
    fn test_strings_are_interned() {
        let bytes = NativeSchemaEncoder::encode(&sample()).unwrap();
        let fixed = HEADER_SIZE + OBJECT_RECORD_SIZE + 2 * PROPERTY_RECORD_SIZE;
        // "Dog" is shared by the object name and the link target.
        assert_eq!(&bytes[fixed..], b"Dognamefriend");
    }

    #[test]
    fn test_property_flags() {
        let bytes = NativeSchemaEncoder::encode(&sample()).unwrap();
        let first = HEADER_SIZE + OBJECT_RECORD_SIZE;
        assert_eq!(bytes[first + 20], flags::PRIMARY | flags::INDEXED);
        assert_eq!(bytes[first + PROPERTY_RECORD_SIZE + 20], flags::NULLABLE);
    }

    #[test]
    fn test_absent_target() {
        let bytes = NativeSchemaEncoder::encode(&sample()).unwrap();
        let first = HEADER_SIZE + OBJECT_RECORD_SIZE;
        let offset = u32::from_le_bytes(bytes[first + 12..first + 16].try_into().unwrap());
        assert_eq!(offset, NO_STRING);
    }

    #[test]
    fn test_encode_empty() {
        let bytes = NativeSchemaEncoder::encode(&NativeSchema::default()).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
    }
}
