//! Decoder for the native schema buffer.
//!
//! Every read goes through a bounds-checked slice; a buffer that is truncated,
//! carries an unknown type code, or points a string outside the string section
//! is rejected as a whole.

use super::{flags, BufferLayout, HEADER_SIZE, MAGIC, NO_STRING, VERSION};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::str;
use tidemark_core::schema::{NativeObject, NativeProperty, NativeSchema};
use tidemark_core::{Error, PropertyType, Result};

/// Parses the byte layout back into a [`NativeSchema`].
pub struct NativeSchemaDecoder<'a> {
    bytes: &'a [u8],
    layout: BufferLayout,
    strings: &'a [u8],
}

impl<'a> NativeSchemaDecoder<'a> {
    /// Decodes a buffer.
    pub fn decode(bytes: &'a [u8]) -> Result<NativeSchema> {
        let result = Self::parse(bytes).and_then(|decoder| decoder.read_all());
        if let Err(err) = &result {
            tracing::warn!(error = %err, len = bytes.len(), "rejected native schema buffer");
        }
        result
    }

    fn parse(bytes: &'a [u8]) -> Result<Self> {
        let header = bytes
            .get(..HEADER_SIZE)
            .ok_or_else(|| Error::malformed("buffer shorter than header"))?;
        if header[0..4] != MAGIC {
            return Err(Error::malformed("bad magic"));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(Error::malformed(format!("unsupported version {}", version)));
        }
        let header_flags = u16::from_le_bytes([header[6], header[7]]);
        if header_flags != 0 {
            return Err(Error::malformed(format!("unknown header flags {:#06x}", header_flags)));
        }

        let object_count = read_u32(bytes, 8)? as usize;
        let property_count = read_u32(bytes, 12)? as usize;
        let layout = BufferLayout::new(object_count, property_count)
            .ok_or_else(|| Error::malformed("record counts overflow"))?;
        let strings = bytes
            .get(layout.strings_offset..)
            .ok_or_else(|| Error::malformed("buffer truncated before string section"))?;

        Ok(Self {
            bytes,
            layout,
            strings,
        })
    }

    fn read_all(&self) -> Result<NativeSchema> {
        let objects = (0..self.layout.object_count)
            .map(|i| self.read_object(i))
            .collect::<Result<Vec<_>>>()?;
        let properties = (0..self.layout.property_count)
            .map(|i| self.read_property(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(NativeSchema::new(objects, properties))
    }

    fn read_object(&self, index: usize) -> Result<NativeObject> {
        let at = self.layout.object_offset(index);
        Ok(NativeObject {
            name: self.read_string(read_u32(self.bytes, at)?, read_u32(self.bytes, at + 4)?)?,
            properties_start: read_i32(self.bytes, at + 8)?,
            properties_end: read_i32(self.bytes, at + 12)?,
        })
    }

    fn read_property(&self, index: usize) -> Result<NativeProperty> {
        let at = self.layout.property_offset(index);
        let name = self.read_string(read_u32(self.bytes, at)?, read_u32(self.bytes, at + 4)?)?;
        let type_code = read_i32(self.bytes, at + 8)?;
        PropertyType::try_from(type_code)?;

        let target_offset = read_u32(self.bytes, at + 12)?;
        let object_type = if target_offset == NO_STRING {
            None
        } else {
            Some(self.read_string(target_offset, read_u32(self.bytes, at + 16)?)?)
        };

        let bits = *self
            .bytes
            .get(at + 20)
            .ok_or_else(|| Error::malformed("truncated property record"))?;
        if bits & !flags::ALL != 0 {
            return Err(Error::malformed(format!(
                "property {} has unknown flag bits {:#04x}",
                name, bits
            )));
        }

        Ok(NativeProperty {
            name,
            type_code,
            object_type,
            is_primary: bits & flags::PRIMARY != 0,
            is_nullable: bits & flags::NULLABLE != 0,
            is_indexed: bits & flags::INDEXED != 0,
        })
    }

    fn read_string(&self, offset: u32, len: u32) -> Result<String> {
        let start = offset as usize;
        let end = start
            .checked_add(len as usize)
            .ok_or_else(|| Error::malformed("string slice overflows"))?;
        let raw = self.strings.get(start..end).ok_or_else(|| {
            Error::malformed(format!(
                "string at {}..{} outside string section of {} bytes",
                start,
                end,
                self.strings.len()
            ))
        })?;
        str::from_utf8(raw)
            .map(ToString::to_string)
            .map_err(|_| Error::malformed("string is not valid UTF-8"))
    }
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
    read_4(bytes, at).map(u32::from_le_bytes)
}

fn read_i32(bytes: &[u8], at: usize) -> Result<i32> {
    read_4(bytes, at).map(i32::from_le_bytes)
}

fn read_4(bytes: &[u8], at: usize) -> Result<[u8; 4]> {
    bytes
        .get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| Error::malformed(format!("truncated record at offset {}", at)))
}
