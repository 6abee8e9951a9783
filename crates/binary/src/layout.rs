//! Buffer layout for the native schema codec.
//!
//! Pre-computes section offsets and sizes so the encoder can allocate once and
//! the decoder can reject truncated buffers before touching any record.

use super::{HEADER_SIZE, OBJECT_RECORD_SIZE, PROPERTY_RECORD_SIZE};

/// Section offsets of an encoded native schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLayout {
    /// Number of object records
    pub object_count: usize,
    /// Number of property records
    pub property_count: usize,
    /// Offset of the first object record
    pub objects_offset: usize,
    /// Offset of the first property record
    pub properties_offset: usize,
    /// Offset of the string section
    pub strings_offset: usize,
}

impl BufferLayout {
    /// Computes the layout for the given record counts.
    ///
    /// Returns `None` if the fixed sections would not fit in `usize`.
    pub fn new(object_count: usize, property_count: usize) -> Option<Self> {
        let objects_offset = HEADER_SIZE;
        let properties_offset =
            objects_offset.checked_add(object_count.checked_mul(OBJECT_RECORD_SIZE)?)?;
        let strings_offset =
            properties_offset.checked_add(property_count.checked_mul(PROPERTY_RECORD_SIZE)?)?;

        Some(Self {
            object_count,
            property_count,
            objects_offset,
            properties_offset,
            strings_offset,
        })
    }

    /// Offset of the object record at `index`.
    #[inline]
    pub fn object_offset(&self, index: usize) -> usize {
        self.objects_offset + index * OBJECT_RECORD_SIZE
    }

    /// Offset of the property record at `index`.
    #[inline]
    pub fn property_offset(&self, index: usize) -> usize {
        self.properties_offset + index * PROPERTY_RECORD_SIZE
    }

    /// Size of the header plus both record sections.
    #[inline]
    pub fn fixed_size(&self) -> usize {
        self.strings_offset
    }
}
