//! Binary codec for the native schema buffer.
//!
//! Serializes a [`NativeSchema`] into the flat byte layout exchanged with the
//! storage engine when a database is opened or migrated, and parses such
//! buffers back with full bounds checking.
//!
//! ## Binary Format (little-endian)
//!
//! ```text
//! Header: 16 bytes
//! +-------+---------+-------+--------------+----------------+
//! | magic | version | flags | object_count | property_count |
//! | [u8;4]| u16     | u16   | u32          | u32            |
//! +-------+---------+-------+--------------+----------------+
//!
//! Object records (16 bytes each):
//! [name_offset: u32][name_len: u32][properties_start: i32][properties_end: i32]
//!
//! Property records (24 bytes each):
//! [name_offset: u32][name_len: u32][type: i32]
//! [object_type_offset: u32][object_type_len: u32][flags: u8][pad: 3]
//!
//! String Section:
//! [UTF-8 bytes of every name, offsets relative to the section start]
//! ```
//!
//! `object_type_offset == NO_STRING` encodes a property without a link target.

#![no_std]

extern crate alloc;

mod decoder;
mod encoder;
mod layout;
mod layout_cache;

pub use decoder::NativeSchemaDecoder;
pub use encoder::NativeSchemaEncoder;
pub use layout::BufferLayout;
pub use layout_cache::SchemaLayoutCache;

use alloc::vec::Vec;
use tidemark_core::schema::{NativeSchema, Schema};
use tidemark_core::Result;

/// Magic bytes at the start of every buffer
pub const MAGIC: [u8; 4] = *b"TDMK";

/// Current format version
pub const VERSION: u16 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Object record size in bytes
pub const OBJECT_RECORD_SIZE: usize = 16;

/// Property record size in bytes
pub const PROPERTY_RECORD_SIZE: usize = 24;

/// Offset marker for an absent string
pub const NO_STRING: u32 = u32::MAX;

/// Property record flags
pub mod flags {
    pub const PRIMARY: u8 = 1 << 0;
    pub const NULLABLE: u8 = 1 << 1;
    pub const INDEXED: u8 = 1 << 2;
    /// Every bit a valid record may set.
    pub const ALL: u8 = PRIMARY | NULLABLE | INDEXED;
}

/// Flattens a schema model and encodes it.
pub fn encode_schema(schema: &Schema) -> Result<Vec<u8>> {
    let native = NativeSchema::flatten(schema)?;
    NativeSchemaEncoder::encode(&native)
}

/// Parses a buffer and decodes it into a schema model.
pub fn decode_schema(bytes: &[u8]) -> Result<Schema> {
    NativeSchemaDecoder::decode(bytes)?.decode()
}
