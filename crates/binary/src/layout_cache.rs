//! Cache of encoded schema buffers.
//!
//! Opening the same database repeatedly hands the engine the same schema; the
//! encoded buffer is kept per database key and reused until invalidated.

use super::encode_schema;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use tidemark_core::schema::Schema;
use tidemark_core::Result;

/// Cache for encoded native schema buffers, keyed by database (e.g. its path).
#[derive(Default)]
pub struct SchemaLayoutCache {
    buffers: HashMap<String, Vec<u8>>,
}

impl SchemaLayoutCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            buffers: HashMap::new(),
        }
    }

    /// Get or encode the buffer for `key`.
    ///
    /// The schema is only flattened and encoded on a miss.
    pub fn get_or_encode(&mut self, key: &str, schema: &Schema) -> Result<&[u8]> {
        if !self.buffers.contains_key(key) {
            let bytes = encode_schema(schema)?;
            self.buffers.insert(key.into(), bytes);
        }
        Ok(self.buffers.get(key).map(Vec::as_slice).unwrap_or_default())
    }

    /// Returns true if a buffer is cached for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.buffers.contains_key(key)
    }

    /// Returns the number of cached buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Invalidate the cached buffer for `key` (call when its schema changes)
    pub fn invalidate(&mut self, key: &str) {
        self.buffers.remove(key);
    }

    /// Clear all cached buffers
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}
