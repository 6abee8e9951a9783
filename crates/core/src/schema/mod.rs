//! Schema module for Tidemark.
//!
//! This module contains the property and object descriptors, the immutable
//! schema model, the builder that produces it, and the native layout used to
//! exchange schemas with the storage engine.

mod builder;
mod model;
mod native;
mod object;
mod property;

pub use builder::SchemaBuilder;
pub use model::Schema;
pub use native::{NativeObject, NativeProperty, NativeSchema};
pub use object::{ObjectSchema, ObjectSchemaBuilder};
pub use property::Property;
