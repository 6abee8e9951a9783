//! Tidemark Core - Schema model and native schema layout for Tidemark.
//!
//! This crate describes the classes and properties a Tidemark database can
//! store, independent of any one process:
//!
//! - `PropertyType`: Stored property kinds with stable wire codes
//! - `schema`: Property/object descriptors, the `Schema` model and `SchemaBuilder`
//! - `schema::NativeSchema`: The flat array-of-structs layout the storage engine consumes
//! - `registry`: The process-wide default schema built from explicit registrations
//! - `Error`: Error types shared by all Tidemark crates
//!
//! # Example
//!
//! ```rust
//! use tidemark_core::PropertyType;
//! use tidemark_core::schema::{ObjectSchemaBuilder, Property, SchemaBuilder};
//!
//! let person = ObjectSchemaBuilder::new("Person")
//!     .unwrap()
//!     .property(Property::new("id", PropertyType::Int).primary_key(true))
//!     .unwrap()
//!     .property(Property::new("name", PropertyType::String))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let (schema, native) = SchemaBuilder::new()
//!     .class(person)
//!     .unwrap()
//!     .build_native()
//!     .unwrap();
//!
//! assert!(schema.find("Person").unwrap().is_some());
//! assert_eq!(native.objects()[0].properties_end, 2);
//! assert_eq!(native.decode().unwrap(), schema);
//! ```

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod error;
#[cfg(feature = "std")]
pub mod registry;
pub mod schema;
mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::PropertyType;
