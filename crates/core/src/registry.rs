//! Process-wide default schema.
//!
//! Storable classes are registered explicitly (by application code or a
//! build-time generator); the runtime never scans for them. The default
//! [`Schema`] is built from the eligible registrations on first access and
//! memoized until [`SchemaRegistry::reset`] tears it down.

use crate::error::Result;
use crate::schema::{ObjectSchema, Schema, SchemaBuilder};
use alloc::vec::Vec;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

/// Where a class declaration comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DeclarationOrigin {
    /// Declared by application code.
    #[default]
    Application,
    /// Part of the database infrastructure itself; never stored.
    Infrastructure,
    /// A generated proxy type; stored only when the platform permits it.
    Generated,
}

/// A storable class as registered with a [`SchemaRegistry`].
#[derive(Clone, Debug)]
pub struct ClassDeclaration {
    schema: ObjectSchema,
    origin: DeclarationOrigin,
    explicit: bool,
}

impl ClassDeclaration {
    /// Creates an application class declaration.
    pub fn new(schema: ObjectSchema) -> Self {
        Self {
            schema,
            origin: DeclarationOrigin::Application,
            explicit: false,
        }
    }

    /// Sets the declaration origin.
    pub fn origin(mut self, origin: DeclarationOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Marks the class as explicit: it is only stored when a database names it.
    pub fn explicit(mut self, value: bool) -> Self {
        self.explicit = value;
        self
    }

    /// Returns the class descriptor.
    #[inline]
    pub fn schema(&self) -> &ObjectSchema {
        &self.schema
    }

    /// Returns whether this class belongs in the default schema.
    pub fn is_default_eligible(&self, config: &RegistryConfig) -> bool {
        match self.origin {
            DeclarationOrigin::Infrastructure => false,
            DeclarationOrigin::Generated if !config.allow_generated => false,
            _ => !self.explicit,
        }
    }
}

/// Configuration for a [`SchemaRegistry`].
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Whether generated proxy types may join the default schema.
    pub allow_generated: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            allow_generated: true,
        }
    }
}

/// Explicit class registrations plus the memoized default schema.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    config: RegistryConfig,
    declarations: Mutex<Vec<ClassDeclaration>>,
    schema: RwLock<Option<Arc<Schema>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            declarations: Mutex::new(Vec::new()),
            schema: RwLock::new(None),
        }
    }

    /// Registers a class declaration.
    ///
    /// Registrations made after the default schema was built are picked up
    /// only after [`reset`](Self::reset).
    pub fn register(&self, declaration: ClassDeclaration) {
        self.declarations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(declaration);
    }

    /// Returns the number of registered declarations.
    pub fn declaration_count(&self) -> usize {
        self.declarations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true once the default schema has been built.
    pub fn is_built(&self) -> bool {
        self.schema
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the default schema, building it on first access.
    ///
    /// Concurrent first callers all observe the same instance; the build runs
    /// exactly once. A failed build is not memoized.
    pub fn get_or_build(&self) -> Result<Arc<Schema>> {
        if let Some(schema) = self
            .schema
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(schema));
        }

        let mut slot = self.schema.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(schema) = slot.as_ref() {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(self.build()?);
        tracing::debug!(classes = schema.len(), "built default schema");
        *slot = Some(Arc::clone(&schema));
        Ok(schema)
    }

    /// Drops the memoized schema so the next access rebuilds it.
    pub fn reset(&self) {
        *self.schema.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Drops the memoized schema and every registration.
    pub fn clear(&self) {
        self.reset();
        self.declarations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn build(&self) -> Result<Schema> {
        let declarations = self
            .declarations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut builder = SchemaBuilder::new();
        for declaration in declarations
            .iter()
            .filter(|d| d.is_default_eligible(&self.config))
        {
            builder.add(declaration.schema.clone())?;
        }
        builder.build()
    }
}

static DEFAULT_REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();

/// Returns the process-wide registry.
pub fn default_registry() -> &'static SchemaRegistry {
    DEFAULT_REGISTRY.get_or_init(SchemaRegistry::default)
}

/// Registers a class with the process-wide registry.
pub fn register_class(declaration: ClassDeclaration) {
    default_registry().register(declaration);
}

/// Returns the process-wide default schema, building it on first access.
pub fn default_schema() -> Result<Arc<Schema>> {
    default_registry().get_or_build()
}

/// Tears down the process-wide default schema and its registrations.
pub fn reset_default_schema() {
    default_registry().clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::schema::{ObjectSchemaBuilder, Property};
    use crate::types::PropertyType;
    use std::thread;

    fn class(name: &str) -> ObjectSchema {
        ObjectSchemaBuilder::new(name)
            .unwrap()
            .property(Property::new("id", PropertyType::Int))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_eligibility_filters() {
        let registry = SchemaRegistry::default();
        registry.register(ClassDeclaration::new(class("Person")));
        registry.register(ClassDeclaration::new(class("Meta")).origin(DeclarationOrigin::Infrastructure));
        registry.register(ClassDeclaration::new(class("Draft")).explicit(true));
        registry.register(ClassDeclaration::new(class("PersonProxy")).origin(DeclarationOrigin::Generated));

        let schema = registry.get_or_build().unwrap();
        let names: Vec<&str> = schema.names().collect();
        assert_eq!(names, ["Person", "PersonProxy"]);
    }

    #[test]
    fn test_generated_excluded_when_not_permitted() {
        let registry = SchemaRegistry::new(RegistryConfig {
            allow_generated: false,
        });
        registry.register(ClassDeclaration::new(class("Person")));
        registry.register(ClassDeclaration::new(class("PersonProxy")).origin(DeclarationOrigin::Generated));

        let schema = registry.get_or_build().unwrap();
        assert!(schema.contains("Person"));
        assert!(!schema.contains("PersonProxy"));
    }

    #[test]
    fn test_memoized_until_reset() {
        let registry = SchemaRegistry::default();
        registry.register(ClassDeclaration::new(class("Person")));

        let first = registry.get_or_build().unwrap();
        registry.register(ClassDeclaration::new(class("Dog")));
        let second = registry.get_or_build().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!second.contains("Dog"));

        registry.reset();
        assert!(!registry.is_built());
        let third = registry.get_or_build().unwrap();
        assert!(third.contains("Dog"));
    }

    #[test]
    fn test_empty_registry_fails_and_is_not_memoized() {
        let registry = SchemaRegistry::default();
        assert_eq!(registry.get_or_build().err(), Some(Error::EmptySchema));
        assert!(!registry.is_built());

        registry.register(ClassDeclaration::new(class("Person")));
        assert!(registry.get_or_build().is_ok());
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let registry = Arc::new(SchemaRegistry::default());
        registry.register(ClassDeclaration::new(class("Person")));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.get_or_build().unwrap())
            })
            .collect();
        let schemas: Vec<Arc<Schema>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for schema in &schemas[1..] {
            assert!(Arc::ptr_eq(&schemas[0], schema));
        }
    }

    #[test]
    fn test_process_wide_registry() {
        reset_default_schema();
        register_class(ClassDeclaration::new(class("Global")));

        let schema = default_schema().unwrap();
        assert!(schema.contains("Global"));
        assert!(Arc::ptr_eq(&schema, &default_schema().unwrap()));

        reset_default_schema();
        assert_eq!(default_registry().declaration_count(), 0);
        assert_eq!(default_schema().err(), Some(Error::EmptySchema));
    }
}
