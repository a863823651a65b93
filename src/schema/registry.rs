//! In-memory schema registry.

use crate::core::error::SchemaError;
use crate::core::types::Identifier;
use crate::pipeline::model::CodeLink;
use crate::schema::source::SchemaSource;
use crate::schema::spec::OperationSchema;
use async_trait::async_trait;
use indexmap::IndexMap;

/// Operation schemas registered by the embedding application.
///
/// Registration order is kept so listings are stable.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<Identifier, OperationSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, replacing any earlier one for the same operation.
    pub fn register(&mut self, schema: OperationSchema) {
        if self.schemas.insert(schema.operation.clone(), schema).is_some() {
            log::debug!("replaced a registered schema");
        }
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, schema: OperationSchema) -> Self {
        self.register(schema);
        self
    }

    pub fn get(&self, operation: &str) -> Option<&OperationSchema> {
        self.schemas.get(operation)
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.schemas.contains_key(operation)
    }

    /// Remove a schema, returning it.
    pub fn unregister(&mut self, operation: &str) -> Option<OperationSchema> {
        self.schemas.shift_remove(operation)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Identifier> {
        self.schemas.keys()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[async_trait]
impl SchemaSource for SchemaRegistry {
    fn name(&self) -> &str {
        "registry"
    }

    async fn resolve(&self, operation: &CodeLink) -> Result<Option<OperationSchema>, SchemaError> {
        Ok(self.get(operation.as_str()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::spec::ParameterSpec;

    #[test]
    fn test_register_and_replace() {
        let mut registry = SchemaRegistry::new()
            .with(OperationSchema::new("node:a#x"))
            .with(OperationSchema::new("node:b#y"));
        assert_eq!(registry.len(), 2);

        registry.register(OperationSchema::new("node:a#x").with_parameter(ParameterSpec::new("p")));
        assert_eq!(registry.len(), 2);
        assert!(registry.get("node:a#x").unwrap().declares("p"));

        let order: Vec<&str> = registry.operations().map(Identifier::as_str).collect();
        assert_eq!(order, vec!["node:a#x", "node:b#y"]);

        assert!(registry.unregister("node:a#x").is_some());
        assert!(!registry.contains("node:a#x"));
    }
}
