//! Schema sources.
//!
//! A [`SchemaSource`] answers "what parameters does this operation declare?".
//! Sources are asynchronous because some of them read files or the network.
//! `Ok(None)` means the source knows nothing about the operation; an `Err` is a
//! failure that stops the lookup for that operation.

use crate::core::error::SchemaError;
use crate::graph::store::GraphStore;
use crate::pipeline::model::CodeLink;
use crate::schema::spec::OperationSchema;
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves operation schemas by code link.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Short name used in logs and "not found" reasons.
    fn name(&self) -> &str;

    /// Look up the schema of `operation`.
    async fn resolve(&self, operation: &CodeLink) -> Result<Option<OperationSchema>, SchemaError>;
}

/// Operations described inside the validated document itself.
pub struct DocumentSchemaSource {
    graph: Arc<GraphStore>,
}

impl DocumentSchemaSource {
    pub fn new(graph: Arc<GraphStore>) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl SchemaSource for DocumentSchemaSource {
    fn name(&self) -> &str {
        "document"
    }

    async fn resolve(&self, operation: &CodeLink) -> Result<Option<OperationSchema>, SchemaError> {
        OperationSchema::from_graph(&self.graph, operation.id())
    }
}

/// Sources consulted in order; the first one that knows the operation wins.
#[derive(Default)]
pub struct ChainedSource {
    sources: Vec<Arc<dyn SchemaSource>>,
}

impl ChainedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source after the existing ones.
    pub fn with_source(mut self, source: Arc<dyn SchemaSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl SchemaSource for ChainedSource {
    fn name(&self) -> &str {
        "chain"
    }

    /// Never returns `Ok(None)`: an operation no source knows is `NotFound`.
    async fn resolve(&self, operation: &CodeLink) -> Result<Option<OperationSchema>, SchemaError> {
        for source in &self.sources {
            if let Some(schema) = source.resolve(operation).await? {
                log::debug!("schema of {} found in {}", operation, source.name());
                return Ok(Some(schema));
            }
        }
        Err(SchemaError::NotFound {
            operation: operation.id().clone(),
            searched: self.sources.iter().map(|s| s.name().to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ValidationContext;
    use crate::graph::loader::load_str;
    use crate::schema::registry::SchemaRegistry;
    use crate::schema::spec::ParameterSpec;

    fn document() -> Arc<GraphStore> {
        let ctx = ValidationContext::with_defaults();
        Arc::new(load_str(
            r#"
            @prefix p: <https://pipeline.described.at/> .
            <node:local#op> a p:Operation ; p:parameter [ p:name "a" ] .
            "#,
            Some("urn:doc"),
            &ctx,
        ))
    }

    #[tokio::test]
    async fn test_document_source() {
        let source = DocumentSchemaSource::new(document());
        let schema = source.resolve(&CodeLink::new("node:local#op")).await.unwrap().unwrap();
        assert!(schema.declares("a"));
        assert!(source.resolve(&CodeLink::new("node:other#op")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chain_order_and_not_found() {
        let registry = SchemaRegistry::new()
            .with(OperationSchema::new("node:local#op").with_parameter(ParameterSpec::new("b")))
            .with(OperationSchema::new("node:reg#op"));
        let chain = ChainedSource::new()
            .with_source(Arc::new(DocumentSchemaSource::new(document())))
            .with_source(Arc::new(registry));
        assert_eq!(chain.len(), 2);

        // the document comes first
        let local = chain.resolve(&CodeLink::new("node:local#op")).await.unwrap().unwrap();
        assert!(local.declares("a"));
        assert!(chain.resolve(&CodeLink::new("node:reg#op")).await.unwrap().is_some());

        match chain.resolve(&CodeLink::new("node:none#op")).await {
            Err(SchemaError::NotFound { searched, .. }) => {
                assert_eq!(searched, vec!["document".to_string(), "registry".to_string()]);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
