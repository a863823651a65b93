//! Operation schemas and where they come from.
//!
//! - [`spec`] describes parameters and checks values against their kinds
//! - [`source`] defines the async [`SchemaSource`] trait and the document source
//! - [`manifest`] reads package manifests from disk or a registry
//! - [`registry`] holds schemas registered in memory
//! - [`resolver`] resolves every distinct operation concurrently

pub mod spec;
pub mod source;
pub mod manifest;
pub mod registry;
pub mod resolver;

pub use spec::{ExpectedKind, KindCheck, OperationSchema, ParameterSpec};
pub use source::{ChainedSource, DocumentSchemaSource, SchemaSource};
pub use manifest::{ManifestCache, ManifestCacheStats, ManifestLocator, ManifestSchemaSource};
pub use registry::SchemaRegistry;
pub use resolver::{Resolution, ResolvedSchemas, SchemaResolver};
