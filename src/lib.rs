//! # pipelint - validation of declarative pipeline descriptions
//!
//! pipelint reads RDF (Turtle) documents describing pipelines: ordered steps,
//! each bound to an operation and configured with parameters, wired into a
//! directed graph. It checks every step's parameters against the schema its
//! operation declares and checks each pipeline's structure, collecting
//! leveled issues instead of failing fast.
//!
//! ## Features
//!
//! - **Tolerant loading**: malformed statements are reported and skipped
//! - **Schema resolution**: from the document itself, registered schemas or
//!   package manifests, concurrently and once per distinct operation
//! - **Parameter checks**: cardinality, value kinds with soft coercions,
//!   undeclared names and surplus positional arguments
//! - **Structural checks**: foreign steps, orphans, cycles, exits with
//!   successors and stream interface compatibility
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pipelint::prelude::*;
//!
//! let validator = Validator::new(ValidatorConfig::default());
//! let run = validator.validate_path(Path::new("pipeline.ttl"), None).await;
//! for issue in &run.issues {
//!     println!("{}: {}", issue.subject, issue);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: identifiers, issues, context, configuration and errors
//! - [`graph`]: Turtle parsing and the immutable triple store
//! - [`pipeline`]: pipelines, steps, code links and wiring
//! - [`schema`]: operation schemas and their sources
//! - [`validation`]: step and pipeline rules and the engine running them
//! - [`report`]: text and JSON rendering for the command line
//!
//! ## Adding schemas
//!
//! Register schemas for operations no document or manifest describes:
//!
//! ```rust,ignore
//! use pipelint::prelude::*;
//!
//! let registry = SchemaRegistry::new().with(
//!     OperationSchema::new("node:csv-tools#parse")
//!         .with_parameter(ParameterSpec::new("delimiter").required()),
//! );
//! let validator = Validator::default().with_source(Arc::new(registry));
//! ```

#![warn(clippy::all)]

pub mod core;
pub mod graph;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod validation;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use pipelint::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{BoundValue, Identifier, Literal, Term};
    pub use crate::core::issue::{Level, RuleId, ValidationIssue};
    pub use crate::core::context::ValidationContext;
    pub use crate::core::config::{SchemaConfig, SeverityPolicy, ValidatorConfig};
    pub use crate::core::error::{ConfigError, GraphError, LoadError, PipelintError, PipelintResult, SchemaError};

    // Graph
    pub use crate::graph::store::GraphStore;
    pub use crate::graph::loader::{load_path, load_str};

    // Pipelines
    pub use crate::pipeline::model::{CodeLink, Pipeline, Step, StepKind, StreamInterface, StreamMode};

    // Schemas
    pub use crate::schema::registry::SchemaRegistry;
    pub use crate::schema::source::SchemaSource;
    pub use crate::schema::spec::{ExpectedKind, OperationSchema, ParameterSpec};

    // Validation
    pub use crate::validation::engine::{RunStats, ValidationRun, Validator};
    pub use crate::validation::pipeline::{PipelineInput, PipelineRule};

    pub use std::path::Path;
    pub use std::sync::Arc;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
