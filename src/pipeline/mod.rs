//! Pipeline module: pipelines, steps and their wiring as read from the graph.
//!
//! The stages here are synchronous and only read the graph:
//! - [`resolver`] materializes pipelines and steps
//! - [`codelink`] finds each step's operation and deduplicates them
//! - [`properties`] reads wiring, entry and exit steps
//! - [`topology`] analyses the wiring

pub mod model;
pub mod resolver;
pub mod codelink;
pub mod properties;
pub mod topology;

// Re-export commonly used types
pub use model::{CodeLink, ParameterBindings, Pipeline, Pipelines, Step, StepKind, StepRef, StreamInterface, StreamMode};
pub use resolver::PipelineResolver;
pub use codelink::{extract_code_links, CodeLinks, Dependencies};
pub use properties::{extract_properties, PipelineProperties, Wiring, WiringEdge};
pub use topology::WiringGraph;
