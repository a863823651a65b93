//! Core types shared by every validation stage.
//!
//! This module contains:
//! - Identifiers, graph terms and bound values
//! - Issues, levels and rule ids
//! - The per-run validation context
//! - Configuration
//! - Error types

pub mod types;
pub mod issue;
pub mod error;
pub mod context;
pub mod config;

// Re-export commonly used types
pub use types::{BoundValue, Identifier, Literal, Term};
pub use issue::{IssueLog, Level, RuleId, ValidationIssue};
pub use error::{ConfigError, GraphError, LoadError, PipelintError, SchemaError};
pub use context::ValidationContext;
pub use config::{SchemaConfig, SeverityPolicy, ValidatorConfig};
