//! Error types for pipelint.
//!
//! Uses thiserror for structured errors with context. These errors never
//! escape a validation run: each stage converts the ones it hits into exactly
//! one [`ValidationIssue`](crate::core::issue::ValidationIssue) at its boundary.

use crate::core::types::Identifier;
use thiserror::Error;

/// Top-level error type for pipelint.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum PipelintError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors while reading a source document.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot derive a document IRI for {path}")]
    NoDocumentIri { path: String },
}

/// Errors from graph lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("List {head} has a node without rdf:first")]
    MissingFirst { head: String },

    #[error("List {head} has a node with {count} rdf:rest values")]
    AmbiguousRest { head: String, count: usize },

    #[error("List {head} loops back on itself")]
    CyclicList { head: String },

    #[error("List {head} is a literal, not a collection")]
    LiteralList { head: String },
}

/// Errors while resolving an operation schema.
///
/// `Clone` so one failed manifest load can be shared by every operation of
/// the same package.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("No schema found for {operation} (searched: {})", .searched.join(", "))]
    NotFound {
        operation: Identifier,
        searched: Vec<String>,
    },

    #[error("Manifest {location} is unavailable: {reason}")]
    ManifestUnavailable { location: String, reason: String },

    #[error("Manifest {location} has {count} syntax error(s), first: {first}")]
    ManifestMalformed {
        location: String,
        count: usize,
        first: String,
    },

    #[error("Timed out after {secs}s fetching {location}")]
    Timeout { location: String, secs: u64 },

    #[error("Schema of {operation} is contradictory: {reason}")]
    Contradictory { operation: Identifier, reason: String },
}

/// Errors while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Error Utilities
// ============================================================================

impl SchemaError {
    /// Short machine-readable tag, used in issue contexts.
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaError::NotFound { .. } => "not-found",
            SchemaError::ManifestUnavailable { .. } => "unreachable",
            SchemaError::ManifestMalformed { .. } => "malformed",
            SchemaError::Timeout { .. } => "timeout",
            SchemaError::Contradictory { .. } => "contradictory",
        }
    }

    /// Whether retrying the same run later could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SchemaError::ManifestUnavailable { .. } | SchemaError::Timeout { .. }
        )
    }
}

/// Result type alias for pipelint operations.
pub type PipelintResult<T> = Result<T, PipelintError>;

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
