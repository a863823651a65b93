//! Graph module: the loaded document as a queryable set of triples.
//!
//! Documents are parsed once into an immutable [`GraphStore`] that every
//! later stage reads through shared references.

pub mod vocab;
pub mod store;
pub mod turtle;
pub mod loader;

// Re-export commonly used types
pub use store::{GraphStore, Triple};
pub use turtle::{ParseOutcome, SyntaxError};
pub use loader::{document_iri, load_path, load_str};
