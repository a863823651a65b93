//! Document loading.
//!
//! Reads a Turtle document into a [`GraphStore`]. Nothing here fails the run:
//! an unreadable file becomes one `document-unreadable` issue and an empty
//! graph, and every malformed statement becomes one `syntax` issue.

use crate::core::context::ValidationContext;
use crate::core::error::LoadError;
use crate::core::issue::{RuleId, ValidationIssue};
use crate::core::types::Identifier;
use crate::graph::store::GraphStore;
use crate::graph::turtle;
use serde_json::json;
use std::path::Path;
use std::time::Instant;
use url::Url;

/// `file:` IRI of a local document, used as its base.
pub fn document_iri(path: &Path) -> Result<Identifier, LoadError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .map_err(|source| LoadError::Unreadable {
                path: path.display().to_string(),
                source,
            })?
    };
    Url::from_file_path(&absolute)
        .map(|url| Identifier::new(url.as_str()))
        .map_err(|_| LoadError::NoDocumentIri {
            path: path.display().to_string(),
        })
}

async fn read_source(path: &Path) -> Result<String, LoadError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Unreadable {
            path: path.display().to_string(),
            source,
        })
}

/// Load a document from disk.
pub async fn load_path(path: &Path, ctx: &ValidationContext) -> GraphStore {
    let document = match document_iri(path) {
        Ok(iri) => iri,
        Err(e) => {
            let subject = Identifier::new(path.display().to_string());
            ctx.report(
                ValidationIssue::error(RuleId::DocumentUnreadable, subject, e.to_string())
                    .with_context(json!({ "path": path.display().to_string() })),
            );
            return GraphStore::new();
        }
    };

    match read_source(path).await {
        Ok(source) => load_str(&source, Some(document.as_str()), ctx),
        Err(e) => {
            log::warn!("{}", e);
            ctx.report(
                ValidationIssue::error(RuleId::DocumentUnreadable, document.clone(), e.to_string())
                    .with_context(json!({ "path": path.display().to_string() })),
            );
            GraphStore::from_triples(Some(document), Vec::new())
        }
    }
}

/// Load a document held in memory. `base` is the document IRI.
pub fn load_str(source: &str, base: Option<&str>, ctx: &ValidationContext) -> GraphStore {
    let start = Instant::now();
    let outcome = turtle::parse(source, base);
    let fallback = outcome
        .document
        .clone()
        .unwrap_or_else(|| Identifier::new(base.unwrap_or("<document>")));

    for error in &outcome.errors {
        let subject = error.subject.clone().unwrap_or_else(|| fallback.clone());
        ctx.report(
            ValidationIssue::error(
                RuleId::Syntax,
                subject,
                format!(
                    "Syntax error at line {}, column {}: {}",
                    error.line, error.column, error.message
                ),
            )
            .with_context(json!({ "line": error.line, "column": error.column })),
        );
    }

    let graph = GraphStore::from_triples(outcome.document, outcome.triples);
    log::debug!(
        "loaded {} triple(s) from {} in {:?}",
        graph.len(),
        fallback,
        start.elapsed()
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::issue::Level;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_path() {
        let mut file = tempfile::Builder::new().suffix(".ttl").tempfile().unwrap();
        writeln!(file, "<#a> <#p> <#b> .").unwrap();

        let ctx = ValidationContext::with_defaults();
        let graph = load_path(file.path(), &ctx).await;
        assert_eq!(graph.len(), 1);
        assert!(ctx.issues().is_empty());

        let base = graph.base().unwrap().as_str().to_string();
        assert!(base.starts_with("file://"));
        assert!(graph.describes(&format!("{}#a", base)));
    }

    #[tokio::test]
    async fn test_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ttl");

        let ctx = ValidationContext::with_defaults();
        let graph = load_path(&missing, &ctx).await;
        assert!(graph.is_empty());

        let issues = ctx.into_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].level, Level::Error);
        assert_eq!(issues[0].rule, RuleId::DocumentUnreadable);
        assert!(issues[0].subject.as_str().ends_with("missing.ttl"));
    }

    #[test]
    fn test_syntax_issues_keep_partial_graph() {
        let ctx = ValidationContext::with_defaults();
        let graph = load_str(
            "<#a> <#p> <#b> .\n<#c> <#p> .\n<#d> <#p> <#e> .",
            Some("http://example.org/doc"),
            &ctx,
        );
        assert_eq!(graph.len(), 2);

        let issues = ctx.into_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule, RuleId::Syntax);
        assert_eq!(issues[0].subject.as_str(), "http://example.org/doc#c");
        assert!(issues[0].message.starts_with("Syntax error at line 2"));
        assert_eq!(issues[0].context.as_ref().unwrap()["line"], 2);
    }
}
