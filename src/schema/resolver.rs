//! Concurrent schema resolution.
//!
//! Every distinct operation is resolved once. Resolutions run concurrently
//! up to the configured limit and may settle in any order; each one reports
//! its own issues when it settles, and the collected results are put back in
//! first-seen order so the output never depends on timing.

use crate::core::context::ValidationContext;
use crate::core::error::SchemaError;
use crate::core::issue::{RuleId, ValidationIssue};
use crate::pipeline::codelink::Dependencies;
use crate::pipeline::model::CodeLink;
use crate::schema::source::SchemaSource;
use crate::schema::spec::OperationSchema;
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of resolving one operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Arc<OperationSchema>),
    Unresolved(SchemaError),
}

impl Resolution {
    pub fn schema(&self) -> Option<&Arc<OperationSchema>> {
        match self {
            Resolution::Resolved(schema) => Some(schema),
            Resolution::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Resolution of every distinct operation, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSchemas {
    entries: IndexMap<CodeLink, Resolution>,
}

impl ResolvedSchemas {
    pub fn get(&self, operation: &CodeLink) -> Option<&Resolution> {
        self.entries.get(operation)
    }

    /// Schema of `operation` if it resolved.
    pub fn schema(&self, operation: &CodeLink) -> Option<&Arc<OperationSchema>> {
        self.get(operation).and_then(Resolution::schema)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CodeLink, &Resolution)> {
        self.entries.iter()
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_resolved()).count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.len() - self.resolved_count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fans schema lookups out over a [`SchemaSource`].
pub struct SchemaResolver {
    source: Arc<dyn SchemaSource>,
    max_concurrency: usize,
}

impl SchemaResolver {
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            source,
            max_concurrency: 8,
        }
    }

    /// Set the maximum number of lookups in flight (at least one).
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    /// Resolve every operation in `dependencies`.
    pub async fn resolve(&self, dependencies: &Dependencies, ctx: &ValidationContext) -> ResolvedSchemas {
        let start = Instant::now();

        let mut settled: Vec<(usize, CodeLink, Resolution)> = stream::iter(dependencies.operations().cloned().enumerate())
            .map(|(index, operation)| async move {
                let resolution = self.resolve_one(&operation).await;
                report(&operation, &resolution, dependencies, ctx);
                (index, operation, resolution)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;
        settled.sort_by_key(|(index, _, _)| *index);

        let schemas = ResolvedSchemas {
            entries: settled
                .into_iter()
                .map(|(_, operation, resolution)| (operation, resolution))
                .collect(),
        };
        log::info!(
            "resolved {} of {} operation schema(s) in {:?}",
            schemas.resolved_count(),
            schemas.len(),
            start.elapsed()
        );
        schemas
    }

    async fn resolve_one(&self, operation: &CodeLink) -> Resolution {
        let found = match self.source.resolve(operation).await {
            Ok(Some(schema)) => schema.validate_consistency().map(|_| schema),
            Ok(None) => Err(SchemaError::NotFound {
                operation: operation.id().clone(),
                searched: vec![self.source.name().to_string()],
            }),
            Err(e) => Err(e),
        };
        match found {
            Ok(schema) => Resolution::Resolved(Arc::new(schema)),
            Err(e) => {
                log::warn!("{}", e);
                Resolution::Unresolved(e)
            }
        }
    }
}

/// One `schema-resolved` info per operation, or one `schema-unresolved`
/// error per step bound to it.
fn report(operation: &CodeLink, resolution: &Resolution, dependencies: &Dependencies, ctx: &ValidationContext) {
    match resolution {
        Resolution::Resolved(schema) => ctx.report(
            ValidationIssue::info(
                RuleId::SchemaResolved,
                operation.id().clone(),
                format!(
                    "Resolved schema of {} ({} parameter(s))",
                    operation,
                    schema.parameters.len()
                ),
            )
            .with_context(json!({ "steps": dependencies.step_ids_for(operation).len() })),
        ),
        Resolution::Unresolved(error) => {
            for step in dependencies.step_ids_for(operation) {
                ctx.report(
                    ValidationIssue::error(
                        RuleId::SchemaUnresolved,
                        step.clone(),
                        format!("Cannot resolve schema of operation {}: {}", operation, error),
                    )
                    .with_context(json!({
                        "operation": operation.as_str(),
                        "reason": error.kind(),
                    })),
                );
            }
        }
    }
}
