//! Code links and dependency deduplication.
//!
//! Every operation step names its implementation through
//! `code:implementedBy [ code:link <operation> ]`. Many steps share one
//! operation, so the links are collapsed into the distinct set of operations
//! whose schemas need resolving, plus a reverse index back to the steps.

use crate::core::context::ValidationContext;
use crate::core::issue::{RuleId, ValidationIssue};
use crate::core::types::{is_absolute_iri, Identifier, Term};
use crate::graph::store::GraphStore;
use crate::graph::vocab;
use crate::pipeline::model::{CodeLink, Pipelines, StepKind, StepRef};
use indexmap::{IndexMap, IndexSet};
use serde_json::json;
use std::collections::HashSet;

/// Code link of every operation step that has one.
#[derive(Debug, Clone, Default)]
pub struct CodeLinks {
    links: IndexMap<StepRef, CodeLink>,
}

impl CodeLinks {
    pub fn get(&self, step: &StepRef) -> Option<&CodeLink> {
        self.links.get(step)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StepRef, &CodeLink)> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl FromIterator<(StepRef, CodeLink)> for CodeLinks {
    fn from_iter<T: IntoIterator<Item = (StepRef, CodeLink)>>(iter: T) -> Self {
        Self {
            links: iter.into_iter().collect(),
        }
    }
}

/// Resolve the operation of every operation step.
///
/// A step without one gets a single `missing-code-link` error (even when
/// several pipelines list it) and is left out of the result.
pub fn extract_code_links(graph: &GraphStore, pipelines: &Pipelines, ctx: &ValidationContext) -> CodeLinks {
    let mut links = IndexMap::new();
    let mut reported = HashSet::new();

    for step in pipelines.values().flat_map(|p| p.steps.iter()) {
        if step.kind != StepKind::Operation {
            continue;
        }
        match code_link(graph, step.id.as_str()) {
            Ok(link) => {
                links.insert(step.step_ref(), link);
            }
            Err(reason) => {
                if reported.insert(step.id.clone()) {
                    ctx.report(
                        ValidationIssue::error(
                            RuleId::MissingCodeLink,
                            step.id.clone(),
                            format!("Step has no bound operation: {}", reason),
                        )
                        .with_context(json!({ "pipeline": step.pipeline })),
                    );
                }
            }
        }
    }

    log::debug!("extracted {} code link(s)", links.len());
    CodeLinks { links }
}

fn code_link(graph: &GraphStore, step: &str) -> Result<CodeLink, String> {
    let implementation = graph
        .objects(step, vocab::CODE_IMPLEMENTED_BY)
        .find_map(Term::as_identifier)
        .ok_or_else(|| "no code:implementedBy".to_string())?;

    match graph.object(implementation.as_str(), vocab::CODE_LINK) {
        Some(Term::Iri(link)) => Ok(CodeLink::new(link.clone())),
        Some(Term::Literal(lit)) if is_absolute_iri(&lit.lexical) => Ok(CodeLink::new(&*lit.lexical)),
        Some(other) => Err(format!("code:link {} is not an IRI", other)),
        // A named implementation node is the operation itself
        None if !implementation.is_blank() => Ok(CodeLink::new(implementation.clone())),
        None => Err("implementation has no code:link".to_string()),
    }
}

/// Distinct operations and the steps bound to each.
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    operations: IndexMap<CodeLink, Vec<StepRef>>,
}

impl Dependencies {
    /// Group code links by operation, keeping first-seen order.
    pub fn collect(links: &CodeLinks) -> Self {
        let mut operations: IndexMap<CodeLink, Vec<StepRef>> = IndexMap::new();
        for (step, link) in links.iter() {
            operations.entry(link.clone()).or_default().push(step.clone());
        }
        log::debug!(
            "{} step(s) depend on {} distinct operation(s)",
            links.len(),
            operations.len()
        );
        Self { operations }
    }

    /// Distinct operations in first-seen order.
    pub fn operations(&self) -> impl Iterator<Item = &CodeLink> {
        self.operations.keys()
    }

    /// Steps bound to `operation`.
    pub fn steps_for(&self, operation: &CodeLink) -> &[StepRef] {
        self.operations.get(operation).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct step identifiers bound to `operation`.
    pub fn step_ids_for(&self, operation: &CodeLink) -> IndexSet<&Identifier> {
        self.steps_for(operation).iter().map(|s| &s.step).collect()
    }

    /// Packages that provide the operations.
    pub fn packages(&self) -> IndexSet<String> {
        self.operations.keys().filter_map(CodeLink::package).collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
