//! Pipeline properties: wiring, entry and exit steps.
//!
//! Extraction only reads the graph. Problems with the wiring are recorded on
//! the result and reported later by the pipeline rules.

use crate::core::types::{Identifier, Term};
use crate::graph::store::GraphStore;
use crate::graph::vocab;
use crate::pipeline::model::{Pipeline, Pipelines};
use indexmap::IndexMap;
use serde::Serialize;

/// A directed connection between two steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WiringEdge {
    pub from: Identifier,
    pub to: Identifier,
    /// Feedback edges may close loops.
    pub feedback: bool,
}

impl WiringEdge {
    pub fn forward(from: impl Into<Identifier>, to: impl Into<Identifier>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            feedback: false,
        }
    }

    pub fn feedback(from: impl Into<Identifier>, to: impl Into<Identifier>) -> Self {
        Self {
            feedback: true,
            ..Self::forward(from, to)
        }
    }
}

/// Where the edges of a pipeline came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Wiring {
    /// Declared with `p:wiring`.
    Declared,
    /// No `p:wiring`: consecutive steps are connected.
    Implicit,
    /// `p:wiring` present but unparsable; no edges were kept.
    Malformed { node: Identifier, reason: String },
}

/// Structural properties of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineProperties {
    pub pipeline: Identifier,
    pub edges: Vec<WiringEdge>,
    pub wiring: Wiring,
    /// Declared entry steps, or the first step.
    pub entries: Vec<Identifier>,
    /// Declared exit steps, or the last step.
    pub exits: Vec<Identifier>,
}

impl PipelineProperties {
    pub fn forward_edges(&self) -> impl Iterator<Item = &WiringEdge> {
        self.edges.iter().filter(|e| !e.feedback)
    }
}

/// Extract the properties of every resolved pipeline.
pub fn extract_properties(graph: &GraphStore, pipelines: &Pipelines) -> IndexMap<Identifier, PipelineProperties> {
    pipelines
        .values()
        .map(|pipeline| (pipeline.id.clone(), extract(graph, pipeline)))
        .collect()
}

fn extract(graph: &GraphStore, pipeline: &Pipeline) -> PipelineProperties {
    let id = pipeline.id.as_str();
    let (edges, wiring) = wiring(graph, pipeline);

    let mut entries: Vec<Identifier> = graph
        .objects(id, vocab::P_ENTRY)
        .filter_map(Term::as_identifier)
        .cloned()
        .collect();
    if entries.is_empty() {
        entries.extend(pipeline.first_step().cloned());
    }

    let mut exits: Vec<Identifier> = graph
        .objects(id, vocab::P_EXIT)
        .filter_map(Term::as_identifier)
        .cloned()
        .collect();
    if exits.is_empty() {
        exits.extend(pipeline.last_step().cloned());
    }

    log::trace!("{}: {} edge(s), wiring {:?}", id, edges.len(), wiring);
    PipelineProperties {
        pipeline: pipeline.id.clone(),
        edges,
        wiring,
        entries,
        exits,
    }
}

fn wiring(graph: &GraphStore, pipeline: &Pipeline) -> (Vec<WiringEdge>, Wiring) {
    let declared: Vec<&Term> = graph.objects(pipeline.id.as_str(), vocab::P_WIRING).collect();
    if declared.is_empty() {
        let edges = pipeline
            .steps
            .windows(2)
            .map(|pair| WiringEdge::forward(pair[0].id.clone(), pair[1].id.clone()))
            .collect();
        return (edges, Wiring::Implicit);
    }

    // `p:wiring` may hold wiring nodes directly or a list of them
    let mut nodes = Vec::new();
    for term in declared {
        if graph.is_list(term) {
            let (items, problem) = graph.list_prefix(term);
            if let Some(problem) = problem {
                return malformed(&pipeline.id, problem.to_string());
            }
            nodes.extend(items);
        } else {
            nodes.push(term);
        }
    }

    let mut edges = Vec::with_capacity(nodes.len());
    for node in nodes {
        let Some(node) = node.as_identifier() else {
            return malformed(&pipeline.id, format!("wiring value {} is a literal", node));
        };
        match edge(graph, node) {
            Ok(edge) => edges.push(edge),
            Err(reason) => return malformed(node, reason),
        }
    }
    (edges, Wiring::Declared)
}

fn malformed(node: &Identifier, reason: String) -> (Vec<WiringEdge>, Wiring) {
    (
        Vec::new(),
        Wiring::Malformed {
            node: node.clone(),
            reason,
        },
    )
}

fn edge(graph: &GraphStore, node: &Identifier) -> Result<WiringEdge, String> {
    let endpoint = |predicate: &str, label: &str| -> Result<Identifier, String> {
        let values: Vec<&Term> = graph.objects(node.as_str(), predicate).collect();
        match values.as_slice() {
            [single] => single
                .as_identifier()
                .cloned()
                .ok_or_else(|| format!("p:{} value {} is not a step", label, single)),
            [] => Err(format!("missing p:{}", label)),
            many => Err(format!("{} p:{} values, expected one", many.len(), label)),
        }
    };
    let from = endpoint(vocab::P_FROM, "from")?;
    let to = endpoint(vocab::P_TO, "to")?;
    let feedback = graph
        .objects(node.as_str(), vocab::P_FEEDBACK)
        .filter_map(Term::as_literal)
        .any(|lit| lit.as_bool() == Some(true));
    Ok(WiringEdge { from, to, feedback })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ValidationContext;
    use crate::graph::loader::load_str;
    use crate::pipeline::resolver::PipelineResolver;

    fn properties(body: &str) -> PipelineProperties {
        let source = format!(
            "@prefix p: <https://pipeline.described.at/> .\n{}",
            body
        );
        let ctx = ValidationContext::with_defaults();
        let graph = load_str(&source, Some("urn:doc"), &ctx);
        assert!(ctx.issues().is_empty(), "{:?}", ctx.issues().snapshot());
        let pipelines = PipelineResolver::new(&graph).resolve(None, &ctx);
        let mut all = extract_properties(&graph, &pipelines);
        all.swap_remove_index(0).map(|(_, p)| p).unwrap()
    }

    #[test]
    fn test_implicit_wiring_and_defaults() {
        let props = properties("<urn:p> a p:Pipeline ; p:steps [ p:stepList ( <urn:a> <urn:b> <urn:c> ) ] .");
        assert_eq!(props.wiring, Wiring::Implicit);
        assert_eq!(
            props.edges,
            vec![WiringEdge::forward("urn:a", "urn:b"), WiringEdge::forward("urn:b", "urn:c")]
        );
        assert_eq!(props.entries, vec![Identifier::new("urn:a")]);
        assert_eq!(props.exits, vec![Identifier::new("urn:c")]);
    }

    #[test]
    fn test_declared_wiring() {
        let props = properties(
            r#"
            <urn:p> a p:Pipeline ;
                p:steps [ p:stepList ( <urn:a> <urn:b> ) ] ;
                p:entry <urn:b> ;
                p:exit <urn:a> ;
                p:wiring [ p:from <urn:a> ; p:to <urn:b> ] ,
                         [ p:from <urn:b> ; p:to <urn:a> ; p:feedback true ] .
            "#,
        );
        assert_eq!(props.wiring, Wiring::Declared);
        assert_eq!(
            props.edges,
            vec![WiringEdge::forward("urn:a", "urn:b"), WiringEdge::feedback("urn:b", "urn:a")]
        );
        assert_eq!(props.forward_edges().count(), 1);
        assert_eq!(props.entries, vec![Identifier::new("urn:b")]);
        assert_eq!(props.exits, vec![Identifier::new("urn:a")]);
    }

    #[test]
    fn test_wiring_list() {
        let props = properties(
            "<urn:p> a p:Pipeline ; p:steps [ p:stepList ( <urn:a> <urn:b> ) ] ;\n\
             p:wiring ( [ p:from <urn:a> ; p:to <urn:b> ] ) .",
        );
        assert_eq!(props.edges, vec![WiringEdge::forward("urn:a", "urn:b")]);
    }

    #[test]
    fn test_malformed_wiring_drops_all_edges() {
        let props = properties(
            r#"
            <urn:p> a p:Pipeline ;
                p:steps [ p:stepList ( <urn:a> <urn:b> ) ] ;
                p:wiring [ p:from <urn:a> ; p:to <urn:b> ] ,
                         [ p:from <urn:a>, <urn:b> ; p:to <urn:b> ] .
            "#,
        );
        assert!(props.edges.is_empty());
        match props.wiring {
            Wiring::Malformed { reason, .. } => assert!(reason.contains("2 p:from values")),
            other => panic!("expected malformed wiring, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_endpoint() {
        let props = properties(
            "<urn:p> a p:Pipeline ; p:steps [ p:stepList ( <urn:a> ) ] ; p:wiring [ p:from <urn:a> ] .",
        );
        assert!(matches!(props.wiring, Wiring::Malformed { ref reason, .. } if reason == "missing p:to"));
    }
}
