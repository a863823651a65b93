//! In-memory triple store.
//!
//! The GraphStore is the central data structure every stage reads from. It is
//! built once by the loader and never mutated afterwards:
//! - triples are kept in insertion order (IndexSet) for deterministic iteration
//! - a subject index serves "objects of P for S"
//! - a (predicate, object) index serves "subjects with P = O"

use crate::core::error::{GraphError, GraphResult};
use crate::core::types::{Identifier, Term};
use crate::graph::vocab;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};

/// One assertion. Subjects are always IRIs or blank nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Identifier,
    pub predicate: Identifier,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Identifier, predicate: impl Into<Identifier>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

/// Immutable, indexed set of triples.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// IRI of the document the triples were read from.
    base: Option<Identifier>,
    triples: IndexSet<Triple>,
    by_subject: HashMap<Identifier, Vec<usize>>,
    by_predicate_object: HashMap<(Identifier, Term), Vec<usize>>,
}

impl GraphStore {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from triples. Duplicates are collapsed.
    pub fn from_triples(base: Option<Identifier>, triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut graph = Self {
            base,
            ..Self::default()
        };
        for triple in triples {
            let (index, inserted) = graph.triples.insert_full(triple);
            if !inserted {
                continue;
            }
            let Some(triple) = graph.triples.get_index(index) else {
                continue;
            };
            graph
                .by_subject
                .entry(triple.subject.clone())
                .or_default()
                .push(index);
            graph
                .by_predicate_object
                .entry((triple.predicate.clone(), triple.object.clone()))
                .or_default()
                .push(index);
        }
        graph
    }

    /// IRI of the source document, if known.
    pub fn base(&self) -> Option<&Identifier> {
        self.base.as_ref()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// All triples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// All objects of `predicate` for `subject`.
    pub fn objects<'a: 'p, 'p>(&'a self, subject: &str, predicate: &'p str) -> impl Iterator<Item = &'a Term> + 'p {
        let indices = self.by_subject.get(subject).map(Vec::as_slice).unwrap_or(&[]);
        indices
            .iter()
            .filter_map(move |&i| self.triples.get_index(i))
            .filter(move |t| t.predicate.as_str() == predicate)
            .map(|t| &t.object)
    }

    /// First object of `predicate` for `subject`.
    pub fn object(&self, subject: &str, predicate: &str) -> Option<&Term> {
        self.objects(subject, predicate).next()
    }

    /// All subjects having `predicate` with value `object`.
    pub fn subjects<'a>(&'a self, predicate: &str, object: &Term) -> impl Iterator<Item = &'a Identifier> + 'a {
        let key = (Identifier::new(predicate), object.clone());
        let indices = self
            .by_predicate_object
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        indices
            .iter()
            .filter_map(move |&i| self.triples.get_index(i))
            .map(|t| &t.subject)
    }

    /// Subjects typed `class`, in first-assertion order.
    pub fn instances_of<'a>(&'a self, class: &str) -> impl Iterator<Item = &'a Identifier> + 'a {
        self.subjects(vocab::RDF_TYPE, &Term::iri(class))
    }

    /// Whether the triple exists.
    pub fn contains(&self, subject: &str, predicate: &str, object: &Term) -> bool {
        self.objects(subject, predicate).any(|o| o == object)
    }

    /// Whether `subject` is typed `class`.
    pub fn has_type(&self, subject: &str, class: &str) -> bool {
        self.objects(subject, vocab::RDF_TYPE).any(|o| o.is_iri(class))
    }

    /// Whether any triple has `subject` as its subject.
    pub fn describes(&self, subject: &str) -> bool {
        self.by_subject.contains_key(subject)
    }

    /// Whether `term` is the head of an RDF collection.
    pub fn is_list(&self, term: &Term) -> bool {
        match term {
            Term::Iri(id) if id.as_str() == vocab::RDF_NIL => true,
            Term::Iri(id) | Term::Blank(id) => self.object(id.as_str(), vocab::RDF_FIRST).is_some(),
            Term::Literal(_) => false,
        }
    }

    /// Walk an RDF collection.
    ///
    /// On a malformed list the error carries no items; use [`list_prefix`](Self::list_prefix)
    /// to keep the well-formed part.
    pub fn list(&self, head: &Term) -> GraphResult<Vec<&Term>> {
        let (items, error) = self.list_prefix(head);
        match error {
            Some(error) => Err(error),
            None => Ok(items),
        }
    }

    /// Walk an RDF collection, returning the well-formed prefix and the
    /// first problem found. Never loops on cyclic lists.
    pub fn list_prefix(&self, head: &Term) -> (Vec<&Term>, Option<GraphError>) {
        let head_label = head.to_string();
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut current = head.clone();

        loop {
            let node = match &current {
                Term::Iri(id) if id.as_str() == vocab::RDF_NIL => return (items, None),
                Term::Iri(id) | Term::Blank(id) => id.clone(),
                Term::Literal(_) => {
                    return (items, Some(GraphError::LiteralList { head: head_label }));
                }
            };
            if !visited.insert(node.clone()) {
                return (items, Some(GraphError::CyclicList { head: head_label }));
            }
            let Some(first) = self.object(node.as_str(), vocab::RDF_FIRST) else {
                return (items, Some(GraphError::MissingFirst { head: head_label }));
            };
            items.push(first);

            let rests: Vec<&Term> = self.objects(node.as_str(), vocab::RDF_REST).collect();
            match rests.as_slice() {
                [rest] => current = (*rest).clone(),
                // A missing rdf:rest ends the list
                [] => return (items, None),
                _ => {
                    return (
                        items,
                        Some(GraphError::AmbiguousRest {
                            head: head_label,
                            count: rests.len(),
                        }),
                    );
                }
            }
        }
    }
}
