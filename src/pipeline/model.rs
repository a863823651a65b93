//! Pipeline model: pipelines, steps, parameter bindings and code links.

use crate::core::types::{BoundValue, Identifier};
use crate::graph::store::GraphStore;
use crate::graph::vocab;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a stream end carries data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMode {
    Bytes,
    Object,
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamMode::Bytes => f.write_str("byte mode"),
            StreamMode::Object => f.write_str("object mode"),
        }
    }
}

/// Declared stream interface of an operation or pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInterface {
    /// Mode of the readable side, if the entity produces data.
    pub readable: Option<StreamMode>,
    /// Mode of the writable side, if the entity consumes data.
    pub writable: Option<StreamMode>,
}

impl StreamInterface {
    /// Read the interface from the types of `subject`.
    ///
    /// `None` when no interface type is declared.
    pub fn from_graph(graph: &GraphStore, subject: &str) -> Option<Self> {
        let readable = if graph.has_type(subject, vocab::P_READABLE_OBJECT_MODE) {
            Some(StreamMode::Object)
        } else if graph.has_type(subject, vocab::P_READABLE) {
            Some(StreamMode::Bytes)
        } else {
            None
        };
        let writable = if graph.has_type(subject, vocab::P_WRITABLE_OBJECT_MODE) {
            Some(StreamMode::Object)
        } else if graph.has_type(subject, vocab::P_WRITABLE) {
            Some(StreamMode::Bytes)
        } else {
            None
        };
        (readable.is_some() || writable.is_some()).then_some(Self { readable, writable })
    }

    pub fn readable(mode: StreamMode) -> Self {
        Self {
            readable: Some(mode),
            writable: None,
        }
    }

    pub fn writable(mode: StreamMode) -> Self {
        Self {
            readable: None,
            writable: Some(mode),
        }
    }

    /// Readable and writable in the same mode.
    pub fn duplex(mode: StreamMode) -> Self {
        Self {
            readable: Some(mode),
            writable: Some(mode),
        }
    }

    pub fn is_readable(&self) -> bool {
        self.readable.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.writable.is_some()
    }
}

/// What a step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    /// Bound to an operation through a code link.
    Operation,
    /// Itself a pipeline.
    SubPipeline,
}

/// A step as a member of one pipeline.
///
/// One step node may be listed by several pipelines; each membership is a
/// distinct `StepRef`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepRef {
    pub pipeline: Identifier,
    pub step: Identifier,
}

impl StepRef {
    pub fn new(pipeline: Identifier, step: Identifier) -> Self {
        Self { pipeline, step }
    }
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (in {})", self.step, self.pipeline)
    }
}

/// Values a step binds to its operation's parameters.
///
/// Named bindings keep first-seen order; positional arguments keep list order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBindings {
    named: IndexMap<String, Vec<BoundValue>>,
    positional: Vec<BoundValue>,
}

impl ParameterBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value to a named parameter.
    pub fn bind(&mut self, name: impl Into<String>, value: BoundValue) {
        self.named.entry(name.into()).or_default().push(value);
    }

    /// Declare a named binding without a value.
    pub fn declare(&mut self, name: impl Into<String>) {
        self.named.entry(name.into()).or_default();
    }

    /// Append a positional argument.
    pub fn push_positional(&mut self, value: BoundValue) {
        self.positional.push(value);
    }

    /// Builder form of [`bind`](Self::bind).
    pub fn with(mut self, name: impl Into<String>, value: BoundValue) -> Self {
        self.bind(name, value);
        self
    }

    /// Builder form of [`push_positional`](Self::push_positional).
    pub fn with_positional(mut self, value: BoundValue) -> Self {
        self.push_positional(value);
        self
    }

    /// Values bound to `name` (empty if unbound).
    pub fn named(&self, name: &str) -> &[BoundValue] {
        self.named.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of the named bindings, in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    pub fn positional(&self) -> &[BoundValue] {
        &self.positional
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }
}

/// One step of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: Identifier,
    /// Pipeline whose step list names this step.
    pub pipeline: Identifier,
    /// Index in the step list.
    pub position: usize,
    pub kind: StepKind,
    pub bindings: ParameterBindings,
    /// Declared interface, only read for sub-pipeline steps.
    pub interface: Option<StreamInterface>,
}

impl Step {
    pub fn step_ref(&self) -> StepRef {
        StepRef::new(self.pipeline.clone(), self.id.clone())
    }

    pub fn is_sub_pipeline(&self) -> bool {
        self.kind == StepKind::SubPipeline
    }
}

/// A resolved pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: Identifier,
    /// Steps in step-list order.
    pub steps: Vec<Step>,
    pub interface: Option<StreamInterface>,
}

impl Pipeline {
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id.as_str() == id)
    }

    pub fn contains_step(&self, id: &str) -> bool {
        self.step(id).is_some()
    }

    pub fn step_ids(&self) -> impl Iterator<Item = &Identifier> {
        self.steps.iter().map(|s| &s.id)
    }

    pub fn first_step(&self) -> Option<&Identifier> {
        self.steps.first().map(|s| &s.id)
    }

    pub fn last_step(&self) -> Option<&Identifier> {
        self.steps.last().map(|s| &s.id)
    }
}

/// Resolved pipelines, in resolution order.
pub type Pipelines = IndexMap<Identifier, Pipeline>;

/// Identifier of the operation implementing a step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeLink(Identifier);

impl CodeLink {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &Identifier {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Package of a `node:` code link.
    ///
    /// `node:csv-tools#parse` is in `csv-tools`, `node:@scope/pkg/lib/x.js#f`
    /// is in `@scope/pkg`. Other schemes have no package.
    ///
    /// Segments that could leave a manifest directory (`.`, `..`, drive
    /// prefixes, backslashes) mean no package.
    pub fn package(&self) -> Option<String> {
        let rest = self.0.as_str().strip_prefix("node:")?;
        let path = rest.split('#').next().unwrap_or(rest);
        let mut segments = path.split('/');
        let first = segments.next()?;
        if let Some(scope) = first.strip_prefix('@') {
            let name = segments.next()?;
            (is_package_segment(scope) && is_package_segment(name)).then(|| format!("{}/{}", first, name))
        } else {
            is_package_segment(first).then(|| first.to_string())
        }
    }

    /// Exported symbol (the fragment), if any.
    pub fn export(&self) -> Option<&str> {
        self.0.as_str().split_once('#').map(|(_, fragment)| fragment)
    }
}

fn is_package_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains(['\\', ':'])
}

impl fmt::Display for CodeLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
