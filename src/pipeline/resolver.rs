//! Pipeline resolution.
//!
//! Finds pipeline definitions (subjects typed `p:Pipeline`) and materializes
//! them with their ordered steps and each step's parameter bindings.

use crate::core::context::ValidationContext;
use crate::core::issue::RuleId;
use crate::core::types::{BoundValue, Identifier, Term};
use crate::graph::store::GraphStore;
use crate::graph::vocab;
use crate::pipeline::model::{ParameterBindings, Pipeline, Pipelines, Step, StepKind, StreamInterface};
use indexmap::IndexSet;
use url::Url;

/// Nested argument lists deeper than this are kept as references.
const MAX_VALUE_DEPTH: usize = 16;

/// Resolves pipelines out of a loaded graph.
pub struct PipelineResolver<'g> {
    graph: &'g GraphStore,
}

impl<'g> PipelineResolver<'g> {
    pub fn new(graph: &'g GraphStore) -> Self {
        Self { graph }
    }

    /// Resolve every pipeline, or exactly one when `target` is given.
    ///
    /// An unknown target yields one `pipeline-not-found` error and an empty map.
    /// Sub-pipeline steps of the target keep their declared interface but
    /// their own pipelines are not resolved.
    pub fn resolve(&self, target: Option<&str>, ctx: &ValidationContext) -> Pipelines {
        let ids: Vec<Identifier> = match target {
            Some(target) => match self.find_pipeline(target) {
                Some(id) => vec![id],
                None => {
                    ctx.error(
                        RuleId::PipelineNotFound,
                        &Identifier::new(target),
                        format!("Pipeline {} not found", target),
                    );
                    return Pipelines::new();
                }
            },
            None => self.all_pipelines(),
        };

        let mut pipelines = Pipelines::new();
        for id in ids {
            let pipeline = self.materialize(&id, ctx);
            pipelines.insert(id, pipeline);
        }

        log::debug!(
            "resolved {} pipeline(s) with {} step(s)",
            pipelines.len(),
            pipelines.values().map(|p| p.steps.len()).sum::<usize>()
        );
        pipelines
    }

    /// All subjects typed `p:Pipeline`, in document order.
    pub fn all_pipelines(&self) -> Vec<Identifier> {
        self.graph
            .instances_of(vocab::P_PIPELINE)
            .cloned()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Match a requested identifier verbatim, then resolved against the document IRI.
    fn find_pipeline(&self, target: &str) -> Option<Identifier> {
        if self.graph.has_type(target, vocab::P_PIPELINE) {
            return Some(Identifier::new(target));
        }
        let base = Url::parse(self.graph.base()?.as_str()).ok()?;
        let resolved = base.join(target).ok()?;
        self.graph
            .has_type(resolved.as_str(), vocab::P_PIPELINE)
            .then(|| Identifier::new(resolved.as_str()))
    }

    fn materialize(&self, id: &Identifier, ctx: &ValidationContext) -> Pipeline {
        let steps = self
            .step_list(id, ctx)
            .into_iter()
            .enumerate()
            .map(|(position, step)| self.step(id, step, position))
            .collect();
        Pipeline {
            id: id.clone(),
            steps,
            interface: StreamInterface::from_graph(self.graph, id.as_str()),
        }
    }

    fn step_list(&self, pipeline: &Identifier, ctx: &ValidationContext) -> Vec<Identifier> {
        let containers: Vec<&Term> = self.graph.objects(pipeline.as_str(), vocab::P_STEPS).collect();
        if containers.is_empty() {
            ctx.warning(RuleId::EmptyPipeline, pipeline, "Pipeline declares no steps");
            return Vec::new();
        }

        let mut steps = IndexSet::new();
        for container in containers {
            let Some(container) = container.as_identifier() else {
                ctx.error(
                    RuleId::MalformedStepList,
                    pipeline,
                    format!("p:steps value {} is a literal", container),
                );
                continue;
            };
            let Some(list) = self.graph.object(container.as_str(), vocab::P_STEP_LIST) else {
                ctx.error(
                    RuleId::MalformedStepList,
                    pipeline,
                    format!("Steps node {} has no p:stepList", container),
                );
                continue;
            };

            let (items, problem) = self.graph.list_prefix(list);
            if let Some(problem) = problem {
                ctx.error(
                    RuleId::MalformedStepList,
                    pipeline,
                    format!("Malformed step list: {}", problem),
                );
            }
            for item in items {
                match item.as_identifier() {
                    Some(step) => {
                        if !steps.insert(step.clone()) {
                            ctx.error(
                                RuleId::MalformedStepList,
                                pipeline,
                                format!("Step {} is listed more than once", step),
                            );
                        }
                    }
                    None => ctx.error(
                        RuleId::MalformedStepList,
                        pipeline,
                        format!("Step list item {} is not a step", item),
                    ),
                }
            }
        }

        if steps.is_empty() {
            ctx.warning(RuleId::EmptyPipeline, pipeline, "Pipeline has an empty step list");
        }
        steps.into_iter().collect()
    }

    fn step(&self, pipeline: &Identifier, id: Identifier, position: usize) -> Step {
        let sub_pipeline = self.graph.has_type(id.as_str(), vocab::P_PIPELINE);
        let (kind, bindings, interface) = if sub_pipeline {
            (
                StepKind::SubPipeline,
                ParameterBindings::new(),
                StreamInterface::from_graph(self.graph, id.as_str()),
            )
        } else {
            (StepKind::Operation, self.bindings(id.as_str()), None)
        };
        Step {
            id,
            pipeline: pipeline.clone(),
            position,
            kind,
            bindings,
            interface,
        }
    }

    /// Read `code:arguments`: named nodes (`code:name`/`code:value`),
    /// lists of named nodes or positional values, or bare values.
    fn bindings(&self, step: &str) -> ParameterBindings {
        let mut bindings = ParameterBindings::new();
        for arguments in self.graph.objects(step, vocab::CODE_ARGUMENTS) {
            if self.graph.is_list(arguments) {
                let (items, _) = self.graph.list_prefix(arguments);
                for item in items {
                    self.argument(item, &mut bindings);
                }
            } else {
                self.argument(arguments, &mut bindings);
            }
        }
        bindings
    }

    fn argument(&self, term: &Term, bindings: &mut ParameterBindings) {
        let named = term.as_identifier().and_then(|node| {
            let name = self.graph.object(node.as_str(), vocab::CODE_NAME)?;
            let name = match name {
                Term::Literal(lit) => lit.lexical.to_string(),
                other => other.as_identifier()?.to_string(),
            };
            Some((node, name))
        });

        match named {
            Some((node, name)) => {
                bindings.declare(name.clone());
                for value in self.graph.objects(node.as_str(), vocab::CODE_VALUE) {
                    bindings.bind(name.clone(), self.value(value, 0));
                }
            }
            None => bindings.push_positional(self.value(term, 0)),
        }
    }

    fn value(&self, term: &Term, depth: usize) -> BoundValue {
        if depth < MAX_VALUE_DEPTH && self.graph.is_list(term) {
            let (items, _) = self.graph.list_prefix(term);
            return BoundValue::List(items.into_iter().map(|item| self.value(item, depth + 1)).collect());
        }
        BoundValue::from(term.clone())
    }
}
