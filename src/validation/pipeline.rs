//! Whole-pipeline structural rules.
//!
//! Each rule looks at one pipeline at a time and reports what it finds.
//! Rules are independent: every rule runs on every pipeline no matter what
//! the others reported.

use crate::core::context::ValidationContext;
use crate::core::issue::{RuleId, ValidationIssue};
use crate::core::types::Identifier;
use crate::pipeline::model::{Pipeline, Pipelines, StreamInterface};
use crate::pipeline::properties::{PipelineProperties, Wiring};
use crate::pipeline::topology::WiringGraph;
use crate::validation::steps::ValidatedStep;
use indexmap::{IndexMap, IndexSet};
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;

/// Everything a rule may look at for one pipeline.
pub struct PipelineInput<'a> {
    pub pipeline: &'a Pipeline,
    pub properties: &'a PipelineProperties,
    /// Forward wiring restricted to the pipeline's own steps.
    pub wiring: WiringGraph,
    interfaces: &'a HashMap<Identifier, StreamInterface>,
}

impl PipelineInput<'_> {
    /// Declared interface of a step's operation or sub-pipeline.
    pub fn interface(&self, step: &Identifier) -> Option<&StreamInterface> {
        self.interfaces.get(step)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.properties.wiring, Wiring::Malformed { .. })
    }
}

/// One structural check.
pub trait PipelineRule: Send + Sync {
    /// Name of this rule, for logs.
    fn name(&self) -> &str;

    /// Check one pipeline, appending findings to `ctx`.
    fn check(&self, input: &PipelineInput<'_>, ctx: &ValidationContext);
}

/// Unparsable `p:wiring`.
pub struct MalformedWiringRule;

impl PipelineRule for MalformedWiringRule {
    fn name(&self) -> &str {
        "malformed wiring"
    }

    fn check(&self, input: &PipelineInput<'_>, ctx: &ValidationContext) {
        if let Wiring::Malformed { node, reason } = &input.properties.wiring {
            ctx.report(
                ValidationIssue::error(
                    RuleId::MalformedWiring,
                    input.pipeline.id.clone(),
                    format!("Wiring cannot be read: {}", reason),
                )
                .with_context(json!({ "node": node })),
            );
        }
    }
}

/// Wiring endpoints, entries and exits must be steps of the pipeline.
pub struct ForeignStepRule;

impl PipelineRule for ForeignStepRule {
    fn name(&self) -> &str {
        "foreign steps"
    }

    fn check(&self, input: &PipelineInput<'_>, ctx: &ValidationContext) {
        let props = input.properties;
        let mut referenced: IndexMap<&Identifier, &'static str> = IndexMap::new();
        for edge in &props.edges {
            referenced.entry(&edge.from).or_insert("wired");
            referenced.entry(&edge.to).or_insert("wired");
        }
        for entry in &props.entries {
            referenced.entry(entry).or_insert("declared as entry");
        }
        for exit in &props.exits {
            referenced.entry(exit).or_insert("declared as exit");
        }

        for (step, role) in referenced {
            if !input.pipeline.contains_step(step.as_str()) {
                ctx.report(
                    ValidationIssue::error(
                        RuleId::ForeignStep,
                        step.clone(),
                        format!("Step is {} in {} but is not one of its steps", role, input.pipeline.id),
                    )
                    .with_context(json!({ "pipeline": input.pipeline.id })),
                );
            }
        }
    }
}

/// Every step must be reachable from an entry step.
pub struct OrphanStepRule;

impl PipelineRule for OrphanStepRule {
    fn name(&self) -> &str {
        "orphan steps"
    }

    fn check(&self, input: &PipelineInput<'_>, ctx: &ValidationContext) {
        // Unreadable wiring is already an error; every step would look orphaned
        if input.is_malformed() {
            return;
        }
        let reachable = input.wiring.reachable_from(&input.properties.entries);
        for step in input.pipeline.step_ids() {
            if !reachable.contains(step) {
                ctx.report(
                    ValidationIssue::new(
                        ctx.config().severity.orphan_step,
                        RuleId::OrphanStep,
                        step.clone(),
                        "Step is not reachable from the entry step",
                    )
                    .with_context(json!({ "pipeline": input.pipeline.id })),
                );
            }
        }
    }
}

/// Forward edges must not form cycles.
pub struct CycleRule;

impl PipelineRule for CycleRule {
    fn name(&self) -> &str {
        "cycles"
    }

    fn check(&self, input: &PipelineInput<'_>, ctx: &ValidationContext) {
        for members in input.wiring.cycles() {
            let names: Vec<&str> = members.iter().map(Identifier::as_str).collect();
            ctx.report(
                ValidationIssue::error(
                    RuleId::Cycle,
                    input.pipeline.id.clone(),
                    format!("Wiring forms a cycle through {}", names.join(" -> ")),
                )
                .with_context(json!({ "members": names })),
            );
        }
    }
}

/// Exit steps have no outgoing forward edges, wherever those lead.
pub struct ExitHasSuccessorRule;

impl PipelineRule for ExitHasSuccessorRule {
    fn name(&self) -> &str {
        "exit successors"
    }

    fn check(&self, input: &PipelineInput<'_>, ctx: &ValidationContext) {
        // Declared edges, so successors outside the pipeline count too
        for exit in &input.properties.exits {
            let successors: IndexSet<&str> = input
                .properties
                .forward_edges()
                .filter(|e| e.from == *exit)
                .map(|e| e.to.as_str())
                .collect();
            if successors.is_empty() {
                continue;
            }
            let names: Vec<&str> = successors.into_iter().collect();
            ctx.report(
                ValidationIssue::new(
                    ctx.config().severity.exit_has_successor,
                    RuleId::ExitHasSuccessor,
                    exit.clone(),
                    format!("Exit step feeds {}", names.join(", ")),
                )
                .with_context(json!({ "pipeline": input.pipeline.id })),
            );
        }
    }
}

/// Connected steps must agree on their stream interfaces.
pub struct InterfaceRule;

impl PipelineRule for InterfaceRule {
    fn name(&self) -> &str {
        "stream interfaces"
    }

    fn check(&self, input: &PipelineInput<'_>, ctx: &ValidationContext) {
        let pipeline = &input.pipeline.id;
        let mut reported = IndexSet::new();
        for edge in input.properties.forward_edges() {
            let (Some(from), Some(to)) = (input.interface(&edge.from), input.interface(&edge.to)) else {
                continue;
            };

            if !from.is_readable() && reported.insert(&edge.from) {
                ctx.report(
                    ValidationIssue::error(
                        RuleId::InterfaceMismatch,
                        edge.from.clone(),
                        format!("Step feeds {} but is not readable", edge.to),
                    )
                    .with_context(json!({ "pipeline": pipeline })),
                );
            }
            if !to.is_writable() && reported.insert(&edge.to) {
                ctx.report(
                    ValidationIssue::error(
                        RuleId::InterfaceMismatch,
                        edge.to.clone(),
                        format!("Step is fed by {} but is not writable", edge.from),
                    )
                    .with_context(json!({ "pipeline": pipeline })),
                );
            }

            if let (Some(produced), Some(consumed)) = (from.readable, to.writable) {
                if produced != consumed {
                    ctx.report(
                        ValidationIssue::new(
                            ctx.config().severity.interface_object_mode,
                            RuleId::ObjectModeMismatch,
                            edge.to.clone(),
                            format!("Step consumes {} but {} produces {}", consumed, edge.from, produced),
                        )
                        .with_context(json!({ "pipeline": pipeline, "from": edge.from })),
                    );
                }
            }
        }
    }
}

/// A pipeline's own interface must match its entry and exit steps.
pub struct PipelineInterfaceRule;

impl PipelineRule for PipelineInterfaceRule {
    fn name(&self) -> &str {
        "pipeline interface"
    }

    fn check(&self, input: &PipelineInput<'_>, ctx: &ValidationContext) {
        let Some(interface) = input.pipeline.interface else {
            return;
        };
        let mismatch = |step: &Identifier, message: String| {
            ctx.report(
                ValidationIssue::error(RuleId::PipelineInterface, input.pipeline.id.clone(), message)
                    .with_context(json!({ "step": step })),
            );
        };

        if interface.is_readable() {
            for exit in &input.properties.exits {
                if input.interface(exit).is_some_and(|i| !i.is_readable()) {
                    mismatch(exit, format!("Pipeline is readable but its exit step {} is not", exit));
                }
            }
        }
        if interface.is_writable() {
            for entry in &input.properties.entries {
                if input.interface(entry).is_some_and(|i| !i.is_writable()) {
                    mismatch(entry, format!("Pipeline is writable but its entry step {} is not", entry));
                }
            }
        }
    }
}

/// Runs every rule over every pipeline.
pub struct PipelineValidator {
    rules: Vec<Box<dyn PipelineRule>>,
}

impl PipelineValidator {
    /// Create a validator with the given rules.
    pub fn new(rules: Vec<Box<dyn PipelineRule>>) -> Self {
        Self { rules }
    }

    /// All built-in rules.
    pub fn default_rules() -> Self {
        Self {
            rules: vec![
                Box::new(MalformedWiringRule),
                Box::new(ForeignStepRule),
                Box::new(OrphanStepRule),
                Box::new(CycleRule),
                Box::new(ExitHasSuccessorRule),
                Box::new(InterfaceRule),
                Box::new(PipelineInterfaceRule),
            ],
        }
    }

    /// Add a custom rule.
    pub fn add_rule(&mut self, rule: Box<dyn PipelineRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Check every pipeline that has extracted properties.
    pub fn validate(
        &self,
        pipelines: &Pipelines,
        properties: &IndexMap<Identifier, PipelineProperties>,
        steps: &[ValidatedStep],
        ctx: &ValidationContext,
    ) {
        let start = Instant::now();
        let interfaces: HashMap<Identifier, StreamInterface> = steps
            .iter()
            .filter_map(|v| v.interface.map(|i| (v.step.step.clone(), i)))
            .collect();

        for pipeline in pipelines.values() {
            let Some(props) = properties.get(&pipeline.id) else {
                continue;
            };
            let input = PipelineInput {
                pipeline,
                properties: props,
                wiring: WiringGraph::build(pipeline.step_ids(), &props.edges),
                interfaces: &interfaces,
            };
            for rule in &self.rules {
                let before = ctx.issues().len();
                rule.check(&input, ctx);
                let found = ctx.issues().len() - before;
                if found > 0 {
                    log::debug!("{}: {} finding(s) from {}", pipeline.id, found, rule.name());
                }
            }
        }
        log::debug!(
            "checked {} pipeline(s) with {} rule(s) in {:?}",
            pipelines.len(),
            self.rules.len(),
            start.elapsed()
        );
    }
}

impl Default for PipelineValidator {
    fn default() -> Self {
        Self::default_rules()
    }
}
