//! Per-step parameter validation.
//!
//! Each operation step's bindings are checked against the schema of its
//! operation: occurrence counts, value kinds, undeclared names and surplus
//! positional arguments. Steps without a code link or whose schema did not
//! resolve were already reported and are only carried through so the
//! pipeline rules still see them.

use crate::core::context::ValidationContext;
use crate::core::issue::{Level, RuleId, ValidationIssue};
use crate::core::types::{BoundValue, Identifier};
use crate::pipeline::codelink::CodeLinks;
use crate::pipeline::model::{CodeLink, Pipelines, Step, StepKind, StepRef, StreamInterface};
use crate::schema::resolver::ResolvedSchemas;
use crate::schema::spec::{KindCheck, OperationSchema};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// How a step came out of parameter validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepOutcome {
    /// All bindings satisfy the schema (warnings allowed).
    Valid,
    /// At least one error-level finding.
    Invalid,
    /// No code link; not checked.
    Unbound,
    /// Schema unresolved; not checked.
    Unresolved,
    /// Sub-pipeline step; has no parameters.
    SubPipeline,
}

/// A step after parameter validation.
#[derive(Debug, Clone)]
pub struct ValidatedStep {
    pub step: StepRef,
    pub operation: Option<CodeLink>,
    pub schema: Option<Arc<OperationSchema>>,
    /// Stream interface of the operation or sub-pipeline, when declared.
    pub interface: Option<StreamInterface>,
    pub outcome: StepOutcome,
}

/// Checks step bindings against resolved schemas.
pub struct StepValidator<'a> {
    links: &'a CodeLinks,
    schemas: &'a ResolvedSchemas,
}

impl<'a> StepValidator<'a> {
    pub fn new(links: &'a CodeLinks, schemas: &'a ResolvedSchemas) -> Self {
        Self { links, schemas }
    }

    /// Validate every step of every pipeline.
    ///
    /// A step listed by several pipelines is checked once; each membership
    /// still gets its own [`ValidatedStep`].
    pub fn validate(&self, pipelines: &Pipelines, ctx: &ValidationContext) -> Vec<ValidatedStep> {
        let mut outcomes: HashMap<Identifier, StepOutcome> = HashMap::new();
        let mut validated = Vec::new();

        for step in pipelines.values().flat_map(|p| p.steps.iter()) {
            let step_ref = step.step_ref();
            let operation = self.links.get(&step_ref).cloned();
            let schema = operation.as_ref().and_then(|op| self.schemas.schema(op)).cloned();
            let interface = match step.kind {
                StepKind::SubPipeline => step.interface,
                StepKind::Operation => schema.as_ref().and_then(|s| s.interface),
            };

            let outcome = match outcomes.get(&step.id) {
                Some(outcome) => *outcome,
                None => {
                    let outcome = match (step.kind, &operation, &schema) {
                        (StepKind::SubPipeline, _, _) => StepOutcome::SubPipeline,
                        (StepKind::Operation, None, _) => StepOutcome::Unbound,
                        (StepKind::Operation, Some(_), None) => StepOutcome::Unresolved,
                        (StepKind::Operation, Some(op), Some(schema)) => check_step(step, op, schema, ctx),
                    };
                    outcomes.insert(step.id.clone(), outcome);
                    outcome
                }
            };

            validated.push(ValidatedStep {
                step: step_ref,
                operation,
                schema,
                interface,
                outcome,
            });
        }

        log::debug!(
            "validated {} distinct step(s), {} invalid",
            outcomes.len(),
            outcomes.values().filter(|o| **o == StepOutcome::Invalid).count()
        );
        validated
    }
}

/// Collects the findings of one step and counts its errors.
struct StepReport<'c> {
    ctx: &'c ValidationContext,
    step: &'c Step,
    operation: &'c CodeLink,
    errors: usize,
}

impl StepReport<'_> {
    fn emit(&mut self, level: Level, rule: RuleId, parameter: Option<&str>, message: String) {
        if level == Level::Error {
            self.errors += 1;
        }
        let mut context = json!({
            "pipeline": self.step.pipeline,
            "operation": self.operation.as_str(),
        });
        if let Some(parameter) = parameter {
            context["parameter"] = json!(parameter);
        }
        self.ctx
            .report(ValidationIssue::new(level, rule, self.step.id.clone(), message).with_context(context));
    }
}

fn check_step(step: &Step, operation: &CodeLink, schema: &OperationSchema, ctx: &ValidationContext) -> StepOutcome {
    let severity = &ctx.config().severity;
    let mut report = StepReport {
        ctx,
        step,
        operation,
        errors: 0,
    };

    // Positional arguments fill parameters in declaration order
    let positional = step.bindings.positional();
    for (index, value) in positional.iter().enumerate().skip(schema.parameters.len()) {
        report.emit(
            Level::Warning,
            RuleId::ExtraArgument,
            None,
            format!(
                "Extra positional argument #{} {}: {} declares {} parameter(s)",
                index + 1,
                value,
                operation,
                schema.parameters.len()
            ),
        );
    }

    let mut bound = 0;
    for (index, parameter) in schema.parameters.iter().enumerate() {
        let values: Vec<&BoundValue> = step
            .bindings
            .named(&parameter.name)
            .iter()
            .chain(positional.get(index))
            .flat_map(BoundValue::flatten)
            .collect();
        if !values.is_empty() {
            bound += 1;
        }

        if values.is_empty() && parameter.is_required() {
            report.emit(
                Level::Error,
                RuleId::MissingParameter,
                Some(&parameter.name),
                format!("Missing required parameter '{}'", parameter.name),
            );
        } else if !parameter.accepts_count(values.len()) {
            report.emit(
                Level::Error,
                RuleId::Cardinality,
                Some(&parameter.name),
                format!(
                    "Parameter '{}' has {} value(s), expected {}",
                    parameter.name,
                    values.len(),
                    parameter.range_label()
                ),
            );
        }

        for value in values {
            match parameter.kind.check(value) {
                KindCheck::Match => {}
                KindCheck::Coercible(note) => report.emit(
                    severity.coercible_kind,
                    RuleId::CoercibleKind,
                    Some(&parameter.name),
                    format!("Parameter '{}': {}", parameter.name, note),
                ),
                KindCheck::Mismatch(reason) => report.emit(
                    Level::Error,
                    RuleId::KindMismatch,
                    Some(&parameter.name),
                    format!("Parameter '{}': {}", parameter.name, reason),
                ),
            }
        }
    }

    for name in step.bindings.names() {
        if !schema.declares(name) {
            report.emit(
                severity.unknown_parameter,
                RuleId::UnknownParameter,
                Some(name),
                format!("Unknown parameter '{}' is not declared by {}", name, operation),
            );
        }
    }

    if report.errors > 0 {
        return StepOutcome::Invalid;
    }
    report.emit(
        Level::Info,
        RuleId::StepValid,
        None,
        format!(
            "Step correctly binds {} of {} declared parameters",
            bound,
            schema.parameters.len()
        ),
    );
    StepOutcome::Valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ValidatorConfig;
    use crate::graph::loader::load_str;
    use crate::graph::vocab;
    use crate::pipeline::codelink::{extract_code_links, Dependencies};
    use crate::pipeline::resolver::PipelineResolver;
    use crate::schema::registry::SchemaRegistry;
    use crate::schema::resolver::SchemaResolver;
    use crate::schema::spec::{ExpectedKind, ParameterSpec};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new().with(
            OperationSchema::new("node:csv#parse")
                .with_parameter(
                    ParameterSpec::new("path")
                        .required()
                        .with_kind(ExpectedKind::literal(vocab::XSD_STRING)),
                )
                .with_parameter(
                    ParameterSpec::new("columns")
                        .with_max(2)
                        .with_kind(ExpectedKind::literal(vocab::XSD_INTEGER)),
                ),
        )
    }

    async fn validate(body: &str, ctx: &ValidationContext) -> Vec<ValidatedStep> {
        let source = format!(
            "@prefix p: <https://pipeline.described.at/> .\n\
             @prefix code: <https://code.described.at/> .\n{}",
            body
        );
        let graph = load_str(&source, Some("http://example.org/doc"), ctx);
        let pipelines = PipelineResolver::new(&graph).resolve(None, ctx);
        let links = extract_code_links(&graph, &pipelines, ctx);
        let deps = Dependencies::collect(&links);
        let schemas = SchemaResolver::new(Arc::new(registry())).resolve(&deps, ctx).await;
        StepValidator::new(&links, &schemas).validate(&pipelines, ctx)
    }

    fn findings(ctx: ValidationContext, rule: RuleId) -> Vec<ValidationIssue> {
        ctx.into_issues().into_iter().filter(|i| i.rule == rule).collect()
    }

    #[tokio::test]
    async fn test_valid_step() {
        let ctx = ValidationContext::with_defaults();
        let steps = validate(
            r#"<#p> a p:Pipeline ; p:steps [ p:stepList ( <#s> ) ] .
               <#s> code:implementedBy [ code:link <node:csv#parse> ] ;
                    code:arguments ( "in.csv" [ code:name "columns" ; code:value ( 1 2 ) ] ) ."#,
            &ctx,
        )
        .await;
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].outcome, StepOutcome::Valid);
        assert!(steps[0].schema.is_some());

        let valid = findings(ctx, RuleId::StepValid);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].message, "Step correctly binds 2 of 2 declared parameters");
    }

    #[tokio::test]
    async fn test_missing_required_parameter() {
        let ctx = ValidationContext::with_defaults();
        let steps = validate(
            r#"<#p> a p:Pipeline ; p:steps [ p:stepList ( <#s> ) ] .
               <#s> code:implementedBy [ code:link <node:csv#parse> ] ."#,
            &ctx,
        )
        .await;
        assert_eq!(steps[0].outcome, StepOutcome::Invalid);

        let issues = ctx.into_issues();
        let missing: Vec<_> = issues.iter().filter(|i| i.rule == RuleId::MissingParameter).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].level, Level::Error);
        assert_eq!(missing[0].subject.as_str(), "http://example.org/doc#s");
        assert!(missing[0].message.contains("'path'"));
        assert!(!issues.iter().any(|i| i.rule == RuleId::StepValid));
    }

    #[tokio::test]
    async fn test_unknown_parameter_and_extra_argument() {
        let ctx = ValidationContext::with_defaults();
        let steps = validate(
            r#"<#p> a p:Pipeline ; p:steps [ p:stepList ( <#s> ) ] .
               <#s> code:implementedBy [ code:link <node:csv#parse> ] ;
                    code:arguments ( "in.csv" 3 "surplus" [ code:name "colour" ; code:value "red" ] ) ."#,
            &ctx,
        )
        .await;
        assert_eq!(steps[0].outcome, StepOutcome::Valid);

        let issues = ctx.into_issues();
        let unknown: Vec<_> = issues.iter().filter(|i| i.rule == RuleId::UnknownParameter).collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].level, Level::Warning);
        assert!(unknown[0].message.contains("'colour'"));

        let extra: Vec<_> = issues.iter().filter(|i| i.rule == RuleId::ExtraArgument).collect();
        assert_eq!(extra.len(), 1);
        assert!(extra[0].message.contains("#3"));
    }

    #[tokio::test]
    async fn test_cardinality_and_kinds() {
        let ctx = ValidationContext::with_defaults();
        validate(
            r#"<#p> a p:Pipeline ; p:steps [ p:stepList ( <#s> ) ] .
               <#s> code:implementedBy [ code:link <node:csv#parse> ] ;
                    code:arguments [ code:name "path" ; code:value "a.csv" ] ,
                                   [ code:name "columns" ; code:value ( 1 "2" "x" ) ] ."#,
            &ctx,
        )
        .await;
        let issues = ctx.into_issues();
        let rules: Vec<(RuleId, Level)> = issues
            .iter()
            .filter(|i| i.rule != RuleId::SchemaResolved)
            .map(|i| (i.rule, i.level))
            .collect();
        assert_eq!(
            rules,
            vec![
                (RuleId::Cardinality, Level::Error),
                (RuleId::CoercibleKind, Level::Warning),
                (RuleId::KindMismatch, Level::Error),
            ]
        );
    }

    #[tokio::test]
    async fn test_large_integer_argument() {
        let ctx = ValidationContext::with_defaults();
        let steps = validate(
            r#"<#p> a p:Pipeline ; p:steps [ p:stepList ( <#s> ) ] .
               <#s> code:implementedBy [ code:link <node:csv#parse> ] ;
                    code:arguments ( "in.csv" 123456789012345678901234 ) ."#,
            &ctx,
        )
        .await;
        assert_eq!(steps[0].outcome, StepOutcome::Valid);
        let issues = ctx.into_issues();
        assert!(!issues.iter().any(|i| i.rule == RuleId::KindMismatch), "{:?}", issues);
    }

    #[tokio::test]
    async fn test_coercible_severity_is_configurable() {
        let config = ValidatorConfig::new().with_coercible_kind(Level::Error);
        let ctx = ValidationContext::new(Arc::new(config));
        let steps = validate(
            r#"<#p> a p:Pipeline ; p:steps [ p:stepList ( <#s> ) ] .
               <#s> code:implementedBy [ code:link <node:csv#parse> ] ;
                    code:arguments ( "in.csv" "1" ) ."#,
            &ctx,
        )
        .await;
        assert_eq!(steps[0].outcome, StepOutcome::Invalid);
        let coercible = findings(ctx, RuleId::CoercibleKind);
        assert_eq!(coercible.len(), 1);
        assert_eq!(coercible[0].level, Level::Error);
    }

    #[tokio::test]
    async fn test_unbound_unresolved_and_shared_steps() {
        let ctx = ValidationContext::with_defaults();
        let steps = validate(
            r#"<#a> a p:Pipeline ; p:steps [ p:stepList ( <#s> <#bare> <#other> <#sub> ) ] .
               <#b> a p:Pipeline ; p:steps [ p:stepList ( <#s> ) ] .
               <#sub> a p:Pipeline, p:Readable ; p:steps [ p:stepList ( <#s> ) ] .
               <#s> code:implementedBy [ code:link <node:csv#parse> ] .
               <#other> code:implementedBy [ code:link <node:nowhere#op> ] ."#,
            &ctx,
        )
        .await;

        let outcomes: Vec<(&str, StepOutcome)> = steps
            .iter()
            .map(|v| (v.step.step.as_str(), v.outcome))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("http://example.org/doc#s", StepOutcome::Invalid),
                ("http://example.org/doc#bare", StepOutcome::Unbound),
                ("http://example.org/doc#other", StepOutcome::Unresolved),
                ("http://example.org/doc#sub", StepOutcome::SubPipeline),
                ("http://example.org/doc#s", StepOutcome::Invalid),
                ("http://example.org/doc#s", StepOutcome::Invalid),
            ]
        );
        assert!(steps[3].interface.is_some_and(|i| i.is_readable()));

        let issues = ctx.into_issues();
        // checked once although listed three times
        assert_eq!(issues.iter().filter(|i| i.rule == RuleId::MissingParameter).count(), 1);
        let unresolved: Vec<_> = issues.iter().filter(|i| i.rule == RuleId::SchemaUnresolved).collect();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].subject.as_str(), "http://example.org/doc#other");
        assert!(!issues
            .iter()
            .any(|i| i.subject.as_str() == "http://example.org/doc#other" && i.rule == RuleId::Cardinality));
    }
}
