//! Validator engine.
//!
//! Runs the stages of one validation in order over a single shared issue
//! log: load, resolve pipelines, extract and deduplicate code links, resolve
//! schemas, validate steps, extract properties, check pipelines. No stage
//! stops the run; whatever is found ends up in [`ValidationRun::issues`].

use crate::core::config::ValidatorConfig;
use crate::core::context::ValidationContext;
use crate::core::error::PipelintResult;
use crate::core::issue::{Level, ValidationIssue};
use crate::graph::loader;
use crate::graph::store::GraphStore;
use crate::pipeline::codelink::{extract_code_links, Dependencies};
use crate::pipeline::properties::extract_properties;
use crate::pipeline::resolver::PipelineResolver;
use crate::schema::manifest::{ManifestLocator, ManifestSchemaSource};
use crate::schema::resolver::SchemaResolver;
use crate::schema::source::{ChainedSource, DocumentSchemaSource, SchemaSource};
use crate::validation::pipeline::{PipelineRule, PipelineValidator};
use crate::validation::steps::StepValidator;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Statistics of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Triples in the loaded document.
    pub triples: usize,
    pub pipelines: usize,
    /// Step memberships across all pipelines.
    pub steps: usize,
    /// Distinct operations.
    pub operations: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Package manifests actually loaded.
    pub manifest_loads: u64,
    pub duration_ms: u64,
}

/// Result of one validation run.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    /// Every finding, in the order it was reported.
    pub issues: Vec<ValidationIssue>,
    pub stats: RunStats,
}

impl ValidationRun {
    pub fn count(&self, level: Level) -> usize {
        self.issues.iter().filter(|i| i.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Level::Error) > 0
    }

    /// Issues at any of `levels`, in report order.
    pub fn issues_at<'a>(&'a self, levels: &'a [Level]) -> impl Iterator<Item = &'a ValidationIssue> + 'a {
        self.issues.iter().filter(move |i| levels.contains(&i.level))
    }
}

/// Validates pipeline documents.
pub struct Validator {
    config: Arc<ValidatorConfig>,
    /// Extra schema sources, consulted after the document and before manifests.
    sources: Vec<Arc<dyn SchemaSource>>,
    rules: PipelineValidator,
}

impl Validator {
    /// Create a validator with the given configuration.
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config: Arc::new(config),
            sources: Vec::new(),
            rules: PipelineValidator::default_rules(),
        }
    }

    /// Validator configured from a TOML file.
    pub fn from_config_file(path: impl AsRef<Path>) -> PipelintResult<Self> {
        Ok(Self::new(ValidatorConfig::from_file(path)?))
    }

    /// Add a schema source.
    pub fn with_source(mut self, source: Arc<dyn SchemaSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a structural rule.
    pub fn with_rule(mut self, rule: Box<dyn PipelineRule>) -> Self {
        self.rules.add_rule(rule);
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate the document at `path`, optionally only pipeline `target`.
    pub async fn validate_path(&self, path: &Path, target: Option<&str>) -> ValidationRun {
        let start = Instant::now();
        let ctx = ValidationContext::new(self.config.clone());
        let graph = loader::load_path(path, &ctx).await;
        let document_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        self.run(Arc::new(graph), Some(document_dir), target, ctx, start).await
    }

    /// Validate a document held in memory. `base` is its IRI.
    pub async fn validate_str(&self, source: &str, base: Option<&str>, target: Option<&str>) -> ValidationRun {
        let start = Instant::now();
        let ctx = ValidationContext::new(self.config.clone());
        let graph = loader::load_str(source, base, &ctx);
        self.run(Arc::new(graph), None, target, ctx, start).await
    }

    async fn run(
        &self,
        graph: Arc<GraphStore>,
        document_dir: Option<&Path>,
        target: Option<&str>,
        ctx: ValidationContext,
        start: Instant,
    ) -> ValidationRun {
        let pipelines = PipelineResolver::new(&graph).resolve(target, &ctx);
        let links = extract_code_links(&graph, &pipelines, &ctx);
        let dependencies = Dependencies::collect(&links);
        let packages = dependencies.packages();
        if !packages.is_empty() {
            log::debug!("operations come from {} package(s): {:?}", packages.len(), packages);
        }

        let manifests = Arc::new(ManifestSchemaSource::new(ManifestLocator::from_config(
            &self.config.schema,
            document_dir,
        )));
        let mut chain = ChainedSource::new().with_source(Arc::new(DocumentSchemaSource::new(graph.clone())));
        for source in &self.sources {
            chain = chain.with_source(source.clone());
        }
        let chain = chain.with_source(manifests.clone());

        let schemas = SchemaResolver::new(Arc::new(chain))
            .with_max_concurrency(self.config.schema.max_concurrency)
            .resolve(&dependencies, &ctx)
            .await;

        let steps = StepValidator::new(&links, &schemas).validate(&pipelines, &ctx);
        let properties = extract_properties(&graph, &pipelines);
        self.rules.validate(&pipelines, &properties, &steps, &ctx);

        let stats = RunStats {
            triples: graph.len(),
            pipelines: pipelines.len(),
            steps: steps.len(),
            operations: schemas.len(),
            resolved: schemas.resolved_count(),
            unresolved: schemas.unresolved_count(),
            manifest_loads: manifests.cache_stats().loads,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        let issues = ctx.into_issues();
        log::info!(
            "validated {} pipeline(s): {} error(s), {} warning(s) in {}ms",
            stats.pipelines,
            issues.iter().filter(|i| i.level == Level::Error).count(),
            issues.iter().filter(|i| i.level == Level::Warning).count(),
            stats.duration_ms
        );
        ValidationRun { issues, stats }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::issue::RuleId;
    use crate::schema::registry::SchemaRegistry;
    use crate::schema::spec::{OperationSchema, ParameterSpec};
    use std::fs;

    const BASE: &str = "http://example.org/doc";

    const DOCUMENT: &str = r#"
        @prefix p: <https://pipeline.described.at/> .
        @prefix code: <https://code.described.at/> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

        <#main> a p:Pipeline ;
            p:steps [ p:stepList ( <#read> <#parse> <#x1> <#x2> <#lost> ) ] ;
            p:wiring [ p:from <#read> ; p:to <#parse> ] ,
                     [ p:from <#parse> ; p:to <#x1> ] ,
                     [ p:from <#x1> ; p:to <#x2> ] ;
            p:exit <#x2> .

        <#other> a p:Pipeline ; p:steps [ p:stepList ( <#x1> ) ] .

        <#read> code:implementedBy [ code:link <node:local#read> ] ;
            code:arguments ( "in.csv" ) .
        <#parse> code:implementedBy [ code:link <node:local#parse> ] ;
            code:arguments [ code:name "delimiter" ; code:value "," ] ,
                           [ code:name "quote" ; code:value "'" ] .
        <#x1> code:implementedBy [ code:link <node:missing#op> ] .
        <#x2> code:implementedBy [ code:link <node:missing#op> ] .
        <#lost> code:implementedBy [ code:link <node:local#parse> ] .

        <node:local#read> a p:Operation ;
            p:parameter [ p:name "path" ; p:minCount 1 ; p:maxCount 1 ; p:kind xsd:string ] .
        <node:local#parse> a p:Operation ;
            p:parameter [ p:name "delimiter" ; p:minCount 1 ; p:kind xsd:string ] .
    "#;

    async fn run(source: &str, target: Option<&str>) -> ValidationRun {
        Validator::default().validate_str(source, Some(BASE), target).await
    }

    fn subjects(run: &ValidationRun, rule: RuleId) -> Vec<String> {
        run.issues
            .iter()
            .filter(|i| i.rule == rule)
            .map(|i| i.subject.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_full_run() {
        let run = run(DOCUMENT, None).await;
        assert_eq!(run.stats.pipelines, 2);
        assert_eq!(run.stats.operations, 3);
        assert_eq!(run.stats.resolved, 2);
        assert_eq!(run.stats.unresolved, 1);

        assert_eq!(
            subjects(&run, RuleId::StepValid),
            vec![format!("{}#read", BASE), format!("{}#parse", BASE)]
        );
        assert_eq!(subjects(&run, RuleId::UnknownParameter), vec![format!("{}#parse", BASE)]);
        assert_eq!(subjects(&run, RuleId::MissingParameter), vec![format!("{}#lost", BASE)]);
        assert_eq!(subjects(&run, RuleId::OrphanStep), vec![format!("{}#lost", BASE)]);
        assert!(run.has_errors());
    }

    #[tokio::test]
    async fn test_partial_schema_failure() {
        let run = run(DOCUMENT, None).await;
        let mut unresolved = subjects(&run, RuleId::SchemaUnresolved);
        unresolved.sort();
        assert_eq!(unresolved, vec![format!("{}#x1", BASE), format!("{}#x2", BASE)]);

        for step in ["#x1", "#x2"] {
            let subject = format!("{}{}", BASE, step);
            let about: Vec<&ValidationIssue> = run
                .issues
                .iter()
                .filter(|i| i.subject.as_str() == subject)
                .collect();
            assert_eq!(about.len(), 1, "{:?}", about);
            assert!(about[0].message.contains("node:missing#op"));
        }
    }

    #[tokio::test]
    async fn test_idempotent() {
        let first = run(DOCUMENT, None).await;
        let second = run(DOCUMENT, None).await;
        let keys = |run: &ValidationRun| {
            let mut keys: Vec<(Level, String, String)> = run
                .issues
                .iter()
                .map(|i| (i.level, i.subject.to_string(), i.message.clone()))
                .collect();
            keys.sort();
            keys
        };
        assert!(!first.issues.is_empty());
        assert_eq!(keys(&first), keys(&second));
    }

    #[tokio::test]
    async fn test_missing_target() {
        let run = run(DOCUMENT, Some("#absent")).await;
        assert_eq!(run.stats.pipelines, 0);
        assert_eq!(run.issues.len(), 1);
        assert_eq!(run.issues[0].rule, RuleId::PipelineNotFound);
        assert_eq!(run.issues[0].level, Level::Error);
        assert!(run.issues[0].message.contains("#absent"));
    }

    #[tokio::test]
    async fn test_target_filter() {
        let run = run(DOCUMENT, Some("#other")).await;
        assert_eq!(run.stats.pipelines, 1);
        assert_eq!(run.stats.operations, 1);
        assert_eq!(subjects(&run, RuleId::SchemaUnresolved), vec![format!("{}#x1", BASE)]);
    }

    #[tokio::test]
    async fn test_target_filter_yields_one_pipeline() {
        let nested = r#"
            @prefix p: <https://pipeline.described.at/> .
            <#main> a p:Pipeline ; p:steps [ p:stepList ( <#sub> ) ] .
            <#sub> a p:Pipeline ; p:steps [ p:stepList ( <#inner> ) ] .
        "#;
        let filtered = run(nested, Some("#main")).await;
        assert_eq!(filtered.stats.pipelines, 1);
        assert_eq!(filtered.stats.steps, 1);
        assert!(subjects(&filtered, RuleId::MissingCodeLink).is_empty());

        let all = run(nested, None).await;
        assert_eq!(all.stats.pipelines, 2);
        assert_eq!(subjects(&all, RuleId::MissingCodeLink), vec![format!("{}#inner", BASE)]);
    }

    #[tokio::test]
    async fn test_registered_source() {
        let registry = SchemaRegistry::new().with(
            OperationSchema::new("node:missing#op").with_parameter(ParameterSpec::new("level").required()),
        );
        let validator = Validator::default().with_source(Arc::new(registry));
        let run = validator.validate_str(DOCUMENT, Some(BASE), None).await;
        assert_eq!(run.stats.unresolved, 0);
        let mut missing = subjects(&run, RuleId::MissingParameter);
        missing.sort();
        assert_eq!(
            missing,
            vec![format!("{}#lost", BASE), format!("{}#x1", BASE), format!("{}#x2", BASE)]
        );
    }

    #[tokio::test]
    async fn test_manifest_next_to_document() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("node_modules").join("csv-tools");
        fs::create_dir_all(&package).unwrap();
        fs::write(
            package.join("manifest.ttl"),
            r#"
            @prefix p: <https://pipeline.described.at/> .
            <node:csv-tools#parse> a p:Operation ; p:parameter [ p:name "delimiter" ; p:minCount 1 ] .
            <node:csv-tools#format> a p:Operation .
            "#,
        )
        .unwrap();
        let document = dir.path().join("pipeline.ttl");
        fs::write(
            &document,
            r#"
            @prefix p: <https://pipeline.described.at/> .
            @prefix code: <https://code.described.at/> .
            <#main> a p:Pipeline ; p:steps [ p:stepList ( <#a> <#b> ) ] .
            <#a> code:implementedBy [ code:link <node:csv-tools#parse> ] .
            <#b> code:implementedBy [ code:link <node:csv-tools#format> ] .
            "#,
        )
        .unwrap();

        let run = Validator::default().validate_path(&document, None).await;
        assert_eq!(run.stats.resolved, 2);
        assert_eq!(run.stats.manifest_loads, 1);
        let missing: Vec<&ValidationIssue> = run
            .issues
            .iter()
            .filter(|i| i.rule == RuleId::MissingParameter)
            .collect();
        assert_eq!(missing.len(), 1);
        assert!(missing[0].subject.as_str().ends_with("pipeline.ttl#a"));
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipelint.toml");
        fs::write(&path, "[schema]\nmax_concurrency = 2\n").unwrap();
        let validator = Validator::from_config_file(&path).unwrap();
        assert_eq!(validator.config().schema.max_concurrency, 2);

        fs::write(&path, "[schema]\nmax_concurrency = 0\n").unwrap();
        assert!(matches!(
            Validator::from_config_file(&path),
            Err(crate::core::error::PipelintError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let run = Validator::default()
            .validate_path(&dir.path().join("absent.ttl"), None)
            .await;
        assert_eq!(run.issues.len(), 1);
        assert_eq!(run.issues[0].rule, RuleId::DocumentUnreadable);
        assert_eq!(run.stats.pipelines, 0);
    }

    #[tokio::test]
    async fn test_syntax_errors_do_not_stop_the_run() {
        let source = format!("{}\n<#broken> p:steps [ .\n", DOCUMENT);
        let run = run(&source, None).await;
        assert_eq!(run.issues.iter().filter(|i| i.rule == RuleId::Syntax).count(), 1);
        assert_eq!(run.stats.pipelines, 2);
        assert_eq!(run.count(Level::Info), run.issues_at(&[Level::Info]).count());
    }
}
