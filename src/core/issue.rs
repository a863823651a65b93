//! Validation issues and the append-only issue log.

use crate::core::types::Identifier;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    Info,
}

impl Level {
    /// Lowercase name used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which check produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    DocumentUnreadable,
    Syntax,
    PipelineNotFound,
    MalformedStepList,
    EmptyPipeline,
    MissingCodeLink,
    SchemaUnresolved,
    SchemaResolved,
    MissingParameter,
    Cardinality,
    KindMismatch,
    CoercibleKind,
    UnknownParameter,
    ExtraArgument,
    StepValid,
    ForeignStep,
    OrphanStep,
    Cycle,
    ExitHasSuccessor,
    MalformedWiring,
    InterfaceMismatch,
    ObjectModeMismatch,
    PipelineInterface,
}

impl RuleId {
    /// Kebab-case rule code, identical to the serialized form.
    pub fn code(&self) -> &'static str {
        match self {
            RuleId::DocumentUnreadable => "document-unreadable",
            RuleId::Syntax => "syntax",
            RuleId::PipelineNotFound => "pipeline-not-found",
            RuleId::MalformedStepList => "malformed-step-list",
            RuleId::EmptyPipeline => "empty-pipeline",
            RuleId::MissingCodeLink => "missing-code-link",
            RuleId::SchemaUnresolved => "schema-unresolved",
            RuleId::SchemaResolved => "schema-resolved",
            RuleId::MissingParameter => "missing-parameter",
            RuleId::Cardinality => "cardinality",
            RuleId::KindMismatch => "kind-mismatch",
            RuleId::CoercibleKind => "coercible-kind",
            RuleId::UnknownParameter => "unknown-parameter",
            RuleId::ExtraArgument => "extra-argument",
            RuleId::StepValid => "step-valid",
            RuleId::ForeignStep => "foreign-step",
            RuleId::OrphanStep => "orphan-step",
            RuleId::Cycle => "cycle",
            RuleId::ExitHasSuccessor => "exit-has-successor",
            RuleId::MalformedWiring => "malformed-wiring",
            RuleId::InterfaceMismatch => "interface-mismatch",
            RuleId::ObjectModeMismatch => "object-mode-mismatch",
            RuleId::PipelineInterface => "pipeline-interface",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One finding of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: Level,
    pub rule: RuleId,
    pub message: String,
    /// The entity the finding is about.
    pub subject: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl ValidationIssue {
    /// Create an issue at an explicit level.
    pub fn new(level: Level, rule: RuleId, subject: Identifier, message: impl Into<String>) -> Self {
        Self {
            level,
            rule,
            message: message.into(),
            subject,
            context: None,
        }
    }

    pub fn error(rule: RuleId, subject: Identifier, message: impl Into<String>) -> Self {
        Self::new(Level::Error, rule, subject, message)
    }

    pub fn warning(rule: RuleId, subject: Identifier, message: impl Into<String>) -> Self {
        Self::new(Level::Warning, rule, subject, message)
    }

    pub fn info(rule: RuleId, subject: Identifier, message: impl Into<String>) -> Self {
        Self::new(Level::Info, rule, subject, message)
    }

    /// Attach structured context.
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    /// The identity used to compare runs: level, subject and message.
    pub fn key(&self) -> (Level, &str, &str) {
        (self.level, self.subject.as_str(), &self.message)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.level, self.message, self.rule)
    }
}

/// Append-only log of issues, safe to share across concurrent stages.
#[derive(Debug, Default)]
pub struct IssueLog {
    issues: Mutex<Vec<ValidationIssue>>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one issue.
    pub fn push(&self, issue: ValidationIssue) {
        log::trace!("{} {}: {}", issue.level, issue.subject, issue.message);
        self.issues.lock().push(issue);
    }

    pub fn len(&self) -> usize {
        self.issues.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.lock().is_empty()
    }

    /// Count issues at a level.
    pub fn count(&self, level: Level) -> usize {
        self.issues.lock().iter().filter(|i| i.level == level).count()
    }

    /// Copy of the issues appended so far, in insertion order.
    pub fn snapshot(&self) -> Vec<ValidationIssue> {
        self.issues.lock().clone()
    }

    pub fn into_vec(self) -> Vec<ValidationIssue> {
        self.issues.into_inner()
    }
}
