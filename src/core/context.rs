//! Validation context.
//!
//! One context is created per run and handed by reference to every stage. It
//! carries the configuration and the append-only issue log; stages never keep
//! any other shared mutable state.

use crate::core::config::ValidatorConfig;
use crate::core::issue::{IssueLog, Level, RuleId, ValidationIssue};
use crate::core::types::Identifier;
use std::sync::Arc;

/// Context shared by all stages of one validation run.
#[derive(Debug)]
pub struct ValidationContext {
    config: Arc<ValidatorConfig>,
    issues: IssueLog,
}

impl ValidationContext {
    /// Create a context for a run with the given configuration.
    pub fn new(config: Arc<ValidatorConfig>) -> Self {
        Self {
            config,
            issues: IssueLog::new(),
        }
    }

    /// Context with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(ValidatorConfig::default()))
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn issues(&self) -> &IssueLog {
        &self.issues
    }

    /// Append a fully built issue.
    pub fn report(&self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Append an issue at a level chosen by the caller (usually from the severity policy).
    pub fn emit(&self, level: Level, rule: RuleId, subject: &Identifier, message: impl Into<String>) {
        self.report(ValidationIssue::new(level, rule, subject.clone(), message));
    }

    pub fn error(&self, rule: RuleId, subject: &Identifier, message: impl Into<String>) {
        self.emit(Level::Error, rule, subject, message);
    }

    pub fn warning(&self, rule: RuleId, subject: &Identifier, message: impl Into<String>) {
        self.emit(Level::Warning, rule, subject, message);
    }

    pub fn info(&self, rule: RuleId, subject: &Identifier, message: impl Into<String>) {
        self.emit(Level::Info, rule, subject, message);
    }

    /// Number of error-level issues so far.
    pub fn error_count(&self) -> usize {
        self.issues.count(Level::Error)
    }

    /// Finish the run and take the issues in insertion order.
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues.into_vec()
    }
}
