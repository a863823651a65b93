//! Presentation of a run's issues for the command line.
//!
//! The library never prints; these helpers turn an issue list into text or
//! JSON and decide the exit status.

use crate::core::error::PipelintResult;
use crate::core::issue::{Level, ValidationIssue};
use indexmap::IndexMap;
use std::fmt::Write;

/// Which levels get reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSelection {
    pub warnings: bool,
    pub info: bool,
}

impl LevelSelection {
    /// Errors always; warnings unless `quiet`; info when `verbose`.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        Self {
            warnings: !quiet,
            info: verbose,
        }
    }

    pub fn includes(&self, level: Level) -> bool {
        match level {
            Level::Error => true,
            Level::Warning => self.warnings,
            Level::Info => self.info,
        }
    }

    /// Reported issues, in report order.
    pub fn select<'a>(&self, issues: &'a [ValidationIssue]) -> Vec<&'a ValidationIssue> {
        issues.iter().filter(|i| self.includes(i.level)).collect()
    }
}

impl Default for LevelSelection {
    fn default() -> Self {
        Self::from_flags(false, false)
    }
}

/// Human-readable listing grouped by subject, subjects in first-report order.
pub fn render_text(issues: &[&ValidationIssue]) -> String {
    let mut groups: IndexMap<&str, Vec<&ValidationIssue>> = IndexMap::new();
    for issue in issues {
        groups.entry(issue.subject.as_str()).or_default().push(issue);
    }

    let mut out = String::new();
    for (subject, issues) in groups {
        let _ = writeln!(out, "{}", subject);
        for issue in issues {
            let _ = writeln!(out, "  {:<7} {} [{}]", issue.level.as_str(), issue.message, issue.rule);
        }
    }
    out
}

/// JSON array of the issues on a single line.
pub fn render_json(issues: &[&ValidationIssue]) -> PipelintResult<String> {
    Ok(serde_json::to_string(issues)?)
}

/// One-line count of errors, warnings and info.
pub fn summary(issues: &[ValidationIssue]) -> String {
    let count = |level| issues.iter().filter(|i| i.level == level).count();
    format!(
        "{} error(s), {} warning(s), {} info",
        count(Level::Error),
        count(Level::Warning),
        count(Level::Info)
    )
}

/// Whether the run should exit with a failure status.
///
/// Any error fails; under `strict` any warning fails too.
pub fn is_failure(issues: &[ValidationIssue], strict: bool) -> bool {
    issues
        .iter()
        .any(|i| i.level == Level::Error || (strict && i.level == Level::Warning))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::issue::RuleId;
    use crate::core::types::Identifier;

    fn issues() -> Vec<ValidationIssue> {
        vec![
            ValidationIssue::info(RuleId::StepValid, Identifier::new("urn:a"), "Step correctly binds 1 of 1 declared parameters"),
            ValidationIssue::warning(RuleId::OrphanStep, Identifier::new("urn:b"), "Step is not reachable from the entry step"),
            ValidationIssue::error(RuleId::MissingParameter, Identifier::new("urn:a"), "Missing required parameter 'path'"),
        ]
    }

    #[test]
    fn test_level_selection() {
        let all = issues();
        assert_eq!(LevelSelection::default().select(&all).len(), 2);
        assert_eq!(LevelSelection::from_flags(true, false).select(&all).len(), 1);
        assert_eq!(LevelSelection::from_flags(false, true).select(&all).len(), 3);
        assert_eq!(LevelSelection::from_flags(true, true).select(&all).len(), 2);
    }

    #[test]
    fn test_text_groups_by_subject() {
        let all = issues();
        let selected = LevelSelection::from_flags(false, true).select(&all);
        let text = render_text(&selected);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "urn:a");
        assert!(lines[1].starts_with("  info"));
        assert!(lines[2].starts_with("  error"));
        assert!(lines[2].ends_with("[missing-parameter]"));
        assert_eq!(lines[3], "urn:b");
    }

    #[test]
    fn test_json_output() {
        let all = issues();
        let json = render_json(&LevelSelection::default().select(&all)).unwrap();
        assert_eq!(json.lines().count(), 1);
        let parsed: Vec<ValidationIssue> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].rule, RuleId::OrphanStep);
    }

    #[test]
    fn test_exit_decision() {
        let all = issues();
        assert!(is_failure(&all, false));
        let warnings_only = &all[..2];
        assert!(!is_failure(warnings_only, false));
        assert!(is_failure(warnings_only, true));
        assert!(!is_failure(&all[..1], true));
        assert_eq!(summary(&all), "1 error(s), 1 warning(s), 1 info");
    }
}
