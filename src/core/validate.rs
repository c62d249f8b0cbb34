//! Violation accumulation shared by the validators.
//!
//! Validators never stop at the first problem: every rule records a pass or
//! a path-qualified violation into a [`ValidationReport`], and the report is
//! turned into the run's completion signal only after every rule has run.
//! Success is exactly "zero violations".

use crate::core::error::RolewireError;
use crate::core::output;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    /// Input document could not be read or parsed.
    Load,
    /// Well-formed but missing or invalid fields.
    Schema,
    /// Cross-document reference unresolved or mismatched.
    Referential,
    /// Disallowed path present or boundary declaration absent.
    Boundary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Human title, e.g. "Governance ownership".
    pub title: String,
    pub passed: u32,
    pub violations: Vec<Violation>,
    /// Extra context printed on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ValidationReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            passed: 0,
            violations: Vec::new(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn pass(&mut self) {
        self.passed += 1;
    }

    pub fn fail(&mut self, kind: ViolationKind, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(?kind, %message, "violation");
        self.violations.push(Violation { kind, message });
    }

    pub fn schema(&mut self, message: impl Into<String>) {
        self.fail(ViolationKind::Schema, message);
    }

    pub fn is_success(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn print(&self, format: OutputFormat) -> Result<(), RolewireError> {
        match format {
            OutputFormat::Json => {
                let body = serde_json::json!({
                    "title": self.title,
                    "success": self.is_success(),
                    "passed": self.passed,
                    "failed": self.violations.len(),
                    "violations": self.violations,
                    "detail": self.detail,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&body)
                        .map_err(|e| RolewireError::ValidationError(e.to_string()))?
                );
            }
            OutputFormat::Text => {
                if self.is_success() {
                    match &self.detail {
                        Some(d) => println!("{} validation passed ({}).", self.title, d),
                        None => println!("{} validation passed.", self.title),
                    }
                } else {
                    println!("{} validation failed:", self.title);
                    for v in &self.violations {
                        println!("  - {}", v.message);
                    }
                }
                println!(
                    "validate: summary pass={} fail={}",
                    self.passed,
                    self.violations.len()
                );
                if !self.is_success() {
                    println!(
                        "validate: failures {}: {}",
                        self.violations.len(),
                        output::preview_messages(&self.messages(), 2, 110)
                    );
                }
            }
        }
        Ok(())
    }

    pub fn into_result(self) -> Result<(), RolewireError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(RolewireError::ValidationError(format!(
                "{}: {} violation(s) found.",
                self.title,
                self.violations.len()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accumulates_and_counts() {
        let mut report = ValidationReport::new("Example");
        report.pass();
        report.schema("a.b: missing required key");
        report.fail(ViolationKind::Referential, "a.c: not found");
        assert!(!report.is_success());
        assert_eq!(report.passed, 1);
        assert_eq!(report.count(ViolationKind::Schema), 1);
        assert_eq!(report.count(ViolationKind::Referential), 1);
        assert_eq!(
            report.messages(),
            vec!["a.b: missing required key", "a.c: not found"]
        );
        let err = report.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Example: 2 violation(s) found."
        );
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = ValidationReport::new("Example").with_detail("a, b");
        assert!(report.is_success());
        assert!(report.into_result().is_ok());
    }
}
