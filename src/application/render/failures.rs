//! Per-run accumulation of failed pattern blocks.

use std::{fmt, path::PathBuf};

use serde::Serialize;

const SOURCE_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub block_id: usize,
    pub expected_artifact_path: PathBuf,
    pub truncated_source: String,
    /// Diagnostic text shown in place of the preview.
    pub error_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureReport {
    failures: Vec<FailureRecord>,
}

#[derive(Serialize)]
struct FailureManifest<'a> {
    count: usize,
    failures: &'a [FailureRecord],
}

impl FailureReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        block_id: usize,
        expected_artifact_path: impl Into<PathBuf>,
        source: &str,
        error_message: impl Into<String>,
    ) {
        self.failures.push(FailureRecord {
            block_id,
            expected_artifact_path: expected_artifact_path.into(),
            truncated_source: truncate_source(source),
            error_message: error_message.into(),
        });
    }

    pub fn records(&self) -> &[FailureRecord] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary for the named document.
    pub fn summary<'a>(&'a self, document: &'a str) -> FailureSummary<'a> {
        FailureSummary {
            report: self,
            document,
        }
    }

    /// JSON manifest: `{"count": n, "failures": [...]}`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&FailureManifest {
            count: self.failures.len(),
            failures: &self.failures,
        })
    }
}

pub struct FailureSummary<'a> {
    report: &'a FailureReport,
    document: &'a str,
}

impl fmt::Display for FailureSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.report.is_empty() {
            return write!(
                f,
                "All patterns generated successfully for {}",
                self.document
            );
        }

        writeln!(f, "FAILED PATTERNS in {}:", self.document)?;
        for failure in self.report.records() {
            writeln!(
                f,
                "  Pattern {}: {}",
                failure.block_id,
                failure.expected_artifact_path.display()
            )?;
            writeln!(f, "    Code: {}", failure.truncated_source)?;
        }
        write!(f, "  Total failed: {}", self.report.len())
    }
}

/// First 100 characters of the source, with `...` appended when cut.
pub fn truncate_source(source: &str) -> String {
    let mut chars = source.char_indices();
    match chars.nth(SOURCE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &source[..cut]),
        None => source.to_string(),
    }
}
