//! Validation results and their aggregate report.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{TailorError, Result};
use crate::grid::FrameKey;
use crate::output::{display_path, plural, Printer};

/// Which check produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Classifier-matching pixels visible in a composited frame.
    Leak,
    /// Garment layer alone covering too little of the region.
    Thinness,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Leak => write!(f, "leak"),
            ValidationMode::Thinness => write!(f, "thinness"),
        }
    }
}

/// Outcome of validating one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub row: u32,
    pub col: u32,
    pub mode: ValidationMode,
    pub passed: bool,
    pub violation_count: usize,
    /// Exact `(x, y)` frame coordinates of every violation.
    pub violation_pixels: Vec<(u32, u32)>,
    /// Number of region pixels inspected.
    pub sampled: usize,
}

impl ValidationResult {
    pub fn new(
        key: FrameKey,
        mode: ValidationMode,
        passed: bool,
        sampled: usize,
        violation_pixels: Vec<(u32, u32)>,
    ) -> Self {
        Self {
            row: key.row,
            col: key.col,
            mode,
            passed,
            violation_count: violation_pixels.len(),
            violation_pixels,
            sampled,
        }
    }

    pub fn key(&self) -> FrameKey {
        FrameKey::new(self.row, self.col)
    }

    /// One-line description used for warnings.
    pub fn describe(&self) -> String {
        match self.mode {
            ValidationMode::Leak => format!(
                "frame {} has exposed skin ({} of {} pixels)",
                self.key(),
                self.violation_count,
                self.sampled
            ),
            ValidationMode::Thinness => format!(
                "frame {} coverage too thin ({} of {} sampled pixels uncovered)",
                self.key(),
                self.violation_count,
                self.sampled
            ),
        }
    }

    /// Violation coordinates as `x,y` pairs separated by spaces.
    pub fn coordinates(&self) -> String {
        self.violation_pixels
            .iter()
            .map(|(x, y)| format!("{},{}", x, y))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// All results from one tailoring pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    results: Vec<ValidationResult>,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    validated: usize,
    passed: usize,
    failed: usize,
    results: &'a [ValidationResult],
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ValidationResult) {
        self.results.push(result);
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.results.extend(other.results);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed).count()
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| !r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter()
    }

    pub fn to_json(&self) -> Result<String> {
        let doc = ReportJson {
            validated: self.len(),
            passed: self.passed_count(),
            failed: self.failed_count(),
            results: &self.results,
        };
        serde_json::to_string_pretty(&doc).map_err(|e| TailorError::Validation {
            message: format!("Failed to serialize validation report: {}", e),
            help: None,
        })
    }

    /// Write the report as JSON for repair tooling.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, json).map_err(|e| TailorError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to write validation report: {}", e),
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} validated, {} passed, {} failed",
            plural(self.len(), "frame", "frames"),
            self.passed_count(),
            self.failed_count()
        )
    }
}

/// Print the end-of-phase summary: one line per failed frame, then totals.
pub fn print_report(report: &ValidationReport, printer: &Printer) {
    if report.is_empty() {
        printer.info("Validated", "no frames in the validated rows");
        return;
    }

    for failure in report.failures() {
        printer.error("Failed", &failure.describe());
    }

    if report.has_failures() {
        printer.warning("Summary", &report.to_string());
    } else {
        printer.success("Passed", &format!("all {} validated", plural(report.len(), "frame", "frames")));
    }
}

/// Write the JSON report and say where it went.
pub fn write_report(report: &ValidationReport, path: &Path, printer: &Printer) -> Result<()> {
    report.write_json(path)?;
    printer.info("Report", &display_path(path));
    Ok(())
}
