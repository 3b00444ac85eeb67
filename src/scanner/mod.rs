// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Scan aggregation for course content.
//!
//! Runs the external HTML scanner and PDF validator over the files named in
//! the manifest and folds their per-file results into one aggregate report
//! per scanner kind. A failure on one file is recorded on that file's report
//! and the batch carries on; the content root is only ever read.

pub mod pa11y;
pub mod process;
pub mod verapdf;

use crate::config::ScanConfig;
use crate::manifest::Manifest;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use pa11y::Pa11yScanner;
pub use verapdf::VeraPdfValidator;

/// Report file name for the HTML scanner
pub const HTML_REPORT_FILE: &str = "pa11y_report.json";

/// Report file name for the PDF validator
pub const PDF_REPORT_FILE: &str = "verapdf_report.json";

/// Finding type as reported by the HTML scanner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    #[default]
    Error,
    Warning,
    Notice,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueType::Error => write!(f, "error"),
            IssueType::Warning => write!(f, "warning"),
            IssueType::Notice => write!(f, "notice"),
            IssueType::Unknown => write!(f, "unknown"),
        }
    }
}

/// A single problem reported by the HTML scanner for one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFinding {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub code: String,
    #[serde(rename = "type", default)]
    pub kind: IssueType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    /// Markup snippet the scanner flagged
    #[serde(default, deserialize_with = "null_as_empty")]
    pub context: String,
    #[serde(default)]
    pub selector: Option<String>,
}

impl RawFinding {
    pub fn new(code: &str, kind: IssueType, message: &str) -> Self {
        Self {
            code: code.to_string(),
            kind,
            message: message.to_string(),
            context: String::new(),
            selector: None,
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = context.to_string();
        self
    }

    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A failed PDF/UA rule for one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfIssue {
    /// Specification clause of the rule
    pub rule: String,
    pub description: String,
    pub test: String,
    /// Number of failed checks for the rule
    pub failures: u64,
}

/// Validation outcome for one PDF
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfValidation {
    pub compliant: bool,
    pub issues: Vec<PdfIssue>,
}

/// Why a single file could not be scanned.
///
/// The display text is what lands in the file report's `error` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Scan timed out")]
    TimedOut,

    #[error("{0}")]
    ToolMissing(String),

    #[error("{0}")]
    ToolFailed(String),

    #[error("Invalid JSON output")]
    InvalidOutput,

    #[error("{0}")]
    Io(String),
}

/// Common view over per-file reports for counter folding
pub trait FileOutcome {
    fn file(&self) -> &str;
    fn issue_count(&self) -> usize;
    fn error(&self) -> Option<&str>;
}

/// Scan result for one HTML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlFileReport {
    pub file: String,
    #[serde(default)]
    pub issues: Vec<RawFinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HtmlFileReport {
    pub fn from_outcome(file: &str, outcome: Result<Vec<RawFinding>, ScanError>) -> Self {
        match outcome {
            Ok(issues) => Self { file: file.to_string(), issues, error: None },
            Err(e) => Self { file: file.to_string(), issues: Vec::new(), error: Some(e.to_string()) },
        }
    }
}

impl FileOutcome for HtmlFileReport {
    fn file(&self) -> &str {
        &self.file
    }

    fn issue_count(&self) -> usize {
        self.issues.len()
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Validation result for one PDF file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfFileReport {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliant: Option<bool>,
    #[serde(default)]
    pub issues: Vec<PdfIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PdfFileReport {
    pub fn from_outcome(file: &str, outcome: Result<PdfValidation, ScanError>) -> Self {
        match outcome {
            Ok(v) => Self {
                file: file.to_string(),
                compliant: Some(v.compliant),
                issues: v.issues,
                error: None,
            },
            Err(e) => Self {
                file: file.to_string(),
                compliant: None,
                issues: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

impl FileOutcome for PdfFileReport {
    fn file(&self) -> &str {
        &self.file
    }

    fn issue_count(&self) -> usize {
        self.issues.len()
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Aggregated results of one scanner over a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport<F> {
    pub scanner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runners: Vec<String>,
    pub files_scanned: usize,
    pub files_with_issues: usize,
    pub total_issues: usize,
    /// Occurrences per finding code (HTML only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_by_type: Option<BTreeMap<String, usize>>,
    /// Report-wide failure, e.g. the validator is not installed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default = "Vec::new")]
    pub file_reports: Vec<F>,
}

impl<F: FileOutcome> AggregateReport<F> {
    pub fn new(scanner: &str) -> Self {
        Self {
            scanner: scanner.to_string(),
            standard: None,
            profile: None,
            runners: Vec::new(),
            files_scanned: 0,
            files_with_issues: 0,
            total_issues: 0,
            issues_by_type: None,
            error: None,
            file_reports: Vec::new(),
        }
    }

    /// Fold one file's result into the counters
    pub fn record(&mut self, report: F) {
        self.files_scanned += 1;
        let count = report.issue_count();
        if count > 0 {
            self.files_with_issues += 1;
            self.total_issues += count;
        }
        if let Some(err) = report.error() {
            debug!(file = report.file(), error = err, "File scan failed");
        }
        self.file_reports.push(report);
    }

    /// Files whose scan itself failed
    pub fn failed_files(&self) -> Vec<&F> {
        self.file_reports.iter().filter(|r| r.error().is_some()).collect()
    }
}

pub type HtmlReport = AggregateReport<HtmlFileReport>;
pub type PdfReport = AggregateReport<PdfFileReport>;

/// A scanner's report, or the marker left when the scan was disabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanReport<R> {
    Skipped { skipped: bool },
    Completed(R),
}

impl<R> ScanReport<R> {
    pub fn skipped() -> Self {
        ScanReport::Skipped { skipped: true }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ScanReport::Skipped { .. })
    }

    pub fn completed(&self) -> Option<&R> {
        match self {
            ScanReport::Skipped { .. } => None,
            ScanReport::Completed(r) => Some(r),
        }
    }
}

impl<F> ScanReport<AggregateReport<F>> {
    /// Per-file reports, empty for a skipped scan
    pub fn file_reports(&self) -> &[F] {
        match self {
            ScanReport::Skipped { .. } => &[],
            ScanReport::Completed(r) => &r.file_reports,
        }
    }
}

/// Source of HTML findings for one file
#[async_trait]
pub trait HtmlScanner: Send + Sync {
    /// Scanner identity written into the report
    fn name(&self) -> &str;

    async fn scan(&self, path: &Path) -> Result<Vec<RawFinding>, ScanError>;
}

/// Source of PDF/UA validation results for one file
#[async_trait]
pub trait PdfValidator: Send + Sync {
    /// Validator identity written into the report
    fn name(&self) -> &str;

    async fn validate(&self, path: &Path) -> Result<PdfValidation, ScanError>;
}

/// Scan every HTML file in the manifest that exists under `root`
pub async fn scan_html(
    config: &ScanConfig,
    manifest: &Manifest,
    root: &Path,
    scanner: &dyn HtmlScanner,
) -> ScanReport<HtmlReport> {
    if config.skip_html {
        info!("Skipping HTML scan (disabled)");
        return ScanReport::skipped();
    }

    info!(files = manifest.html_files.len(), "Starting HTML accessibility scan");

    let mut report = HtmlReport::new(scanner.name());
    report.standard = Some(config.wcag_standard.clone());
    report.runners = config.pa11y_runners.clone();
    let mut by_code: BTreeMap<String, usize> = BTreeMap::new();

    for html_file in &manifest.html_files {
        let path = root.join(html_file);
        if !path.exists() {
            debug!(file = %html_file, "Listed file missing on disk, not scanned");
            continue;
        }

        let file_report = HtmlFileReport::from_outcome(html_file, scanner.scan(&path).await);
        for issue in &file_report.issues {
            let code = if issue.code.is_empty() { "unknown" } else { issue.code.as_str() };
            *by_code.entry(code.to_string()).or_insert(0) += 1;
        }
        report.record(file_report);
    }

    report.issues_by_type = Some(by_code);

    info!(
        total_issues = report.total_issues,
        files_with_issues = report.files_with_issues,
        files_scanned = report.files_scanned,
        failed = report.failed_files().len(),
        "HTML scan complete"
    );

    ScanReport::Completed(report)
}

/// Validate every PDF in the manifest that exists under `root`.
///
/// `validator` is `None` when no validator could be found on this machine;
/// the report then carries a report-wide error and zero counts.
pub async fn scan_pdfs(
    config: &ScanConfig,
    manifest: &Manifest,
    root: &Path,
    validator: Option<&dyn PdfValidator>,
) -> ScanReport<PdfReport> {
    if config.skip_pdf {
        info!("Skipping PDF scan (disabled)");
        return ScanReport::skipped();
    }

    let validator = match validator {
        Some(v) => v,
        None => {
            warn!("veraPDF not found - skipping PDF scan");
            let mut report = PdfReport::new(verapdf::SCANNER_NAME);
            report.profile = Some(config.verapdf_profile.clone());
            report.error = Some("veraPDF not installed".to_string());
            return ScanReport::Completed(report);
        }
    };

    info!(files = manifest.pdf_files.len(), "Starting PDF accessibility scan");

    let mut report = PdfReport::new(validator.name());
    report.profile = Some(config.verapdf_profile.clone());

    for pdf_file in &manifest.pdf_files {
        let path = root.join(pdf_file);
        if !path.exists() {
            debug!(file = %pdf_file, "Listed file missing on disk, not scanned");
            continue;
        }

        let outcome = validator.validate(&path).await;
        report.record(PdfFileReport::from_outcome(pdf_file, outcome));
    }

    info!(
        total_issues = report.total_issues,
        files_with_issues = report.files_with_issues,
        files_scanned = report.files_scanned,
        failed = report.failed_files().len(),
        "PDF scan complete"
    );

    ScanReport::Completed(report)
}
