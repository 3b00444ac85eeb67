// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! veraPDF-backed PDF/UA validator

use super::process::{find_verapdf, run_tool};
use super::{PdfIssue, PdfValidation, PdfValidator, ScanError};
use crate::config::ScanConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Scanner identity recorded in PDF reports
pub const SCANNER_NAME: &str = "veraPDF";

/// Runs a located veraPDF binary once per file
pub struct VeraPdfValidator {
    command: String,
    profile: String,
    timeout: Duration,
}

impl VeraPdfValidator {
    pub fn new(command: impl Into<String>, config: &ScanConfig) -> Self {
        Self {
            command: command.into(),
            profile: config.verapdf_profile.clone(),
            timeout: config.pdf_timeout(),
        }
    }

    /// Locate veraPDF among the configured candidates.
    ///
    /// Returns `None` when no candidate answers, which turns the whole PDF
    /// report into a single report-wide error.
    pub async fn detect(config: &ScanConfig) -> Option<Self> {
        let command = find_verapdf(&config.verapdf_candidates).await?;
        info!(command = %command, "Using veraPDF");
        Some(Self::new(command, config))
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl PdfValidator for VeraPdfValidator {
    fn name(&self) -> &str {
        SCANNER_NAME
    }

    async fn validate(&self, path: &Path) -> Result<PdfValidation, ScanError> {
        let args = vec![
            "-f".to_string(),
            self.profile.clone(),
            "--format".to_string(),
            "json".to_string(),
            path.display().to_string(),
        ];

        debug!(file = %path.display(), "Running veraPDF");
        let output = run_tool(&self.command, &args, self.timeout)
            .await
            .map_err(|e| e.into_scan_error("veraPDF not installed"))?;

        match output.payload()? {
            Some(json) => parse_verapdf_output(json),
            None => Ok(PdfValidation::default()),
        }
    }
}

/// veraPDF wraps its jobs in `report`, except in some batch modes
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Wrapped { report: ReportBody },
    Bare(ReportBody),
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ReportBody {
    jobs: Vec<Job>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Job {
    validation_result: OneOrMany<ValidationResult>,
}

/// Newer releases emit one validation result per profile as an array
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(t) => vec![t],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ValidationResult {
    compliant: bool,
    details: Details,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Details {
    #[serde(alias = "ruleSummaries")]
    rules: Vec<Rule>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Rule {
    clause: String,
    status: String,
    description: String,
    test: String,
    failed_checks: u64,
}

/// Parse veraPDF JSON output.
///
/// Only rules with status `failed` become issues. A file is compliant only
/// when it produced at least one validation result and every result is
/// compliant. When jobs disagree this is stricter than taking the last
/// job's verdict: one failing job makes the file non-compliant even if a
/// later job passed.
pub fn parse_verapdf_output(json: &str) -> Result<PdfValidation, ScanError> {
    let envelope: Envelope = serde_json::from_str(json).map_err(|e| {
        debug!(error = %e, "Unparseable veraPDF output");
        ScanError::InvalidOutput
    })?;

    let body = match envelope {
        Envelope::Wrapped { report } | Envelope::Bare(report) => report,
    };

    let results: Vec<ValidationResult> = body
        .jobs
        .into_iter()
        .flat_map(|job| job.validation_result.into_vec())
        .collect();

    let compliant = !results.is_empty() && results.iter().all(|r| r.compliant);

    let issues = results
        .into_iter()
        .flat_map(|r| r.details.rules)
        .filter(|rule| rule.status == "failed")
        .map(|rule| PdfIssue {
            rule: rule.clause,
            description: rule.description,
            test: rule.test,
            failures: rule.failed_checks,
        })
        .collect();

    Ok(PdfValidation { compliant, issues })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NON_COMPLIANT: &str = r#"{
        "report": {
            "buildInformation": {},
            "jobs": [{
                "itemDetails": {"name": "/course/files/syllabus.pdf"},
                "validationResult": {
                    "profileName": "PDF/UA-1 validation profile",
                    "compliant": false,
                    "details": {
                        "passedRules": 100,
                        "failedRules": 2,
                        "rules": [
                            {"specification": "ISO 14289-1:2014", "clause": "7.1", "testNumber": 3,
                             "status": "failed", "failedChecks": 12,
                             "description": "Content shall be marked as Artifact or tagged as real content",
                             "test": "isTaggedContent == true"},
                            {"clause": "7.18.1", "status": "passed", "failedChecks": 0,
                             "description": "Annotations", "test": "true"},
                            {"clause": "7.2", "status": "failed", "failedChecks": 1,
                             "description": "Natural language shall be specified", "test": "Lang != null"}
                        ]
                    }
                }
            }]
        }
    }"#;

    #[test]
    fn test_failed_rules_become_issues() {
        let validation = parse_verapdf_output(NON_COMPLIANT).unwrap();
        assert!(!validation.compliant);
        assert_eq!(validation.issues.len(), 2);
        assert_eq!(
            validation.issues[0],
            PdfIssue {
                rule: "7.1".into(),
                description: "Content shall be marked as Artifact or tagged as real content".into(),
                test: "isTaggedContent == true".into(),
                failures: 12,
            }
        );
        assert_eq!(validation.issues[1].rule, "7.2");
    }

    #[test]
    fn test_compliant_bare_report() {
        let json = r#"{"jobs": [{"validationResult": {"compliant": true, "details": {"rules": []}}}]}"#;
        let validation = parse_verapdf_output(json).unwrap();
        assert!(validation.compliant);
        assert!(validation.issues.is_empty());
    }

    #[test]
    fn test_any_non_compliant_job_makes_file_non_compliant() {
        let json = r#"{"report": {"jobs": [
            {"validationResult": {"compliant": false, "details": {"rules": []}}},
            {"validationResult": {"compliant": true, "details": {"rules": []}}}
        ]}}"#;
        assert!(!parse_verapdf_output(json).unwrap().compliant);
    }

    #[test]
    fn test_validation_result_array_and_rule_summaries() {
        let json = r#"{"report": {"jobs": [{"validationResult": [
            {"compliant": false, "details": {"ruleSummaries": [
                {"clause": "5", "status": "failed", "failedChecks": 1, "description": "d", "test": "t"}
            ]}}
        ]}]}}"#;
        let validation = parse_verapdf_output(json).unwrap();
        assert_eq!(validation.issues.len(), 1);
        assert_eq!(validation.issues[0].rule, "5");
    }

    #[test]
    fn test_no_jobs_is_not_compliant() {
        let validation = parse_verapdf_output(r#"{"report": {"jobs": []}}"#).unwrap();
        assert!(!validation.compliant);
    }

    #[test]
    fn test_invalid_json() {
        assert_eq!(parse_verapdf_output("<xml/>"), Err(ScanError::InvalidOutput));
    }
}
