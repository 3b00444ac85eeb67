// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the pa11y and veraPDF adapters
//!
//! Shell scripts stand in for the real tools.
#![cfg(unix)]

use remediationbot::config::ScanConfig;
use remediationbot::manifest::Manifest;
use remediationbot::scanner::process::check_dependencies;
use remediationbot::scanner::{
    scan_html, HtmlScanner, IssueType, Pa11yScanner, PdfValidator, ScanError, VeraPdfValidator,
};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn pa11y_config(program: &Path) -> ScanConfig {
    ScanConfig {
        pa11y_command: vec![program.display().to_string()],
        html_timeout_secs: 1,
        ..ScanConfig::default()
    }
}

const PA11Y_OUTPUT: &str = r#"[{"code":"WCAG2AA.Principle3.Guideline3_1.3_1_1.H57.2","type":"error","typeCode":1,"message":"The html element should have a lang attribute.","context":"<html>","selector":"html","runner":"htmlcs","runnerExtras":{}}]"#;

#[tokio::test]
async fn test_pa11y_findings_parsed_despite_nonzero_exit() {
    let dir = TempDir::new().unwrap();
    // pa11y exits 2 when it finds issues
    let tool = script(dir.path(), "pa11y", &format!("echo '{}'\nexit 2", PA11Y_OUTPUT));

    let findings = Pa11yScanner::new(&pa11y_config(&tool))
        .scan(Path::new("page.html"))
        .await
        .unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, IssueType::Error);
    assert_eq!(findings[0].selector.as_deref(), Some("html"));
}

#[tokio::test]
async fn test_pa11y_failures_become_per_file_errors() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("course");
    std::fs::create_dir_all(&root).unwrap();
    for page in ["a.html", "b.html", "c.html"] {
        std::fs::write(root.join(page), "<html></html>").unwrap();
    }
    // a.html hangs, b.html prints garbage, c.html is clean
    let tool = script(
        dir.path(),
        "pa11y",
        r#"case "$1" in
  *a.html) sleep 5 ;;
  *b.html) echo 'Welcome to pa11y' ;;
  *) echo '[]' ;;
esac"#,
    );

    let config = pa11y_config(&tool);
    let manifest = Manifest {
        html_files: vec!["a.html".into(), "b.html".into(), "c.html".into(), "gone.html".into()],
        ..Manifest::default()
    };

    let report = scan_html(&config, &manifest, &root, &Pa11yScanner::new(&config)).await;
    let report = report.completed().expect("scan enabled");

    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.files_with_issues, 0);
    assert_eq!(report.file_reports[0].error.as_deref(), Some("Scan timed out"));
    assert_eq!(report.file_reports[1].error.as_deref(), Some("Invalid JSON output"));
    assert_eq!(report.file_reports[2].error, None);
    assert_eq!(report.runners, vec!["axe", "htmlcs"]);
}

#[tokio::test]
async fn test_pa11y_stderr_surfaces_when_no_output() {
    let dir = TempDir::new().unwrap();
    let tool = script(dir.path(), "pa11y", "echo 'Error: net::ERR_FILE_NOT_FOUND' >&2\nexit 1");

    let result = Pa11yScanner::new(&pa11y_config(&tool)).scan(Path::new("page.html")).await;
    assert_eq!(result, Err(ScanError::ToolFailed("Error: net::ERR_FILE_NOT_FOUND".into())));
}

const VERAPDF_OUTPUT: &str = r#"{"report":{"jobs":[{"validationResult":{"compliant":false,"details":{"rules":[{"clause":"7.1","status":"failed","failedChecks":3,"description":"Content shall be tagged","test":"isTagged"}]}}}]}}"#;

#[tokio::test]
async fn test_verapdf_detected_among_candidates() {
    let dir = TempDir::new().unwrap();
    let tool = script(
        dir.path(),
        "verapdf",
        &format!(
            r#"if [ "$1" = "--version" ]; then echo 'veraPDF 1.26'; exit 0; fi
echo '{}'"#,
            VERAPDF_OUTPUT
        ),
    );

    let config = ScanConfig {
        verapdf_candidates: vec!["remediationbot-no-such-verapdf".into(), tool.display().to_string()],
        ..ScanConfig::default()
    };

    let validator = VeraPdfValidator::detect(&config).await.expect("second candidate answers");
    assert_eq!(validator.command(), tool.display().to_string());

    let validation = validator.validate(Path::new("syllabus.pdf")).await.unwrap();
    assert!(!validation.compliant);
    assert_eq!(validation.issues[0].failures, 3);

    let tools = check_dependencies(&ScanConfig {
        pa11y_command: vec!["remediationbot-no-such-npx".into()],
        ..config
    })
    .await;
    assert!(!tools.pa11y);
    assert_eq!(tools.verapdf, Some(tool.display().to_string()));
}

#[tokio::test]
async fn test_no_verapdf_candidates() {
    let config = ScanConfig {
        verapdf_candidates: vec!["remediationbot-no-such-verapdf".into()],
        ..ScanConfig::default()
    };
    assert!(VeraPdfValidator::detect(&config).await.is_none());
}
