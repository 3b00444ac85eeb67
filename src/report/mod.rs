// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Work order rendering.
//!
//! Supports multiple output formats:
//! - Text: summary and tasks grouped by remediation category
//! - JSON: the work order itself
//! - SARIF: one result per classified HTML issue and per failed PDF rule

use crate::classify::Category;
use crate::remediation::WorkOrder;
use crate::scanner::IssueType;
use serde::Serialize;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI integration
    Sarif,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Sarif => write!(f, "sarif"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render a work order in the requested format
pub fn generate_report(order: &WorkOrder, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(order),
        OutputFormat::Json => generate_json_report(order),
        OutputFormat::Sarif => generate_sarif_report(order),
    }
}

fn generate_text_report(order: &WorkOrder) -> String {
    let mut output = String::new();
    let summary = &order.summary;

    output.push_str("=== Remediationbot Work Order ===\n\n");
    output.push_str(&format!("Course: {}\n", order.course_info.title));
    output.push_str(&format!("Content: {}\n\n", order.course_info.content_dir));

    if order.task_count() == 0 {
        output.push_str("No accessibility issues found. Nothing to remediate.\n");
        return output;
    }

    output.push_str(&format!(
        "HTML issues: {} ({} auto-fixable, {} need judgment)\n",
        summary.total_html_issues, summary.auto_fixable, summary.needs_judgment
    ));
    output.push_str(&format!("PDF issues: {}\n\n", summary.total_pdf_issues));

    for category in Category::ALL {
        let entries: Vec<_> = order
            .html_tasks
            .iter()
            .flat_map(|task| task.issues.iter().map(move |issue| (task, issue)))
            .filter(|(_, issue)| issue.category == category)
            .collect();
        if entries.is_empty() {
            continue;
        }

        output.push_str(&format!("--- {} ({}) ---\n", category, entries.len()));
        for (task, issue) in entries {
            let marker = if issue.auto_fixable { " [auto-fix]" } else { "" };
            output.push_str(&format!("[{}]{} {}\n", issue.finding.code, marker, issue.finding.message));
            output.push_str(&format!("  File: {}\n", task.file));
            if !issue.remediation_hint.is_empty() {
                output.push_str(&format!("  Fix: {}\n", issue.remediation_hint));
            }
        }
        output.push('\n');
    }

    let images_needing_alt: usize = order
        .html_tasks
        .iter()
        .map(|t| t.images.iter().filter(|i| i.needs_alt).count())
        .sum();
    if images_needing_alt > 0 {
        output.push_str(&format!("Images needing alt text: {}\n\n", images_needing_alt));
    }

    if !order.pdf_tasks.is_empty() {
        output.push_str(&format!("--- pdf ({}) ---\n", order.pdf_tasks.len()));
        for task in &order.pdf_tasks {
            output.push_str(&format!("{}: {} failed rule(s)\n", task.file, task.issues.len()));
            for issue in &task.issues {
                output.push_str(&format!("  [{}] {} ({} check(s))\n", issue.rule, issue.description, issue.failures));
            }
        }
        output.push('\n');
    }

    output
}

fn generate_json_report(order: &WorkOrder) -> String {
    serde_json::to_string_pretty(order).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize work order: {}\"}}", e)
    })
}

/// SARIF report structure (simplified)
#[derive(Debug, Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: String,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
    properties: SarifProperties,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifProperties {
    category: String,
    auto_fixable: bool,
}

fn level_for(kind: IssueType) -> &'static str {
    match kind {
        IssueType::Error => "error",
        IssueType::Warning => "warning",
        IssueType::Notice | IssueType::Unknown => "note",
    }
}

fn location(file: &str) -> Vec<SarifLocation> {
    vec![SarifLocation {
        physical_location: SarifPhysicalLocation {
            artifact_location: SarifArtifactLocation { uri: file.to_string() },
        },
    }]
}

fn generate_sarif_report(order: &WorkOrder) -> String {
    let html_results = order.html_tasks.iter().flat_map(|task| {
        task.issues.iter().map(move |issue| SarifResult {
            rule_id: issue.finding.code.clone(),
            level: level_for(issue.finding.kind),
            message: SarifMessage { text: issue.finding.message.clone() },
            locations: location(&task.file),
            properties: SarifProperties {
                category: issue.category.to_string(),
                auto_fixable: issue.auto_fixable,
            },
        })
    });

    let pdf_results = order.pdf_tasks.iter().flat_map(|task| {
        task.issues.iter().map(move |issue| SarifResult {
            rule_id: format!("PDF/UA {}", issue.rule),
            level: "error",
            message: SarifMessage { text: issue.description.clone() },
            locations: location(&task.file),
            properties: SarifProperties {
                category: "pdf".to_string(),
                auto_fixable: false,
            },
        })
    });

    let report = SarifReport {
        schema: "https://json.schemastore.org/sarif-2.1.0.json".to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "remediationbot".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
            results: html_results.chain(pdf_results).collect(),
        }],
    };

    serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize SARIF report: {}\"}}", e)
    })
}
