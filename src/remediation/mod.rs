// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Remediation work order synthesis.
//!
//! Turns the two scan reports into one prioritized work order: a task per
//! HTML file with findings (classified issues, a content preview and image
//! context) and a task per PDF with failed rules. The work order is what
//! the judgment step downstream consumes; nothing here decides alt text.

pub mod autofix;

use crate::classify::{classify, ClassifiedIssue};
use crate::config::Config;
use crate::context::{extract_images, ImageReference};
use crate::encoding::read_text;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::scanner::{HtmlReport, PdfIssue, PdfReport, ScanReport};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

pub use autofix::{apply_auto_fixes, AppliedFix, FixReport};

/// Work order file name, written under the remediation directory
pub const WORK_ORDER_FILE: &str = "work_order.json";

/// Title used when the course structure has none
pub const UNKNOWN_COURSE: &str = "Unknown Course";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInfo {
    pub content_dir: String,
    pub title: String,
}

/// Remediation task for one HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlTask {
    pub file: String,
    /// Leading characters of the page, `None` when it could not be read
    pub content_preview: Option<String>,
    pub issues: Vec<ClassifiedIssue>,
    #[serde(default)]
    pub images: Vec<ImageReference>,
}

impl HtmlTask {
    pub fn auto_fixable_issues(&self) -> impl Iterator<Item = &ClassifiedIssue> {
        self.issues.iter().filter(|i| i.auto_fixable)
    }
}

/// Remediation task for one PDF, copied from its validation report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfTask {
    pub file: String,
    pub compliant: bool,
    pub issues: Vec<PdfIssue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_html_issues: usize,
    pub total_pdf_issues: usize,
    pub auto_fixable: usize,
    pub needs_judgment: usize,
}

impl Summary {
    fn count(&mut self, issue: &ClassifiedIssue) {
        self.total_html_issues += 1;
        if issue.auto_fixable {
            self.auto_fixable += 1;
        } else {
            self.needs_judgment += 1;
        }
    }
}

/// Everything the downstream remediation step needs for one course
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub course_info: CourseInfo,
    pub html_tasks: Vec<HtmlTask>,
    pub pdf_tasks: Vec<PdfTask>,
    pub summary: Summary,
}

impl WorkOrder {
    /// Persist as pretty JSON at `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "Saved work order");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn task_count(&self) -> usize {
        self.html_tasks.len() + self.pdf_tasks.len()
    }
}

/// Build the work order for the content at `root`.
///
/// Files whose scan produced no findings (including files whose scan
/// failed) never become tasks. The result carries no timestamps or ids, so
/// identical inputs give identical work orders.
pub fn synthesize(
    config: &Config,
    root: &Path,
    manifest: &Manifest,
    html_report: &ScanReport<HtmlReport>,
    pdf_report: &ScanReport<PdfReport>,
) -> WorkOrder {
    let title = if manifest.structure.title.is_empty() {
        UNKNOWN_COURSE.to_string()
    } else {
        manifest.structure.title.clone()
    };

    let mut order = WorkOrder {
        course_info: CourseInfo {
            content_dir: root.display().to_string(),
            title,
        },
        ..WorkOrder::default()
    };

    for file_report in html_report.file_reports() {
        if file_report.issues.is_empty() {
            continue;
        }

        let content = read_text(&root.join(&file_report.file), &config.remediation.encodings);
        if content.is_none() {
            warn!(file = %file_report.file, "Could not read page content, task has no preview");
        }

        let issues: Vec<ClassifiedIssue> = file_report.issues.iter().map(classify).collect();
        for issue in &issues {
            order.summary.count(issue);
        }

        let images = content
            .as_deref()
            .map(|html| extract_images(html, root, &file_report.file))
            .unwrap_or_default();

        order.html_tasks.push(HtmlTask {
            file: file_report.file.clone(),
            content_preview: content
                .as_deref()
                .map(|c| c.chars().take(config.remediation.preview_chars).collect()),
            issues,
            images,
        });
    }

    for file_report in pdf_report.file_reports() {
        if file_report.issues.is_empty() {
            continue;
        }

        order.summary.total_pdf_issues += file_report.issues.len();
        order.pdf_tasks.push(PdfTask {
            file: file_report.file.clone(),
            compliant: file_report.compliant.unwrap_or(false),
            issues: file_report.issues.clone(),
        });
    }

    info!(
        html_tasks = order.html_tasks.len(),
        pdf_tasks = order.pdf_tasks.len(),
        auto_fixable = order.summary.auto_fixable,
        needs_judgment = order.summary.needs_judgment,
        "Synthesized remediation work order"
    );

    order
}
