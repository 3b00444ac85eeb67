// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Mechanical repairs that need no judgment.
//!
//! Repaired pages are written into a parallel tree; the content root is
//! never touched. The only repair today is the document language.

use super::{HtmlTask, WorkOrder};
use crate::classify::{Category, ClassifiedIssue};
use crate::config::Config;
use crate::encoding::read_text;
use crate::error::{Error, Result};
use lol_html::{element, HtmlRewriter, Settings};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use tracing::{debug, info, warn};

/// Fix report file name, written under the remediation directory
pub const FIX_REPORT_FILE: &str = "auto_fix_report.json";

/// One repair applied to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFix {
    pub file: String,
    pub fix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixReport {
    pub files_modified: usize,
    pub fixes: Vec<AppliedFix>,
}

impl FixReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "Saved auto-fix report");
        Ok(())
    }
}

/// Repairs with a known mechanical implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repair {
    DocumentLanguage,
}

impl Repair {
    fn for_issue(issue: &ClassifiedIssue) -> Option<Self> {
        match issue.category {
            Category::Language => Some(Repair::DocumentLanguage),
            _ => None,
        }
    }
}

/// Apply every defined repair for the work order's fixable issues.
///
/// Pages are read from `root` and, when at least one repair changed them,
/// written to the same relative path under `out_dir`.
pub fn apply_auto_fixes(config: &Config, root: &Path, work_order: &WorkOrder, out_dir: &Path) -> Result<FixReport> {
    let mut report = FixReport::default();

    for task in &work_order.html_tasks {
        let repairs = repairs_for(task);
        if repairs.is_empty() {
            continue;
        }

        if !is_contained(&task.file) {
            warn!(file = %task.file, "Task path escapes the content root, not fixed");
            continue;
        }

        let Some(mut html) = read_text(&root.join(&task.file), &config.remediation.encodings) else {
            warn!(file = %task.file, "Could not read page, not fixed");
            continue;
        };

        let mut applied = Vec::new();
        for repair in repairs {
            let outcome = match repair {
                Repair::DocumentLanguage => set_document_language(&html, &config.remediation.default_language),
            };
            match outcome {
                Ok(Some(rewritten)) => {
                    html = rewritten;
                    applied.push(AppliedFix {
                        file: task.file.clone(),
                        fix: format!(
                            "Added lang=\"{}\" to html element",
                            config.remediation.default_language
                        ),
                    });
                }
                Ok(None) => debug!(file = %task.file, ?repair, "Nothing to repair"),
                Err(e) => warn!(file = %task.file, error = %e, "Could not rewrite page"),
            }
        }

        if applied.is_empty() {
            continue;
        }

        let target = out_dir.join(&task.file);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, &html)?;
        debug!(path = %target.display(), fixes = applied.len(), "Wrote repaired page");

        report.files_modified += 1;
        report.fixes.extend(applied);
    }

    info!(
        files_modified = report.files_modified,
        fixes = report.fixes.len(),
        "Applied auto-fixes"
    );

    Ok(report)
}

/// Distinct repairs for a task, in first-seen order
fn repairs_for(task: &HtmlTask) -> Vec<Repair> {
    let mut repairs = Vec::new();
    for issue in task.auto_fixable_issues() {
        match Repair::for_issue(issue) {
            Some(r) if !repairs.contains(&r) => repairs.push(r),
            Some(_) => {}
            None => debug!(file = %task.file, code = %issue.finding.code, "No mechanical repair for issue"),
        }
    }
    repairs
}

/// Relative path made only of normal components
fn is_contained(rel_path: &str) -> bool {
    let path = Path::new(rel_path);
    !rel_path.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Charset declared by repaired pages, which are always written as UTF-8
const OUTPUT_CHARSET: &str = "utf-8";

/// Set `lang` on the root element when it is absent or blank.
///
/// Any charset declaration is rewritten to UTF-8 in the same pass, since a
/// page decoded from a legacy code page is written back as UTF-8. Returns
/// `None` when the markup already declares a language, so a second pass
/// over repaired output changes nothing.
pub fn set_document_language(html: &str, lang: &str) -> Result<Option<String>> {
    let mut changed = false;
    let mut output = Vec::with_capacity(html.len() + lang.len() + 8);

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("html", |el| {
                    let current = el.get_attribute("lang").unwrap_or_default();
                    if current.trim().is_empty() {
                        el.set_attribute("lang", lang)?;
                        changed = true;
                    }
                    Ok(())
                }),
                element!("meta[charset]", |el| {
                    el.set_attribute("charset", OUTPUT_CHARSET)?;
                    Ok(())
                }),
                element!("meta[http-equiv][content]", |el| {
                    let is_content_type = el
                        .get_attribute("http-equiv")
                        .is_some_and(|v| v.trim().eq_ignore_ascii_case("content-type"));
                    if is_content_type {
                        el.set_attribute("content", &format!("text/html; charset={}", OUTPUT_CHARSET))?;
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| Error::Rewrite(e.to_string()))?;
    rewriter.end().map_err(|e| Error::Rewrite(e.to_string()))?;

    if !changed {
        return Ok(None);
    }

    String::from_utf8(output)
        .map(Some)
        .map_err(|e| Error::Rewrite(e.to_string()))
}
