// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Pipeline stages and their persisted artifacts.
//!
//! Each stage reads what the previous one wrote under the output directory,
//! so `scan` and `remediate` can be run separately:
//!
//! ```text
//! <output>/extracted/                   unpacked course package
//! <content>/content_manifest.json       file inventory
//! <output>/reports/pa11y_report.json
//! <output>/reports/verapdf_report.json
//! <output>/remediation/work_order.json
//! <output>/remediation/auto_fix_report.json
//! <output>/auto_fixed/<file>            repaired pages
//! ```

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{extract_archive, is_archive, CanvasExporter};
use crate::manifest::{build_manifest, Manifest};
use crate::remediation::autofix::FIX_REPORT_FILE;
use crate::remediation::{apply_auto_fixes, synthesize, FixReport, WorkOrder, WORK_ORDER_FILE};
use crate::scanner::{
    scan_html, scan_pdfs, HtmlReport, HtmlScanner, Pa11yScanner, PdfReport, PdfValidator, ScanReport,
    VeraPdfValidator, HTML_REPORT_FILE, PDF_REPORT_FILE,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Locations of every artifact under the output directory
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join("extracted")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    pub fn html_report(&self) -> PathBuf {
        self.reports_dir().join(HTML_REPORT_FILE)
    }

    pub fn pdf_report(&self) -> PathBuf {
        self.reports_dir().join(PDF_REPORT_FILE)
    }

    pub fn remediation_dir(&self) -> PathBuf {
        self.root.join("remediation")
    }

    pub fn work_order(&self) -> PathBuf {
        self.remediation_dir().join(WORK_ORDER_FILE)
    }

    pub fn fix_report(&self) -> PathBuf {
        self.remediation_dir().join(FIX_REPORT_FILE)
    }

    pub fn auto_fixed_dir(&self) -> PathBuf {
        self.root.join("auto_fixed")
    }
}

/// Both scan reports of one run
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub html: ScanReport<HtmlReport>,
    pub pdf: ScanReport<PdfReport>,
}

#[derive(Debug, Clone)]
pub struct RemediationOutcome {
    pub work_order: WorkOrder,
    pub fix_report: FixReport,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    debug!(path = %path.display(), "Wrote artifact");
    Ok(())
}

/// Load a persisted scan report; a missing report counts as skipped
fn read_scan_report<R: DeserializeOwned>(path: &Path) -> Result<ScanReport<R>> {
    if !path.exists() {
        warn!(path = %path.display(), "No scan report found, treating scan as skipped");
        return Ok(ScanReport::skipped());
    }
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Export the configured Canvas course into the output directory
pub async fn run_export(config: &Config) -> Result<PathBuf> {
    CanvasExporter::new(&config.canvas)?
        .export_course(&config.output_dir)
        .await
}

/// Resolve scan input to a content root, unpacking packages first.
///
/// A package replaces whatever an earlier run extracted, and its manifest
/// is rebuilt so the sidecar always describes the package just unpacked.
pub fn prepare_content(config: &Config, input: &Path) -> Result<PathBuf> {
    if is_archive(input) {
        let dest = OutputLayout::new(&config.output_dir).extracted_dir();
        if dest.exists() {
            debug!(path = %dest.display(), "Clearing previous extraction");
            std::fs::remove_dir_all(&dest)?;
        }
        extract_archive(input, &dest)?;
        build_manifest(&dest).save(&dest)?;
        return Ok(dest);
    }

    if input.is_dir() {
        return Ok(input.to_path_buf());
    }

    Err(Error::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} is neither a content directory nor a course package", input.display()),
    )))
}

/// Load the manifest sidecar, building and saving it when absent
pub fn load_or_build_manifest(root: &Path) -> Result<Manifest> {
    if let Some(manifest) = Manifest::load(root)? {
        debug!(files = manifest.len(), "Loaded existing manifest");
        return Ok(manifest);
    }
    let manifest = build_manifest(root);
    manifest.save(root)?;
    Ok(manifest)
}

/// Scan `root` with the given collaborators and persist both reports
pub async fn run_scan(
    config: &Config,
    root: &Path,
    scanner: &dyn HtmlScanner,
    validator: Option<&dyn PdfValidator>,
) -> Result<ScanOutcome> {
    let layout = OutputLayout::new(&config.output_dir);
    let manifest = load_or_build_manifest(root)?;

    let html = scan_html(&config.scan, &manifest, root, scanner).await;
    write_json(&layout.html_report(), &html)?;

    let pdf = scan_pdfs(&config.scan, &manifest, root, validator).await;
    write_json(&layout.pdf_report(), &pdf)?;

    info!(reports = %layout.reports_dir().display(), "Scan reports written");
    Ok(ScanOutcome { html, pdf })
}

/// Scan `root` with pa11y and whichever veraPDF is installed
pub async fn run_scan_with_tools(config: &Config, root: &Path) -> Result<ScanOutcome> {
    let scanner = Pa11yScanner::new(&config.scan);
    let validator = if config.scan.skip_pdf {
        None
    } else {
        VeraPdfValidator::detect(&config.scan).await
    };

    run_scan(
        config,
        root,
        &scanner,
        validator.as_ref().map(|v| v as &dyn PdfValidator),
    )
    .await
}

/// Build the work order from persisted reports, then apply safe repairs
pub fn run_remediate(config: &Config, root: &Path) -> Result<RemediationOutcome> {
    let layout = OutputLayout::new(&config.output_dir);
    let manifest = load_or_build_manifest(root)?;

    let html: ScanReport<HtmlReport> = read_scan_report(&layout.html_report())?;
    let pdf: ScanReport<PdfReport> = read_scan_report(&layout.pdf_report())?;

    let work_order = synthesize(config, root, &manifest, &html, &pdf);
    work_order.save(&layout.work_order())?;

    let fix_report = apply_auto_fixes(config, root, &work_order, &layout.auto_fixed_dir())?;
    fix_report.save(&layout.fix_report())?;

    info!(
        work_order = %layout.work_order().display(),
        files_fixed = fix_report.files_modified,
        "Remediation artifacts written"
    );

    Ok(RemediationOutcome { work_order, fix_report })
}

/// Export (when no input is given), extract, scan and remediate
pub async fn run_full(config: &Config, input: Option<&Path>) -> Result<RemediationOutcome> {
    let input = match input {
        Some(path) => path.to_path_buf(),
        None => run_export(config).await?,
    };

    let root = prepare_content(config, &input)?;
    run_scan_with_tools(config, &root).await?;
    run_remediate(config, &root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new("/out");
        assert_eq!(layout.html_report(), Path::new("/out/reports/pa11y_report.json"));
        assert_eq!(layout.pdf_report(), Path::new("/out/reports/verapdf_report.json"));
        assert_eq!(layout.work_order(), Path::new("/out/remediation/work_order.json"));
        assert_eq!(layout.fix_report(), Path::new("/out/remediation/auto_fix_report.json"));
        assert_eq!(layout.auto_fixed_dir(), Path::new("/out/auto_fixed"));
        assert_eq!(layout.extracted_dir(), Path::new("/out/extracted"));
    }

    #[test]
    fn test_prepare_content_rejects_missing_input() {
        let config = Config::default();
        assert!(prepare_content(&config, Path::new("/nonexistent/course")).is_err());
    }

    #[test]
    fn test_missing_reports_read_as_skipped() {
        let dir = TempDir::new().unwrap();
        let report: ScanReport<HtmlReport> = read_scan_report(&dir.path().join("none.json")).unwrap();
        assert!(report.is_skipped());
    }

    #[test]
    fn test_manifest_is_built_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.html"), "").unwrap();
        let first = load_or_build_manifest(dir.path()).unwrap();

        std::fs::write(dir.path().join("b.html"), "").unwrap();
        let second = load_or_build_manifest(dir.path()).unwrap();
        assert_eq!(first, second);
    }
}
