// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Content manifest: the typed inventory of an extracted course.
//!
//! Walks the content root once, buckets every file by extension and, when
//! the course package carries an `imsmanifest.xml`, records the course
//! outline from it. The manifest is persisted next to the content as
//! [`MANIFEST_FILE`] so later stages can run on their own.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Sidecar file name, written at the content root
pub const MANIFEST_FILE: &str = "content_manifest.json";

/// Course-structure descriptor shipped in IMS Common Cartridge packages
pub const STRUCTURE_FILE: &str = "imsmanifest.xml";

const HTML_EXTENSIONS: &[&str] = &["html", "htm"];
const PDF_EXTENSIONS: &[&str] = &["pdf"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

/// Kind of course file, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Html,
    Pdf,
    Image,
    Other,
}

impl FileKind {
    /// Classify a path by its (case-insensitive) extension
    pub fn of(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if HTML_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Html
        } else if PDF_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Pdf
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Image
        } else {
            FileKind::Other
        }
    }
}

/// One entry of the course outline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureItem {
    pub identifier: String,
    pub title: String,
    pub href: String,
}

/// Course outline parsed from the structure descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseStructure {
    pub title: String,
    pub items: Vec<StructureItem>,
}

/// Inventory of an extracted course
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    #[serde(alias = "html")]
    pub html_files: Vec<String>,
    #[serde(alias = "pdf")]
    pub pdf_files: Vec<String>,
    #[serde(alias = "image")]
    pub image_files: Vec<String>,
    #[serde(alias = "other")]
    pub other_files: Vec<String>,
    pub structure: CourseStructure,
}

impl Manifest {
    /// Add a relative path to the bucket for its kind
    pub fn add(&mut self, rel_path: String) {
        let bucket = match FileKind::of(Path::new(&rel_path)) {
            FileKind::Html => &mut self.html_files,
            FileKind::Pdf => &mut self.pdf_files,
            FileKind::Image => &mut self.image_files,
            FileKind::Other => &mut self.other_files,
        };
        bucket.push(rel_path);
    }

    /// Total number of inventoried files
    pub fn len(&self) -> usize {
        self.html_files.len() + self.pdf_files.len() + self.image_files.len() + self.other_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist the manifest as the sidecar file in `root`
    pub fn save(&self, root: &Path) -> Result<()> {
        let path = root.join(MANIFEST_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "Saved manifest");
        Ok(())
    }

    /// Load the sidecar from `root`, if one was written
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = root.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }
}

/// Build the manifest for a content root.
///
/// Entries are visited in file-name order, so two runs over an unchanged
/// tree produce identical buckets. The sidecar itself is never listed.
pub fn build_manifest(root: &Path) -> Manifest {
    let mut manifest = Manifest::default();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = match entry.path().strip_prefix(root) {
            Ok(p) => p,
            Err(_) => continue,
        };

        if rel_path == Path::new(MANIFEST_FILE) {
            continue;
        }

        manifest.add(rel_path.to_string_lossy().into_owned());
    }

    let descriptor = root.join(STRUCTURE_FILE);
    if descriptor.exists() {
        manifest.structure = parse_structure_file(&descriptor);
    }

    info!(
        html = manifest.html_files.len(),
        pdf = manifest.pdf_files.len(),
        images = manifest.image_files.len(),
        other = manifest.other_files.len(),
        "Built content manifest"
    );

    manifest
}

/// Parse the structure descriptor, degrading to an empty structure
fn parse_structure_file(path: &Path) -> CourseStructure {
    let xml = match std::fs::read_to_string(path) {
        Ok(x) => x,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read course structure");
            return CourseStructure::default();
        }
    };

    match parse_structure(&xml) {
        Ok(structure) => structure,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not parse course structure");
            CourseStructure::default()
        }
    }
}

/// Parse the course outline out of an `imsmanifest.xml` document
pub fn parse_structure(xml: &str) -> std::result::Result<CourseStructure, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;

    let title = doc
        .descendants()
        .find(|n| is_element_named(n, "title"))
        .map(|n| element_text(&n))
        .unwrap_or_default();

    let items = doc
        .descendants()
        .filter(|n| is_element_named(n, "item"))
        .map(|item| StructureItem {
            identifier: item.attribute("identifier").unwrap_or("").to_string(),
            title: item
                .descendants()
                .find(|n| is_element_named(n, "title"))
                .map(|n| element_text(&n))
                .unwrap_or_default(),
            href: item.attribute("identifierref").unwrap_or("").to_string(),
        })
        .collect();

    Ok(CourseStructure { title, items })
}

fn is_element_named(node: &roxmltree::Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn element_text(node: &roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}
