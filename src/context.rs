// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Image context extraction - material for WCAG 1.1.1 alt text decisions
//!
//! For every `<img>` in a page, records where the image lives on disk,
//! whether it still needs alt text, and the nearby text a reviewer (or a
//! model) would use to describe it:
//! - text of the image's immediate container (first 200 characters)
//! - the `<figcaption>` of an enclosing `<figure>`
//! - the image's `title` attribute

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Characters of container text kept in the context string
const SURROUNDING_TEXT_CHARS: usize = 200;

const CONTEXT_SEPARATOR: &str = " | ";

/// Source prefixes that are never resolved against the content root
const EXTERNAL_PREFIXES: &[&str] = &["http://", "https://", "//", "data:"];

/// One image in a page, with what is needed to write its alt text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// `src` attribute as written (empty when absent)
    pub src: String,
    pub current_alt: Option<String>,
    pub needs_alt: bool,
    /// Resolved on-disk location, when the asset exists locally
    pub path: Option<String>,
    pub context: String,
}

/// Alt text is missing, empty, or just repeats the source
pub fn needs_alt(alt: Option<&str>, src: &str) -> bool {
    match alt {
        None => true,
        Some(a) => a.is_empty() || a == src,
    }
}

/// Extract every image of `html`, a page at `html_file` relative to `root`
pub fn extract_images(html: &str, root: &Path, html_file: &str) -> Vec<ImageReference> {
    let document = Html::parse_document(html);
    let img_selector = Selector::parse("img").expect("valid selector");

    document
        .select(&img_selector)
        .map(|img| {
            let src = img.value().attr("src").unwrap_or("").to_string();
            let alt = img.value().attr("alt");

            ImageReference {
                needs_alt: needs_alt(alt, &src),
                current_alt: alt.map(str::to_string),
                path: resolve_image(root, html_file, &src),
                context: image_context(&img),
                src,
            }
        })
        .collect()
}

/// Locate `src` next to the page first, then at the content root.
///
/// A leading `/` is relative to the content root, and candidates that would
/// leave the root are never checked.
pub fn resolve_image(root: &Path, html_file: &str, src: &str) -> Option<String> {
    if src.is_empty() || EXTERNAL_PREFIXES.iter().any(|p| src.starts_with(p)) {
        return None;
    }

    // query and fragment never name part of the file
    let local = src.split(['?', '#']).next().unwrap_or(src);
    let local = local.trim_start_matches('/');
    if local.is_empty() {
        return None;
    }

    let html_dir = Path::new(html_file).parent().unwrap_or_else(|| Path::new(""));
    let candidates = [html_dir.join(local), PathBuf::from(local)];

    candidates
        .iter()
        .filter_map(|rel| normalize_within_root(rel))
        .map(|rel| root.join(rel))
        .find(|p| p.is_file())
        .map(|p| p.display().to_string())
}

/// Lexically resolve `.` and `..` in a root-relative path; `None` once it
/// climbs above the root or names an absolute location
fn normalize_within_root(rel: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

/// Human-readable context for one image; empty when nothing is nearby
pub fn image_context(img: &ElementRef<'_>) -> String {
    let mut parts = Vec::new();

    if let Some(parent) = img.parent().and_then(ElementRef::wrap) {
        let text: String = stripped_text(&parent).chars().take(SURROUNDING_TEXT_CHARS).collect();
        if !text.is_empty() {
            parts.push(format!("Surrounding text: {}", text));
        }
    }

    let figure = img
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "figure");
    if let Some(figure) = figure {
        let caption_selector = Selector::parse("figcaption").expect("valid selector");
        if let Some(caption) = figure.select(&caption_selector).next() {
            parts.push(format!("Caption: {}", stripped_text(&caption)));
        }
    }

    if let Some(title) = img.value().attr("title").filter(|t| !t.is_empty()) {
        parts.push(format!("Title: {}", title));
    }

    parts.join(CONTEXT_SEPARATOR)
}

/// Descendant text with each fragment trimmed and blanks dropped
fn stripped_text(el: &ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_needs_alt_rules() {
        assert!(needs_alt(None, "a.png"));
        assert!(needs_alt(Some(""), "a.png"));
        assert!(needs_alt(Some("a.png"), "a.png"));
        assert!(!needs_alt(Some("Wind farm at dusk"), "a.png"));
    }

    #[test]
    fn test_caption_context_for_empty_alt() {
        let html = r#"<html><body>
            <figure>
                <img src="turbine.png" alt="">
                <figcaption>Figure 3: turbine layout</figcaption>
            </figure>
        </body></html>"#;
        let images = extract_images(html, Path::new("/nonexistent"), "wiki_content/page.html");

        assert_eq!(images.len(), 1);
        assert!(images[0].needs_alt);
        assert_eq!(images[0].current_alt.as_deref(), Some(""));
        assert!(images[0].context.contains("Caption: Figure 3: turbine layout"));
        assert!(images[0].context.starts_with("Surrounding text: Figure 3"));
    }

    #[test]
    fn test_context_parts_order_and_truncation() {
        let long = "x".repeat(300);
        let html = format!(
            r#"<p>{} <img src="a.png" alt="Chart" title="Quarterly output"></p>"#,
            long
        );
        let images = extract_images(&html, Path::new("/nonexistent"), "page.html");
        let context = &images[0].context;

        assert!(!images[0].needs_alt);
        assert_eq!(context, &format!("Surrounding text: {} | Title: Quarterly output", "x".repeat(200)));
    }

    #[test]
    fn test_no_context_is_empty_string() {
        let images = extract_images(r#"<div><img src="a.png"></div>"#, Path::new("/nonexistent"), "p.html");
        assert_eq!(images[0].context, "");
    }

    #[test]
    fn test_resolution_prefers_page_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("wiki_content/img")).unwrap();
        std::fs::create_dir_all(root.join("img")).unwrap();
        std::fs::write(root.join("wiki_content/img/a.png"), b"png").unwrap();
        std::fs::write(root.join("img/a.png"), b"png").unwrap();
        std::fs::write(root.join("img/b.png"), b"png").unwrap();

        let a = resolve_image(root, "wiki_content/page.html", "img/a.png");
        assert_eq!(a, Some(root.join("wiki_content").join("img/a.png").display().to_string()));

        let b = resolve_image(root, "wiki_content/page.html", "img/b.png?v=2");
        assert_eq!(b, Some(root.join("img/b.png").display().to_string()));

        assert_eq!(resolve_image(root, "wiki_content/page.html", "img/missing.png"), None);
    }

    #[test]
    fn test_root_relative_and_parent_sources_stay_in_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("course");
        std::fs::create_dir_all(root.join("img")).unwrap();
        std::fs::create_dir_all(root.join("wiki_content")).unwrap();
        std::fs::write(root.join("img/a.png"), b"png").unwrap();
        std::fs::write(dir.path().join("outside.png"), b"png").unwrap();

        let expected = Some(root.join("img/a.png").display().to_string());
        assert_eq!(resolve_image(&root, "wiki_content/page.html", "/img/a.png"), expected);
        assert_eq!(resolve_image(&root, "wiki_content/page.html", "../img/a.png"), expected);

        assert_eq!(resolve_image(&root, "wiki_content/page.html", "../../outside.png"), None);
        assert_eq!(resolve_image(&root, "page.html", "../outside.png"), None);
        assert_eq!(resolve_image(&root, "page.html", "/etc/passwd"), None);
    }

    #[test]
    fn test_external_and_missing_sources_are_recorded_unresolved() {
        let html = r#"<body>
            <img src="https://cdn.example.edu/a.png" alt="Logo">
            <img src="data:image/png;base64,AAAA">
            <img alt="no source">
        </body>"#;
        let images = extract_images(html, Path::new("/nonexistent"), "page.html");

        assert_eq!(images.len(), 3);
        assert!(images.iter().all(|i| i.path.is_none()));
        assert!(!images[0].needs_alt);
        assert!(images[1].needs_alt);
        assert_eq!(images[2].src, "");
        assert!(!images[2].needs_alt);
    }
}
