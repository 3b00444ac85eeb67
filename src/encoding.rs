// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Best-effort text decoding for course content.
//!
//! Course exports mix UTF-8 pages with legacy Windows and Latin-1 pages.
//! Reads try an ordered list of encodings and return the first strict
//! decode that succeeds.

use encoding_rs::WINDOWS_1252;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A text encoding that course content may be stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "windows-1252")]
    Windows1252,
    #[serde(rename = "latin-1")]
    Latin1,
}

impl TextEncoding {
    /// Strictly decode `bytes`, returning `None` on any invalid sequence
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            // encoding_rs maps the five bytes the code page leaves undefined
            // to C1 controls; a strict decode rejects them
            TextEncoding::Windows1252 => WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .filter(|text| !text.chars().any(|c| ('\u{80}'..='\u{9f}').contains(&c)))
                .map(|text| text.into_owned()),
        }
    }

    /// Default read order
    pub fn default_order() -> Vec<TextEncoding> {
        vec![TextEncoding::Utf8, TextEncoding::Windows1252, TextEncoding::Latin1]
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Windows1252 => write!(f, "windows-1252"),
            TextEncoding::Latin1 => write!(f, "latin-1"),
        }
    }
}

/// Decode bytes with the first encoding in `order` that accepts them
pub fn decode_first(bytes: &[u8], order: &[TextEncoding]) -> Option<String> {
    order.iter().find_map(|enc| enc.decode(bytes))
}

/// Read a file as text, trying each encoding in `order`.
///
/// Missing or unreadable files and content no encoding accepts all yield
/// `None`.
pub fn read_text(path: &Path, order: &[TextEncoding]) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Could not read file");
            return None;
        }
    };

    let text = decode_first(&bytes, order);
    if text.is_none() {
        debug!(path = %path.display(), "No configured encoding could decode file");
    }
    text
}
