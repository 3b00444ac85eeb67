// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Course package extraction (.imscc / .zip)

use crate::error::Result;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};
use zip::ZipArchive;

const ARCHIVE_EXTENSIONS: &[&str] = &["imscc", "zip"];

/// Whether `path` names a course package rather than a content directory
pub fn is_archive(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| ARCHIVE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

/// Unpack every entry of `archive` under `dest`.
///
/// Entries whose names would land outside `dest` are skipped. Returns the
/// number of files written.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize> {
    info!(archive = %archive.display(), dest = %dest.display(), "Extracting course package");

    std::fs::create_dir_all(dest)?;
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;

        let Some(rel_path) = entry.enclosed_name() else {
            warn!(name = %entry.name(), "Skipping archive entry outside the destination");
            continue;
        };
        let target = dest.join(rel_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    info!(files = written, "Extraction complete");
    Ok(written)
}
