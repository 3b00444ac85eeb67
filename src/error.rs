// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for remediationbot
//!
//! Only upstream and output-tree failures surface as `Error`. Scanner
//! problems for a single file are recorded in the report as text (see
//! [`crate::scanner::ScanError`]) and never abort a run.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Export timed out after {0} status checks")]
    ExportTimedOut(u32),

    #[error("Markup rewrite error: {0}")]
    Rewrite(String),
}
