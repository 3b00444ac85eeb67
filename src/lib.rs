// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Remediationbot - course accessibility remediation planner
//!
//! Part of the gitbot-fleet ecosystem. Remediationbot takes an LMS course
//! export, runs external accessibility scanners over its pages and PDFs, and
//! turns their findings into one prioritized remediation work order for a
//! downstream judgment step. Repairs that need no judgment are applied into
//! a parallel output tree.
//!
//! ## Stages
//!
//! - **Export**: Canvas Common Cartridge export and package extraction
//! - **Manifest**: typed inventory of the extracted course
//! - **Scan**: pa11y over HTML, veraPDF (PDF/UA) over PDFs
//! - **Classify**: ordered decision table over raw findings
//! - **Context**: image references with resolved paths and nearby text
//! - **Remediate**: work order synthesis and mechanical auto-fixes

pub mod classify;
pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod export;
pub mod manifest;
pub mod pipeline;
pub mod remediation;
pub mod report;
pub mod scanner;

pub use error::{Error, Result};
