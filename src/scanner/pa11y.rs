// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! pa11y-backed HTML scanner

use super::process::run_tool;
use super::{HtmlScanner, RawFinding, ScanError};
use crate::config::ScanConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const MISSING_TOOL: &str = "pa11y not found - run npm install in project root";

/// Runs pa11y once per file with the configured standard and runners
pub struct Pa11yScanner {
    command: Vec<String>,
    standard: String,
    runners: Vec<String>,
    timeout: Duration,
}

impl Pa11yScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            command: config.pa11y_command.clone(),
            standard: config.wcag_standard.clone(),
            runners: config.pa11y_runners.clone(),
            timeout: config.html_timeout(),
        }
    }

    /// Full argument list after the program name
    fn args_for(&self, path: &Path) -> Vec<String> {
        let mut args: Vec<String> = self.command.iter().skip(1).cloned().collect();
        args.push(path.display().to_string());
        args.extend(["-s".to_string(), self.standard.clone()]);
        args.extend(["-r".to_string(), "json".to_string()]);
        if !self.runners.is_empty() {
            args.extend(["-e".to_string(), self.runners.join(",")]);
        }
        args.push("--include-notices".to_string());
        args.push("--include-warnings".to_string());
        args
    }
}

#[async_trait]
impl HtmlScanner for Pa11yScanner {
    fn name(&self) -> &str {
        "pa11y"
    }

    async fn scan(&self, path: &Path) -> Result<Vec<RawFinding>, ScanError> {
        let program = self
            .command
            .first()
            .ok_or_else(|| ScanError::ToolMissing(MISSING_TOOL.to_string()))?;

        debug!(file = %path.display(), "Running pa11y");
        let output = run_tool(program, &self.args_for(path), self.timeout)
            .await
            .map_err(|e| e.into_scan_error(MISSING_TOOL))?;

        match output.payload()? {
            Some(json) => parse_pa11y_output(json),
            None => Ok(Vec::new()),
        }
    }
}

/// pa11y's JSON reporter prints a bare issue array; older reporters wrap
/// it in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Pa11yOutput {
    Issues(Vec<RawFinding>),
    Wrapped { issues: Vec<RawFinding> },
}

/// Parse pa11y JSON reporter output into raw findings
pub fn parse_pa11y_output(json: &str) -> Result<Vec<RawFinding>, ScanError> {
    match serde_json::from_str::<Pa11yOutput>(json) {
        Ok(Pa11yOutput::Issues(issues)) | Ok(Pa11yOutput::Wrapped { issues }) => Ok(issues),
        Err(e) => {
            debug!(error = %e, "Unparseable pa11y output");
            Err(ScanError::InvalidOutput)
        }
    }
}
