// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! External tool execution with per-call timeouts.
//!
//! Every scanner invocation goes through [`run_tool`]. The child is killed
//! when the timeout elapses, and the caller gets a [`ScanError`] it can
//! record on the file's report.

use super::ScanError;
use crate::config::ScanConfig;
use serde::Serialize;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Timeout for `--version` probes
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of a finished tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Structured stdout if the tool printed any.
    ///
    /// Scanners exit non-zero when they find problems, so stdout wins over
    /// the exit status. With no stdout a failed run becomes
    /// [`ScanError::ToolFailed`] carrying the tool's diagnostics.
    pub fn payload(&self) -> Result<Option<&str>, ScanError> {
        if !self.stdout.trim().is_empty() {
            return Ok(Some(&self.stdout));
        }
        if self.success {
            return Ok(None);
        }

        let diagnostic = self.stderr.trim();
        if diagnostic.is_empty() {
            Err(ScanError::ToolFailed(match self.exit_code {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            }))
        } else {
            Err(ScanError::ToolFailed(diagnostic.to_string()))
        }
    }
}

/// Why a tool run produced no output
#[derive(Debug)]
pub enum RunError {
    NotFound,
    TimedOut,
    Io(std::io::Error),
}

impl RunError {
    /// Map to a per-file scan error; `missing` names the absent tool
    pub fn into_scan_error(self, missing: &str) -> ScanError {
        match self {
            RunError::NotFound => ScanError::ToolMissing(missing.to_string()),
            RunError::TimedOut => ScanError::TimedOut,
            RunError::Io(e) => ScanError::Io(e.to_string()),
        }
    }
}

/// Run `program args..`, capturing output, killing it after `timeout`
pub async fn run_tool(program: &str, args: &[String], timeout: Duration) -> Result<ToolOutput, RunError> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => RunError::NotFound,
        _ => RunError::Io(e),
    })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            debug!(
                program,
                exit = ?output.status.code(),
                stdout_bytes = output.stdout.len(),
                stderr_bytes = output.stderr.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Tool finished"
            );
            Ok(ToolOutput {
                success: output.status.success(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
        Ok(Err(e)) => Err(RunError::Io(e)),
        Err(_) => {
            // kill_on_drop reaps the child along with the dropped future
            warn!(program, timeout_secs = timeout.as_secs(), "Tool timed out");
            Err(RunError::TimedOut)
        }
    }
}

/// Whether `program args..` runs and exits successfully
pub async fn probe(program: &str, args: &[&str]) -> bool {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    matches!(run_tool(program, &args, PROBE_TIMEOUT).await, Ok(out) if out.success)
}

/// First veraPDF executable among `candidates` that answers `--version`
pub async fn find_verapdf(candidates: &[String]) -> Option<String> {
    for candidate in candidates {
        if probe(candidate, &["--version"]).await {
            return Some(candidate.clone());
        }
    }
    None
}

/// Which external scanning tools are usable on this machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolAvailability {
    pub node: bool,
    pub pa11y: bool,
    /// Resolved veraPDF command, if any candidate works
    pub verapdf: Option<String>,
}

/// Probe node, pa11y and veraPDF
pub async fn check_dependencies(config: &ScanConfig) -> ToolAvailability {
    let node = probe("node", &["--version"]).await;

    let pa11y = match config.pa11y_command.split_first() {
        Some((program, rest)) => {
            let mut args: Vec<&str> = rest.iter().map(String::as_str).collect();
            args.push("--version");
            probe(program, &args).await
        }
        None => false,
    };

    let verapdf = find_verapdf(&config.verapdf_candidates).await;

    ToolAvailability { node, pa11y, verapdf }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(success: bool, stdout: &str, stderr: &str) -> ToolOutput {
        ToolOutput {
            success,
            exit_code: Some(if success { 0 } else { 2 }),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_payload_prefers_stdout_over_exit_status() {
        assert_eq!(output(false, "[]", "").payload(), Ok(Some("[]")));
    }

    #[test]
    fn test_payload_empty_success() {
        assert_eq!(output(true, "  \n", "").payload(), Ok(None));
    }

    #[test]
    fn test_payload_failure_carries_stderr() {
        assert_eq!(
            output(false, "", "Error: net::ERR_FILE_NOT_FOUND\n").payload(),
            Err(ScanError::ToolFailed("Error: net::ERR_FILE_NOT_FOUND".into()))
        );
        assert_eq!(
            output(false, "", "").payload(),
            Err(ScanError::ToolFailed("exited with status 2".into()))
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_not_found() {
        let result = run_tool("remediationbot-no-such-tool", &[], Duration::from_secs(5)).await;
        assert!(matches!(result, Err(RunError::NotFound)));
        assert!(!probe("remediationbot-no-such-tool", &["--version"]).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_slow_tool() {
        let args = vec!["-c".to_string(), "sleep 5".to_string()];
        let start = Instant::now();
        let result = run_tool("sh", &args, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(RunError::TimedOut)));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_output() {
        let args = vec!["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()];
        let out = run_tool("sh", &args, Duration::from_secs(5)).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }
}
