// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration for remediationbot
//!
//! A single `Config` value is built once per run (file, then CLI overrides)
//! and passed explicitly to every pipeline stage.

use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub canvas: CanvasConfig,
    pub scan: ScanConfig,
    pub remediation: RemediationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Base URL of the Canvas instance
    pub url: String,
    /// API token; never logged
    pub token: String,
    pub course_id: String,
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub skip_html: bool,
    pub skip_pdf: bool,
    /// Ruleset passed to the HTML scanner (e.g. WCAG2AA)
    pub wcag_standard: String,
    pub pa11y_runners: Vec<String>,
    /// Program and leading arguments used to launch pa11y
    pub pa11y_command: Vec<String>,
    pub html_timeout_secs: u64,
    /// veraPDF validation profile (ua1 = PDF/UA-1)
    pub verapdf_profile: String,
    /// veraPDF executables to probe, in order
    pub verapdf_candidates: Vec<String>,
    pub pdf_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    /// Characters of page content copied into each task
    pub preview_chars: usize,
    /// Encodings tried, in order, when reading course files
    pub encodings: Vec<TextEncoding>,
    /// Value written by the lang repair
    pub default_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./a11y_output"),
            canvas: CanvasConfig::default(),
            scan: ScanConfig::default(),
            remediation: RemediationConfig::default(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            course_id: String::new(),
            poll_interval_secs: 5,
            max_attempts: 120,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_html: false,
            skip_pdf: false,
            wcag_standard: "WCAG2AA".to_string(),
            pa11y_runners: vec!["axe".to_string(), "htmlcs".to_string()],
            pa11y_command: vec!["npx".to_string(), "pa11y".to_string()],
            html_timeout_secs: 60,
            verapdf_profile: "ua1".to_string(),
            verapdf_candidates: vec!["verapdf".to_string(), "./verapdf/verapdf".to_string()],
            pdf_timeout_secs: 120,
        }
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            preview_chars: 5000,
            encodings: TextEncoding::default_order(),
            default_language: "en".to_string(),
        }
    }
}

impl CanvasConfig {
    /// Whether enough is configured to request an export
    pub fn is_complete(&self) -> bool {
        !self.url.is_empty() && !self.token.is_empty() && !self.course_id.is_empty()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl ScanConfig {
    pub fn html_timeout(&self) -> Duration {
        Duration::from_secs(self.html_timeout_secs)
    }

    pub fn pdf_timeout(&self) -> Duration {
        Duration::from_secs(self.pdf_timeout_secs)
    }
}

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "remediationbot.toml";

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

fn format_for(path: &Path) -> ConfigFormat {
    match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => ConfigFormat::Toml,
        Some("yml") | Some("yaml") => ConfigFormat::Yaml,
        _ => ConfigFormat::Json,
    }
}

/// Load configuration, falling back to defaults when `path` does not exist
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    match format_for(path) {
        ConfigFormat::Toml => toml::from_str(&content)
            .map_err(|e| Error::Config(format!("TOML parse error: {}", e))),
        ConfigFormat::Yaml => serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("YAML parse error: {}", e))),
        ConfigFormat::Json => serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("JSON parse error: {}", e))),
    }
}

/// Write the default configuration in the format implied by the extension
pub fn write_default_config(path: &Path) -> Result<()> {
    let config = Config::default();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = match format_for(path) {
        ConfigFormat::Toml => toml::to_string_pretty(&config)
            .map_err(|e| Error::Config(format!("TOML serialize error: {}", e)))?,
        ConfigFormat::Yaml => serde_yaml::to_string(&config)
            .map_err(|e| Error::Config(format!("YAML serialize error: {}", e)))?,
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
    };

    std::fs::write(path, content)?;
    Ok(())
}
