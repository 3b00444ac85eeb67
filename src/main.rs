// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Remediationbot CLI - course accessibility remediation planner
//!
//! Part of the gitbot-fleet ecosystem.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use remediationbot::config::{self, Config};
use remediationbot::pipeline;
use remediationbot::report::{generate_report, OutputFormat};
use remediationbot::scanner::process::check_dependencies;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Course accessibility remediation planner for gitbot-fleet
#[derive(Parser)]
#[command(name = "remediationbot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (json, toml or yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output directory for all artifacts
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a course from Canvas as a Common Cartridge package
    Export {
        #[command(flatten)]
        canvas: CanvasArgs,
    },

    /// Scan extracted content or a course package
    Scan {
        /// Content directory, .imscc or .zip package
        input: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,
    },

    /// Build the work order from existing scan reports and apply safe fixes
    Remediate {
        /// Content directory that was scanned
        content_dir: PathBuf,

        /// Rendering printed to stdout
        #[arg(long, default_value = "text")]
        format: FormatArg,
    },

    /// Export (unless an input is given), scan and remediate
    Full {
        /// Content directory or package; exports from Canvas when omitted
        #[arg(long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        canvas: CanvasArgs,

        #[command(flatten)]
        scan: ScanArgs,

        /// Rendering printed to stdout
        #[arg(long, default_value = "text")]
        format: FormatArg,
    },

    /// Check which external scanning tools are installed
    Deps,

    /// Write a default configuration file
    Init {
        /// File format (json, toml, yaml)
        #[arg(long, default_value = "toml")]
        format: String,
    },

    /// Show the effective configuration
    Show,
}

#[derive(Args)]
struct CanvasArgs {
    /// Canvas base URL
    #[arg(long)]
    canvas_url: Option<String>,

    /// Canvas API token
    #[arg(long)]
    token: Option<String>,

    /// Canvas course id
    #[arg(long)]
    course_id: Option<String>,
}

#[derive(Args)]
struct ScanArgs {
    /// Skip the HTML scan
    #[arg(long)]
    skip_html: bool,

    /// Skip the PDF scan
    #[arg(long)]
    skip_pdf: bool,

    /// WCAG ruleset passed to pa11y
    #[arg(long)]
    standard: Option<String>,
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// The work order as JSON
    Json,
    /// SARIF for IDE/CI
    Sarif,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sarif => OutputFormat::Sarif,
        }
    }
}

impl CanvasArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(ref url) = self.canvas_url {
            config.canvas.url = url.clone();
        }
        if let Some(ref token) = self.token {
            config.canvas.token = token.clone();
        }
        if let Some(ref id) = self.course_id {
            config.canvas.course_id = id.clone();
        }
    }
}

impl ScanArgs {
    fn apply(&self, config: &mut Config) {
        if self.skip_html {
            config.scan.skip_html = true;
        }
        if self.skip_pdf {
            config.scan.skip_pdf = true;
        }
        if let Some(ref standard) = self.standard {
            config.scan.wcag_standard = standard.clone();
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;

    debug!(path = %config_path.display(), exists = config_path.exists(), "Configuration loaded");

    if let Some(ref output) = cli.output {
        config.output_dir = output.clone();
    }

    match cli.command {
        Command::Export { canvas } => {
            canvas.apply(&mut config);
            let package = pipeline::run_export(&config).await?;
            println!("Export saved to {}", package.display());
        }

        Command::Scan { input, scan } => {
            scan.apply(&mut config);
            let root = pipeline::prepare_content(&config, &input)?;
            let outcome = pipeline::run_scan_with_tools(&config, &root).await?;
            print_scan_summary(&outcome);
        }

        Command::Remediate { content_dir, format } => {
            let outcome = pipeline::run_remediate(&config, &content_dir)?;
            println!("{}", generate_report(&outcome.work_order, format.into()));
        }

        Command::Full { input, canvas, scan, format } => {
            canvas.apply(&mut config);
            scan.apply(&mut config);
            let outcome = pipeline::run_full(&config, input.as_deref()).await?;
            println!("{}", generate_report(&outcome.work_order, format.into()));
        }

        Command::Deps => {
            let tools = check_dependencies(&config.scan).await;
            println!("node:    {}", if tools.node { "found" } else { "missing" });
            println!("pa11y:   {}", if tools.pa11y { "found" } else { "missing (run npm install)" });
            match tools.verapdf {
                Some(ref cmd) => println!("veraPDF: found ({})", cmd),
                None => println!("veraPDF: missing (PDF scans will be reported as not installed)"),
            }
        }

        Command::Init { format } => {
            let path = init_path(&config_path, &format);
            config::write_default_config(&path)?;
            println!("Created configuration file: {}", path.display());
        }

        Command::Show => show_config(&config),
    }

    Ok(())
}

fn init_path(config_path: &Path, format: &str) -> PathBuf {
    match format {
        "json" => config_path.with_extension("json"),
        "yaml" | "yml" => config_path.with_extension("yml"),
        _ => config_path.with_extension("toml"),
    }
}

fn print_scan_summary(outcome: &pipeline::ScanOutcome) {
    match outcome.html.completed() {
        Some(r) => println!(
            "HTML: {} issue(s) in {} of {} file(s)",
            r.total_issues, r.files_with_issues, r.files_scanned
        ),
        None => println!("HTML: skipped"),
    }
    match outcome.pdf.completed() {
        Some(r) => match r.error {
            Some(ref e) => println!("PDF: {}", e),
            None => println!(
                "PDF: {} issue(s) in {} of {} file(s)",
                r.total_issues, r.files_with_issues, r.files_scanned
            ),
        },
        None => println!("PDF: skipped"),
    }
}

fn show_config(config: &Config) {
    println!("\nCurrent Configuration:");
    println!("======================\n");

    println!("Output: {}", config.output_dir.display());
    println!();

    println!("Canvas:");
    println!("  URL: {}", config.canvas.url);
    println!("  Token: {}", if config.canvas.token.is_empty() { "(unset)" } else { "(set)" });
    println!("  Course: {}", config.canvas.course_id);
    println!("  Poll: every {}s, {} attempts", config.canvas.poll_interval_secs, config.canvas.max_attempts);
    println!();

    println!("Scan:");
    println!("  Skip HTML: {}", config.scan.skip_html);
    println!("  Skip PDF: {}", config.scan.skip_pdf);
    println!("  WCAG standard: {}", config.scan.wcag_standard);
    println!("  pa11y runners: {}", config.scan.pa11y_runners.join(", "));
    println!("  veraPDF profile: {}", config.scan.verapdf_profile);
    println!("  Timeouts: html {}s, pdf {}s", config.scan.html_timeout_secs, config.scan.pdf_timeout_secs);
    println!();

    println!("Remediation:");
    println!("  Preview chars: {}", config.remediation.preview_chars);
    let encodings: Vec<String> = config.remediation.encodings.iter().map(|e| e.to_string()).collect();
    println!("  Encodings: {}", encodings.join(", "));
    println!("  Default language: {}", config.remediation.default_language);
}
