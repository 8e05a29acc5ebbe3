mod config;
mod input;
mod render;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use config::ReportConfig;
use input::DiagnosticSink;
use vncreport_logging::LogFormat;
use vncreport_sessions::{LineParser, LogProcessor};

#[derive(Parser, Debug)]
#[command(
    name = "vncreport",
    about = "Session usage report for remote-desktop hosts, built from sshd auth logs",
    version,
    author
)]
struct Cli {
    /// Log files to read in order (default: standard input; `-` also reads stdin)
    files: Vec<PathBuf>,

    /// Path to a config file (default: ./vncreport.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Year to assume for log timestamps (default: current year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Regex matching the host field of session lines
    #[arg(long)]
    host_pattern: Option<String>,

    /// Log level filter (RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormatChoice>,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,

    /// Do not print log anomalies to stderr
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let mut config =
        ReportConfig::load(cli.config.as_deref(), &working_dir)?.unwrap_or_default();
    config.merge(ReportConfig {
        host_pattern: cli.host_pattern.clone(),
        year: cli.year,
        log_level: cli.log_level.clone(),
        log_format: cli.log_format.map(LogFormat::from),
        log_file: None,
    });

    let _log_guard = vncreport_logging::init_tracing(
        config.log_level(),
        config.log_format(),
        config.log_file.as_deref(),
    )
    .context("Failed to open log file")?;

    let parser = LineParser::new(config.host_pattern(), config.year())?;
    tracing::debug!(
        host_pattern = config.host_pattern(),
        year = parser.year(),
        "parser ready"
    );

    let mut processor = LogProcessor::new(parser);
    let color = io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    colored::control::set_override(color);
    let mut diagnostics = DiagnosticSink::new(io::stderr(), cli.quiet, color);
    input::read_inputs(
        &mut processor,
        &cli.files,
        &mut io::stdin().lock(),
        &mut diagnostics,
    )?;

    let report = processor.finish();
    tracing::info!(
        hosts = report.hosts.len(),
        unique_users = report.unique_users(),
        sessions = report.total_sessions(),
        diagnostics = report.diagnostics,
        "report complete"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        writeln!(out, "{}", render::render_json(&report)?)?;
    } else {
        render::write_text(&report, &mut out)?;
    }
    out.flush()?;

    Ok(())
}
