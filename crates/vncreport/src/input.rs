//! Reading the configured inputs and reporting their log anomalies.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use vncreport_sessions::{Diagnostic, LogProcessor};

const DIAGNOSTIC_PREFIX: &str = "Error in logs:";

/// One diagnostic line: `Error in logs: <source>: line N: <description>`.
pub fn format_diagnostic(source: &str, diagnostic: &Diagnostic, color: bool) -> String {
    let prefix = if color {
        DIAGNOSTIC_PREFIX.red().to_string()
    } else {
        DIAGNOSTIC_PREFIX.to_string()
    };
    format!("{} {}: {}", prefix, source, diagnostic)
}

/// Where diagnostic lines go; stderr in the binary.
pub struct DiagnosticSink<W> {
    out: W,
    quiet: bool,
    color: bool,
}

impl<W: Write> DiagnosticSink<W> {
    pub fn new(out: W, quiet: bool, color: bool) -> Self {
        Self { out, quiet, color }
    }

    fn report(&mut self, source: &str, diagnostic: &Diagnostic) {
        if self.quiet {
            return;
        }
        let _ = writeln!(
            self.out,
            "{}",
            format_diagnostic(source, diagnostic, self.color)
        );
    }
}

/// Feed every input into `processor` in order.
///
/// No files, or a `-` entry, reads `stdin`.
pub fn read_inputs<R, W>(
    processor: &mut LogProcessor,
    files: &[PathBuf],
    stdin: &mut R,
    sink: &mut DiagnosticSink<W>,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    if files.is_empty() {
        return read_stdin(processor, stdin, sink);
    }

    for path in files {
        if path == Path::new("-") {
            read_stdin(processor, stdin, sink)?;
            continue;
        }
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let source = path.display().to_string();
        processor
            .process_reader(BufReader::new(file), |d| sink.report(&source, d))
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }

    Ok(())
}

fn read_stdin<R: BufRead, W: Write>(
    processor: &mut LogProcessor,
    stdin: &mut R,
    sink: &mut DiagnosticSink<W>,
) -> Result<()> {
    processor
        .process_reader(stdin, |d| sink.report("stdin", d))
        .context("Failed to read standard input")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;
    use vncreport_sessions::{LineParser, SessionError, DEFAULT_HOST_PATTERN};

    const HOST: &str = "caen-vnc1.engin.umich.edu";

    fn processor() -> LogProcessor {
        LogProcessor::new(LineParser::new(DEFAULT_HOST_PATTERN, 2013).unwrap())
    }

    fn line(time: &str, pid: &str, action: &str, user: &str) -> String {
        format!(
            "Sep  3 {time} {HOST} sshd[{pid}]: pam_unix(sshd:session): session {action} for user {user}\n"
        )
    }

    fn duplicate_open() -> String {
        line("08:00:00", "111", "opened", "alice") + &line("08:05:00", "111", "opened", "alice")
    }

    fn run(files: &[PathBuf], stdin: &str, quiet: bool) -> (LogProcessor, String) {
        let mut processor = processor();
        let mut stdin = Cursor::new(stdin.as_bytes().to_vec());
        let mut sink = DiagnosticSink::new(Vec::new(), quiet, false);
        read_inputs(&mut processor, files, &mut stdin, &mut sink).unwrap();
        (processor, String::from_utf8(sink.out).unwrap())
    }

    #[test]
    fn test_format_diagnostic_plain() {
        let diagnostic = Diagnostic::new(
            2,
            SessionError::AlreadyActive {
                host: HOST.to_string(),
                pid: 111,
            },
        );
        assert_eq!(
            format_diagnostic("in.log", &diagnostic, false),
            format!("Error in logs: in.log: line 2: pid (111) already active on {HOST}")
        );
    }

    #[test]
    fn test_no_files_reads_stdin() {
        let (processor, errors) = run(&[], &duplicate_open(), false);

        assert_eq!(
            errors,
            format!("Error in logs: stdin: line 2: pid (111) already active on {HOST}\n")
        );
        assert_eq!(processor.diagnostics(), 1);
    }

    #[test]
    fn test_quiet_suppresses_diagnostics() {
        let (processor, errors) = run(&[], &duplicate_open(), true);

        assert!(errors.is_empty());
        assert_eq!(processor.diagnostics(), 1);
    }

    #[test]
    fn test_files_and_dash_read_in_order() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.log");
        let last = dir.path().join("last.log");
        std::fs::write(&first, line("08:00:00", "111", "opened", "alice")).unwrap();
        std::fs::write(&last, line("09:00:00", "111", "closed", "alice")).unwrap();

        let stdin = line("08:30:00", "222", "opened", "bob")
            + &line("08:31:00", "222", "opened", "bob");
        let files = vec![first, PathBuf::from("-"), last.clone()];
        let (processor, errors) = run(&files, &stdin, false);

        assert_eq!(
            errors,
            format!("Error in logs: stdin: line 2: pid (222) already active on {HOST}\n")
        );
        let report = processor.finish();
        // alice 08:00-09:00, bob finalized 08:30-09:00
        assert_eq!(report.hosts[HOST].total_duration_secs, 3600 + 1800);
        assert_eq!(report.users["alice"], 2);
        assert_eq!(report.users["bob"], 1);
        assert!(!errors.contains(&last.display().to_string()));
    }

    #[test]
    fn test_file_diagnostics_name_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auth.log");
        std::fs::write(&path, line("08:00:00", "abc", "opened", "alice")).unwrap();

        let (_, errors) = run(&[path.clone()], "", false);
        assert_eq!(
            errors,
            format!(
                "Error in logs: {}: line 1: abc is not a valid pid\n",
                path.display()
            )
        );
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let mut processor = processor();
        let mut stdin = Cursor::new(Vec::new());
        let mut sink = DiagnosticSink::new(Vec::new(), false, false);

        let err = read_inputs(
            &mut processor,
            &[dir.path().join("missing.log")],
            &mut stdin,
            &mut sink,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to open"));
    }
}
