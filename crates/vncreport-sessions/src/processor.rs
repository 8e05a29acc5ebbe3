use std::io::{self, BufRead};

use crate::error::{Diagnostic, DiagnosticKind};
use crate::parser::LineParser;
use crate::tracker::{SessionTracker, Transition};
use crate::types::SessionReport;

/// Feeds log lines through the [`LineParser`] into a [`SessionTracker`].
///
/// Input is one ordered stream; several sources may be processed back to
/// back and are treated as a continuation of each other.
#[derive(Debug)]
pub struct LogProcessor {
    parser: LineParser,
    tracker: SessionTracker,
    line_number: usize,
    diagnostics: usize,
}

impl LogProcessor {
    pub fn new(parser: LineParser) -> Self {
        Self {
            parser,
            tracker: SessionTracker::new(),
            line_number: 0,
            diagnostics: 0,
        }
    }

    /// Process the next line of the current source.
    ///
    /// Returns `Ok(None)` for lines that are not session events.
    pub fn process_line(&mut self, line: &str) -> Result<Option<Transition>, Diagnostic> {
        self.line_number += 1;

        let event = match self.parser.parse(line) {
            Ok(Some(event)) => event,
            Ok(None) => {
                tracing::trace!(line = self.line_number, "skipping non-session line");
                return Ok(None);
            }
            Err(e) => return Err(self.diagnostic(e.into())),
        };

        self.tracker
            .apply(&event)
            .map(Some)
            .map_err(|e| self.diagnostic(e.into()))
    }

    /// Read `reader` to exhaustion, passing each diagnostic to `on_diagnostic`.
    ///
    /// Line numbers restart at 1 for every reader. Bytes that are not valid
    /// UTF-8 are replaced rather than rejected.
    pub fn process_reader<R, F>(&mut self, mut reader: R, mut on_diagnostic: F) -> io::Result<()>
    where
        R: BufRead,
        F: FnMut(&Diagnostic),
    {
        self.line_number = 0;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Err(diagnostic) = self.process_line(line) {
                on_diagnostic(&diagnostic);
            }
        }

        Ok(())
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn diagnostics(&self) -> usize {
        self.diagnostics
    }

    /// Finalize open sessions and return the report.
    pub fn finish(self) -> SessionReport {
        let mut report = self.tracker.finish();
        report.diagnostics = self.diagnostics;
        report
    }

    fn diagnostic(&mut self, kind: DiagnosticKind) -> Diagnostic {
        self.diagnostics += 1;
        let diagnostic = Diagnostic::new(self.line_number, kind);
        tracing::debug!(%diagnostic, "anomalous log line");
        diagnostic
    }
}
