use thiserror::Error;

/// A line matched the log grammar but one of its fields is unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{pid} is not a valid pid")]
    InvalidPid { pid: String },

    #[error("unable to parse time ({month} {day} {time})")]
    InvalidTimestamp {
        month: String,
        day: String,
        time: String,
    },
}

/// An event that the session state machine refuses to apply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("pid ({pid}) already active on {host}")]
    AlreadyActive { host: String, pid: u32 },

    #[error("pid ({pid}) already closed on {host}")]
    AlreadyClosed { host: String, pid: u32 },
}

/// The configured host pattern could not be compiled into the line grammar.
#[derive(Error, Debug)]
#[error("invalid host pattern `{pattern}`: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A non-fatal anomaly found while processing the input stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct Diagnostic {
    /// 1-based line number within the current input source
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(line: usize, kind: impl Into<DiagnosticKind>) -> Self {
        Self {
            line,
            kind: kind.into(),
        }
    }
}
