//! # vncreport-sessions
//!
//! Reconstructs remote-desktop login sessions from sshd `pam_unix` log lines.
//!
//! ## Key Types
//!
//! - [`LineParser`] - Extracts a [`LogEvent`] from one raw log line
//! - [`SessionTracker`] - Pairs opened/closed events per (host, pid)
//! - [`UserTally`] - Per-user session counts
//! - [`LogProcessor`] - Drives a line source through parser and tracker
//! - [`SessionReport`] - Finalized per-host and per-user totals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vncreport_sessions::{LineParser, LogProcessor};
//!
//! let parser = LineParser::with_defaults()?;
//! let mut processor = LogProcessor::new(parser);
//! processor.process_reader(std::io::stdin().lock(), |d| eprintln!("{}", d))?;
//! let report = processor.finish();
//! ```

mod error;
mod parser;
mod processor;
mod tally;
mod tracker;
mod types;

pub use error::{Diagnostic, DiagnosticKind, ParseError, PatternError, SessionError};
pub use parser::{LineParser, DEFAULT_HOST_PATTERN};
pub use processor::LogProcessor;
pub use tally::UserTally;
pub use tracker::{SessionTracker, Transition};
pub use types::{Action, HostStats, LogEvent, SessionKey, SessionRecord, SessionReport};
