use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// What a `pam_unix(sshd:session)` line reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Opened,
    Closed,
}

/// One parsed log line. Folded into tracker state and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Local wall-clock time, using the assumed year
    pub timestamp: NaiveDateTime,
    pub host: String,
    pub pid: u32,
    pub action: Action,
    pub user: String,
}

impl LogEvent {
    pub fn key(&self) -> SessionKey {
        SessionKey {
            host: self.host.clone(),
            pid: self.pid,
        }
    }
}

/// Identity of a login process: pids are only unique within a host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub host: String,
    pub pid: u32,
}

/// One login/logout pairing for a (host, pid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionRecord {
    /// Opened and not yet closed
    Active { start: NaiveDateTime },
    /// Closed explicitly or by finalization. `start` is absent when only the
    /// close was ever observed.
    Closed {
        start: Option<NaiveDateTime>,
        end: NaiveDateTime,
    },
}

impl SessionRecord {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionRecord::Active { .. })
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        match *self {
            SessionRecord::Active { start } => Some(start),
            SessionRecord::Closed { start, .. } => start,
        }
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        match *self {
            SessionRecord::Active { .. } => None,
            SessionRecord::Closed { end, .. } => Some(end),
        }
    }

    /// Close an active record at `at`, returning the elapsed seconds.
    ///
    /// Returns `None` if the record was already closed. The elapsed time is
    /// clamped at zero when `at` precedes the start.
    pub(crate) fn close(&mut self, at: NaiveDateTime) -> Option<i64> {
        let SessionRecord::Active { start } = *self else {
            return None;
        };
        *self = SessionRecord::Closed {
            start: Some(start),
            end: at,
        };

        let secs = (at - start).num_seconds();
        if secs < 0 {
            tracing::debug!(%start, end = %at, "session closed before it opened, counting zero time");
        }
        Some(secs.max(0))
    }
}

/// Per-host aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStats {
    /// Accepted open and close events on this host
    pub session_count: u64,
    /// Seconds across all closed and finalized sessions
    pub total_duration_secs: i64,
}

impl HostStats {
    /// Average seconds per counted session, or `None` when nothing was counted.
    pub fn average_duration_secs(&self) -> Option<i64> {
        if self.session_count == 0 {
            return None;
        }
        Some(self.total_duration_secs / self.session_count as i64)
    }
}

/// Everything the tracker accumulated over one run, after finalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Timestamp of the first accepted event
    pub report_start: Option<NaiveDateTime>,
    /// Timestamp of the last accepted event
    pub report_end: Option<NaiveDateTime>,
    pub hosts: BTreeMap<String, HostStats>,
    pub users: BTreeMap<String, u64>,
    /// Number of diagnostics reported while processing
    pub diagnostics: usize,
}

impl SessionReport {
    pub fn unique_users(&self) -> usize {
        self.users.len()
    }

    /// Sum of all user tallies.
    pub fn total_sessions(&self) -> u64 {
        self.users.values().sum()
    }
}
