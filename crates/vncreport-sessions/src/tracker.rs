use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::error::SessionError;
use crate::tally::UserTally;
use crate::types::{Action, HostStats, LogEvent, SessionKey, SessionRecord, SessionReport};

/// An accepted state change. Every variant counts as a new session for the
/// host and the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new active record was pushed for the (host, pid)
    Opened,
    /// The oldest active record was closed after `duration_secs`
    Closed { duration_secs: i64 },
    /// A close arrived for a (host, pid) never seen before
    OrphanClosed,
}

/// Pairs opened/closed events per (host, pid) and accumulates host totals.
///
/// Records are never removed; a closed record stays as history so a pid can
/// be reused by a later login.
#[derive(Debug, Default)]
pub struct SessionTracker {
    records: HashMap<SessionKey, Vec<SessionRecord>>,
    hosts: BTreeMap<String, HostStats>,
    users: UserTally,
    report_start: Option<NaiveDateTime>,
    report_end: Option<NaiveDateTime>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the tracker.
    ///
    /// The event's timestamp always moves the report window, even when the
    /// transition itself is rejected.
    pub fn apply(&mut self, event: &LogEvent) -> Result<Transition, SessionError> {
        if self.report_start.is_none() {
            self.report_start = Some(event.timestamp);
        }
        self.report_end = Some(event.timestamp);

        let key = event.key();
        let transition = match event.action {
            Action::Opened => self.open(key, event.timestamp)?,
            Action::Closed => self.close(key, event.timestamp)?,
        };

        self.users.record(&event.user);
        tracing::debug!(
            host = %event.host,
            pid = event.pid,
            user = %event.user,
            ?transition,
            "session transition"
        );
        Ok(transition)
    }

    fn open(
        &mut self,
        key: SessionKey,
        at: NaiveDateTime,
    ) -> Result<Transition, SessionError> {
        let records = self.records.entry(key.clone()).or_default();
        if records.iter().any(SessionRecord::is_active) {
            return Err(SessionError::AlreadyActive {
                host: key.host,
                pid: key.pid,
            });
        }

        records.push(SessionRecord::Active { start: at });
        host_stats(&mut self.hosts, &key.host).session_count += 1;
        Ok(Transition::Opened)
    }

    fn close(
        &mut self,
        key: SessionKey,
        at: NaiveDateTime,
    ) -> Result<Transition, SessionError> {
        let records = match self.records.entry(key.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(vec![SessionRecord::Closed {
                    start: None,
                    end: at,
                }]);
                host_stats(&mut self.hosts, &key.host).session_count += 1;
                return Ok(Transition::OrphanClosed);
            }
        };

        // Oldest active record first; insertion order is login order.
        let duration_secs = records
            .iter_mut()
            .find_map(|record| record.close(at))
            .ok_or_else(|| SessionError::AlreadyClosed {
                host: key.host.clone(),
                pid: key.pid,
            })?;

        let stats = host_stats(&mut self.hosts, &key.host);
        stats.session_count += 1;
        stats.total_duration_secs += duration_secs;
        Ok(Transition::Closed { duration_secs })
    }

    /// Records kept for a (host, pid), in the order they were opened.
    pub fn records(&self, host: &str, pid: u32) -> &[SessionRecord] {
        let key = SessionKey {
            host: host.to_string(),
            pid,
        };
        self.records.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn host(&self, host: &str) -> Option<&HostStats> {
        self.hosts.get(host)
    }

    pub fn users(&self) -> &UserTally {
        &self.users
    }

    pub fn report_start(&self) -> Option<NaiveDateTime> {
        self.report_start
    }

    pub fn report_end(&self) -> Option<NaiveDateTime> {
        self.report_end
    }

    /// Number of records still open.
    pub fn active_sessions(&self) -> usize {
        self.records
            .values()
            .flatten()
            .filter(|record| record.is_active())
            .count()
    }

    /// Close every still-active record at the last seen timestamp and hand
    /// back the totals.
    pub fn finish(mut self) -> SessionReport {
        self.finalize();

        SessionReport {
            report_start: self.report_start,
            report_end: self.report_end,
            hosts: self.hosts,
            users: self.users.into_counts(),
            diagnostics: 0,
        }
    }

    fn finalize(&mut self) {
        let Some(end) = self.report_end else {
            return;
        };

        let mut finalized = 0usize;
        for (key, records) in self.records.iter_mut() {
            for record in records.iter_mut() {
                if let Some(secs) = record.close(end) {
                    host_stats(&mut self.hosts, &key.host).total_duration_secs += secs;
                    finalized += 1;
                }
            }
        }

        if finalized > 0 {
            tracing::debug!(finalized, %end, "closed sessions still open at end of input");
        }
    }
}

fn host_stats<'a>(hosts: &'a mut BTreeMap<String, HostStats>, host: &str) -> &'a mut HostStats {
    hosts.entry(host.to_string()).or_default()
}
