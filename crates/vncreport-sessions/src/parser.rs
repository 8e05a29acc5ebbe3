use chrono::{Month, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};

use crate::error::{ParseError, PatternError};
use crate::types::{Action, LogEvent};

/// Hosts of the CAEN remote-desktop pool.
pub const DEFAULT_HOST_PATTERN: &str = r"caen-vnc[^.\s]+\.engin\.umich\.edu";

/// Matches sshd session lines and turns them into [`LogEvent`]s.
///
/// The log format carries no year, so every timestamp is placed in the year
/// the parser was built with.
#[derive(Debug, Clone)]
pub struct LineParser {
    regex: Regex,
    year: i32,
}

impl LineParser {
    /// Build a parser for hosts matching `host_pattern` (a regex fragment).
    pub fn new(host_pattern: &str, year: i32) -> Result<Self, PatternError> {
        let pattern = format!(
            r"(?P<month>\w+) +(?P<day>\d+) (?P<time>\d\d:\d\d:\d\d) (?P<host>(?:{host_pattern})) sshd\[(?P<pid>[^\]]+)\]: pam_unix\(sshd:session\): session (?P<action>opened|closed) for user (?P<user>[\w.\-]+)"
        );
        let regex = Regex::new(&pattern).map_err(|source| PatternError {
            pattern: host_pattern.to_string(),
            source,
        })?;
        Ok(Self { regex, year })
    }

    /// Default host pattern, current local year.
    pub fn with_defaults() -> Result<Self, PatternError> {
        Self::new(DEFAULT_HOST_PATTERN, current_year())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Parse one line.
    ///
    /// Returns `Ok(None)` for lines outside the grammar, which is most of a
    /// typical auth log.
    pub fn parse(&self, line: &str) -> Result<Option<LogEvent>, ParseError> {
        let Some(caps) = self.regex.captures(line) else {
            return Ok(None);
        };

        let pid_field = group(&caps, "pid");
        let pid = pid_field
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidPid {
                pid: pid_field.to_string(),
            })?;

        let timestamp = self.timestamp(
            group(&caps, "month"),
            group(&caps, "day"),
            group(&caps, "time"),
        )?;

        let action = match group(&caps, "action") {
            "opened" => Action::Opened,
            _ => Action::Closed,
        };

        Ok(Some(LogEvent {
            timestamp,
            host: group(&caps, "host").to_string(),
            pid,
            action,
            user: group(&caps, "user").to_string(),
        }))
    }

    fn timestamp(
        &self,
        month: &str,
        day: &str,
        time: &str,
    ) -> Result<NaiveDateTime, ParseError> {
        let invalid = || ParseError::InvalidTimestamp {
            month: month.to_string(),
            day: day.to_string(),
            time: time.to_string(),
        };

        let month_number = month
            .parse::<Month>()
            .map_err(|_| invalid())?
            .number_from_month();
        let day_number = day.parse::<u32>().map_err(|_| invalid())?;
        let date = NaiveDate::from_ymd_opt(self.year, month_number, day_number)
            .ok_or_else(invalid)?;
        let time = NaiveTime::parse_from_str(time, "%H:%M:%S").map_err(|_| invalid())?;

        Ok(date.and_time(time))
    }
}

fn group<'a>(caps: &Captures<'a>, name: &str) -> &'a str {
    caps.name(name).map(|m| m.as_str()).unwrap_or_default()
}

fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Local::now().year()
}
