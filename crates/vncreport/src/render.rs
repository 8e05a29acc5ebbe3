//! Text and JSON rendering of a finished [`SessionReport`].

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::NaiveDateTime;
use serde::Serialize;

use vncreport_sessions::SessionReport;

const RULE_WIDTH: usize = 78;

/// Write the fixed-width summary table.
pub fn write_text<W: Write>(report: &SessionReport, out: &mut W) -> io::Result<()> {
    let rule = "-".repeat(RULE_WIDTH);

    writeln!(out)?;
    writeln!(out, " Report Log Summary:")?;
    writeln!(out)?;
    writeln!(
        out,
        " {:<39.39} {:>38.38}",
        format!("Start: {}", asctime(report.report_start)),
        format!("End: {}", asctime(report.report_end)),
    )?;
    writeln!(out, " {} ", rule)?;
    writeln!(out)?;
    writeln!(out, "\tHost                 Sessions Total Login Time Avg Login Time")?;
    writeln!(out, "\t-------------------- -------- ---------------- --------------")?;

    for (host, stats) in &report.hosts {
        let average = stats
            .average_duration_secs()
            .map(format_hms)
            .unwrap_or_else(|| "--:--:--".to_string());
        writeln!(
            out,
            "\t{:<20.20} {:>8} {:>16.16} {:>14.14}",
            host,
            stats.session_count,
            format_hms(stats.total_duration_secs),
            average,
        )?;
    }

    writeln!(out)?;
    writeln!(out)?;
    writeln!(out, "\tTotal number of unique users: {}", report.unique_users())?;
    writeln!(out, "\tTotal number of sessions: {}", report.total_sessions())?;
    writeln!(out)?;
    writeln!(out, " {} ", rule)?;

    Ok(())
}

/// Seconds as `HH:MM:SS`. Hours keep growing past 99.
pub fn format_hms(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

fn asctime(timestamp: Option<NaiveDateTime>) -> String {
    timestamp
        .map(|t| t.format("%a %b %e %H:%M:%S %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[derive(Debug, Serialize)]
struct JsonHost {
    session_count: u64,
    total_duration_secs: i64,
    average_duration_secs: Option<i64>,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    report_start: Option<NaiveDateTime>,
    report_end: Option<NaiveDateTime>,
    hosts: BTreeMap<&'a str, JsonHost>,
    users: &'a BTreeMap<String, u64>,
    unique_users: usize,
    total_sessions: u64,
    diagnostics: usize,
}

/// Pretty JSON with per-host averages and the overall totals filled in.
pub fn render_json(report: &SessionReport) -> serde_json::Result<String> {
    let hosts: BTreeMap<&str, JsonHost> = report
        .hosts
        .iter()
        .map(|(host, stats)| {
            (
                host.as_str(),
                JsonHost {
                    session_count: stats.session_count,
                    total_duration_secs: stats.total_duration_secs,
                    average_duration_secs: stats.average_duration_secs(),
                },
            )
        })
        .collect();

    serde_json::to_string_pretty(&JsonReport {
        report_start: report.report_start,
        report_end: report.report_end,
        hosts,
        users: &report.users,
        unique_users: report.unique_users(),
        total_sessions: report.total_sessions(),
        diagnostics: report.diagnostics,
    })
}
