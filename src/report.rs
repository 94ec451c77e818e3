//! Presentation of analysis results: text listings and JSON reports.
//!
//! Each binary uses only the sections for its own analysis; the section
//! writers and report types carry `#[allow(dead_code)]` for the binaries that skip them.

use crate::burst_window::{BurstResult, BURST_WINDOW_SECONDS};
use crate::key_counter::{categorize_user_agents, KeyCounter, UserAgentCategory};
use crate::models::ParseStats;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

#[allow(dead_code)]
pub(crate) fn write_burst_report<W: Write>(out: &mut W, result: &BurstResult) -> io::Result<()> {
    if result.is_empty() {
        writeln!(out, "No IP addresses with timestamps found")?;
        return Ok(());
    }

    writeln!(out, "IP Address Request Window Analysis ({}-second windows)", BURST_WINDOW_SECONDS)?;
    writeln!(out, "{}", "=".repeat(55))?;

    for (client_ip, max_requests) in result.ranked() {
        if max_requests > 0 {
            writeln!(
                out,
                "{}: {} requests after first in {}s window",
                client_ip, max_requests, BURST_WINDOW_SECONDS
            )?;
        }
    }

    let zero_count = result.zero_count();
    if zero_count > 0 {
        writeln!(out, "\n{} IPs had no burst activity (single requests only)", zero_count)?;
    }

    Ok(())
}

#[allow(dead_code)]
pub(crate) fn write_endpoint_report<W: Write>(
    out: &mut W,
    endpoints: &KeyCounter,
    top: Option<usize>,
) -> io::Result<()> {
    if endpoints.is_empty() {
        writeln!(out, "No endpoints found in log file")?;
        return Ok(());
    }

    for (endpoint, count) in endpoints.ranked().into_iter().take(top.unwrap_or(usize::MAX)) {
        writeln!(out, "{}: {}", endpoint, count)?;
    }

    Ok(())
}

#[allow(dead_code)]
pub(crate) fn write_user_agent_report<W: Write>(
    out: &mut W,
    user_agents: &KeyCounter,
    top: Option<usize>,
) -> io::Result<()> {
    if user_agents.is_empty() {
        writeln!(out, "No user agents found in log file")?;
        return Ok(());
    }

    writeln!(out, "User Agent Request Analysis")?;
    writeln!(out, "{}", "=".repeat(50))?;

    match top {
        Some(limit) => writeln!(out, "\nTop {} User Agents by Request Count:", limit)?,
        None => writeln!(out, "\nAll User Agents by Request Count:")?,
    }
    writeln!(out, "{}", "-".repeat(50))?;

    let ranked = user_agents.ranked();
    for (rank, (user_agent, count)) in ranked.iter().take(top.unwrap_or(usize::MAX)).enumerate() {
        writeln!(out, "{:2}. Requests: {}", rank + 1, count)?;
        writeln!(out, "    Full User Agent: {}", user_agent)?;
        writeln!(out)?;
    }

    writeln!(out, "\nUser Agent Categories:")?;
    writeln!(out, "{}", "-".repeat(30))?;
    for (category, count) in categorize_user_agents(user_agents) {
        writeln!(out, "{}: {} requests", category.label(), count)?;
    }

    writeln!(out, "\nTotal unique user agents: {}", user_agents.len())?;
    writeln!(out, "Total requests analyzed: {}", user_agents.total())?;

    Ok(())
}

/// Diagnostic counters go to the log, never into the report body
pub(crate) fn log_parse_stats(stats: &ParseStats) {
    info!(
        lines_processed = stats.lines_processed,
        lines_with_user_agent = stats.lines_with_user_agent,
        lines_skipped = stats.lines_skipped,
        lines_with_client_ip = stats.lines_with_client_ip,
        lines_with_timestamp = stats.lines_with_timestamp,
        lines_with_endpoint = stats.lines_with_endpoint,
        "Scan complete"
    );
}

#[allow(dead_code)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClientBurst<'a> {
    client_ip: &'a str,
    max_requests_in_window: usize,
}

#[allow(dead_code)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BurstReport<'a> {
    window_seconds: i64,
    clients: Vec<ClientBurst<'a>>,
    zero_burst_clients: usize,
}

#[allow(dead_code)]
impl<'a> BurstReport<'a> {
    pub(crate) fn new(result: &'a BurstResult) -> Self {
        let clients = result
            .ranked()
            .into_iter()
            .map(|(client_ip, max_requests_in_window)| ClientBurst {
                client_ip,
                max_requests_in_window,
            })
            .collect();

        Self {
            window_seconds: BURST_WINDOW_SECONDS,
            clients,
            zero_burst_clients: result.zero_count(),
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Serialize)]
pub(crate) struct KeyCountEntry<'a> {
    key: &'a str,
    count: u64,
}

#[allow(dead_code)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KeyCountReport<'a> {
    unique_keys: usize,
    total_count: u64,
    entries: Vec<KeyCountEntry<'a>>,
}

#[allow(dead_code)]
impl<'a> KeyCountReport<'a> {
    pub(crate) fn new(counter: &'a KeyCounter, top: Option<usize>) -> Self {
        let entries = counter
            .ranked()
            .into_iter()
            .take(top.unwrap_or(usize::MAX))
            .map(|(key, count)| KeyCountEntry { key, count })
            .collect();

        Self {
            unique_keys: counter.len(),
            total_count: counter.total(),
            entries,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Serialize)]
pub(crate) struct CategoryCount {
    category: UserAgentCategory,
    count: u64,
}

#[allow(dead_code)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserAgentReport<'a> {
    user_agents: KeyCountReport<'a>,
    categories: Vec<CategoryCount>,
}

#[allow(dead_code)]
impl<'a> UserAgentReport<'a> {
    pub(crate) fn new(user_agents: &'a KeyCounter, top: Option<usize>) -> Self {
        let categories = categorize_user_agents(user_agents)
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();

        Self {
            user_agents: KeyCountReport::new(user_agents, top),
            categories,
        }
    }
}

/// Envelope written by `--output-json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonReport<'a> {
    source: String,
    generated_at: String,
    stats: ParseStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    bursts: Option<BurstReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoints: Option<KeyCountReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agents: Option<UserAgentReport<'a>>,
}

impl<'a> JsonReport<'a> {
    pub(crate) fn new(source: &Path, stats: ParseStats) -> Self {
        Self {
            source: source.display().to_string(),
            generated_at: Utc::now().to_rfc3339(),
            stats,
            bursts: None,
            endpoints: None,
            user_agents: None,
        }
    }

    #[allow(dead_code)]
    pub(crate) fn with_bursts(mut self, bursts: BurstReport<'a>) -> Self {
        self.bursts = Some(bursts);
        self
    }

    #[allow(dead_code)]
    pub(crate) fn with_endpoints(mut self, endpoints: KeyCountReport<'a>) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    #[allow(dead_code)]
    pub(crate) fn with_user_agents(mut self, user_agents: UserAgentReport<'a>) -> Self {
        self.user_agents = Some(user_agents);
        self
    }
}

/// Write a report as pretty JSON with write-and-rename, so readers never see a partial file
pub(crate) fn write_json_report<T: Serialize>(output_path: &Path, report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    let parent_dir = match output_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp_file = NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("Failed to create temp file in {}", parent_dir.display()))?;

    temp_file.write_all(json.as_bytes())?;
    temp_file.flush()?;

    // Close the handle before persisting (required on Windows)
    let temp_path = temp_file.into_temp_path();
    temp_path
        .persist(output_path)
        .with_context(|| format!("Failed to write report: {}", output_path.display()))?;

    info!(path = %output_path.display(), "JSON report written");
    Ok(())
}
