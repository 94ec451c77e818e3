use chrono::NaiveDateTime;
use serde::Serialize;

/// One raw line of input together with its 1-based position in the file
#[derive(Debug, Clone, Copy)]
pub(crate) struct LogLine<'a> {
    pub(crate) number: u64,
    pub(crate) text: &'a str,
}

/// Fields extracted from a single access log line.
/// Every field is independently optional; a missing field only excludes the
/// record from the analyses that need it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(dead_code)] // Not every binary reads every field
pub(crate) struct ParsedRecord {
    pub(crate) client_ip: Option<String>,
    pub(crate) timestamp: Option<NaiveDateTime>, // Normalized to UTC
    pub(crate) method: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) user_agent: Option<String>,
    pub(crate) source_line: u64,
}

#[allow(dead_code)]
impl ParsedRecord {
    /// Client address and timestamp, when both are present (burst analysis input)
    pub(crate) fn burst_key(&self) -> Option<(&str, NaiveDateTime)> {
        Some((self.client_ip.as_deref()?, self.timestamp?))
    }

    /// Endpoint path from the request token
    pub(crate) fn endpoint(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub(crate) fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

/// Per-run diagnostic counters. Reported next to the results, never mixed into them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ParseStats {
    pub(crate) lines_processed: u64,
    pub(crate) lines_with_user_agent: u64,
    pub(crate) lines_skipped: u64, // No user agent found
    pub(crate) lines_with_client_ip: u64,
    pub(crate) lines_with_timestamp: u64,
    pub(crate) lines_with_endpoint: u64,
}

impl ParseStats {
    pub(crate) fn record(&mut self, record: &ParsedRecord) {
        self.lines_processed += 1;

        if record.user_agent.is_some() {
            self.lines_with_user_agent += 1;
        } else {
            self.lines_skipped += 1;
        }
        if record.client_ip.is_some() {
            self.lines_with_client_ip += 1;
        }
        if record.timestamp.is_some() {
            self.lines_with_timestamp += 1;
        }
        if record.path.is_some() {
            self.lines_with_endpoint += 1;
        }
    }
}
