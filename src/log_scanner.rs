use crate::log_reader::LogFileReader;
use crate::models::{ParseStats, ParsedRecord};
use crate::parser::LogParser;
use anyhow::Result;
use std::path::Path;
use tracing::{debug, info};

// Emit a progress event every N lines
const PROGRESS_INTERVAL_LINES: u64 = 250_000;

/// Single pass over a log file: parse every line and hand each record to `on_record`.
/// Returns the diagnostic counters for the run. Only an I/O failure aborts the scan.
pub(crate) fn scan_log_file<F>(path: &Path, parser: &LogParser, on_record: F) -> Result<ParseStats>
where
    F: FnMut(&ParsedRecord),
{
    info!(path = %path.display(), "Scanning log file");
    let mut reader = LogFileReader::open(path)?;
    scan_lines(&mut reader, parser, on_record)
}

pub(crate) fn scan_lines<F>(reader: &mut LogFileReader, parser: &LogParser, mut on_record: F) -> Result<ParseStats>
where
    F: FnMut(&ParsedRecord),
{
    let mut stats = ParseStats::default();

    while let Some(line) = reader.next_line()? {
        let record = parser.parse_line(line);

        if record.user_agent.is_none() {
            debug!(line = line.number, text = line.text, "Skipped line: no user agent");
        }

        stats.record(&record);
        on_record(&record);

        if stats.lines_processed % PROGRESS_INTERVAL_LINES == 0 {
            info!(lines_processed = stats.lines_processed, "Scan progress");
        }
    }

    Ok(stats)
}
