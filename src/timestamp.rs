use chrono::{FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

/// Textual timestamp layouts recognised in access logs, in the order they are tried.
///
/// Slash dates without a month name (`25/12/2023 10:15:30`) are always read
/// day-first. A US month-first date such as `12/25/2023` therefore fails to
/// parse instead of being silently reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimestampFormat {
    /// `[25/Dec/2023:10:15:30` with an optional ` -0600` offset
    Apache,
    /// `2023-12-25 10:15:30`
    Iso,
    /// `25/12/2023 10:15:30`
    SlashDayFirst,
}

impl TimestampFormat {
    pub(crate) const ALL: [TimestampFormat; 3] = [
        TimestampFormat::Apache,
        TimestampFormat::Iso,
        TimestampFormat::SlashDayFirst,
    ];

    fn pattern(self) -> &'static str {
        match self {
            TimestampFormat::Apache => {
                r"\[(?P<time>\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2})(?:\s+(?P<offset>[+-][0-9]{4}))?"
            }
            TimestampFormat::Iso => r"(?P<time>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})",
            TimestampFormat::SlashDayFirst => r"(?P<time>\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2})",
        }
    }

    fn chrono_format(self) -> &'static str {
        match self {
            TimestampFormat::Apache => "%d/%b/%Y:%H:%M:%S",
            TimestampFormat::Iso => "%Y-%m-%d %H:%M:%S",
            TimestampFormat::SlashDayFirst => "%d/%m/%Y %H:%M:%S",
        }
    }

    /// Pick the layout to parse a matched candidate with, based on its separators.
    /// Two slashes, two colons and no dash always mean the day-first slash layout,
    /// even when the candidate came from the bracketed Apache pattern.
    pub(crate) fn classify(candidate: &str) -> Option<Self> {
        let slashes = candidate.matches('/').count();
        let colons = candidate.matches(':').count();
        let has_dash = candidate.contains('-');

        if slashes == 2 && colons == 2 && !has_dash {
            Some(TimestampFormat::SlashDayFirst)
        } else if slashes > 0 && colons > 0 {
            Some(TimestampFormat::Apache)
        } else if has_dash {
            Some(TimestampFormat::Iso)
        } else {
            None
        }
    }
}

/// Finds the first parseable timestamp anywhere in a line and normalizes it to UTC
pub(crate) struct TimestampNormalizer {
    candidates: Vec<(TimestampFormat, Regex)>,
    local_tz: Tz,
}

impl TimestampNormalizer {
    pub(crate) fn new(local_tz: Tz) -> Self {
        let candidates = TimestampFormat::ALL
            .iter()
            .map(|format| (*format, Regex::new(format.pattern()).unwrap()))
            .collect();

        Self {
            candidates,
            local_tz,
        }
    }

    #[allow(dead_code)]
    pub(crate) fn formats(&self) -> Vec<TimestampFormat> {
        self.candidates.iter().map(|(format, _)| *format).collect()
    }

    pub(crate) fn normalize(&self, line: &str) -> Option<NaiveDateTime> {
        for (_, regex) in &self.candidates {
            let Some(captures) = regex.captures(line) else {
                continue;
            };
            let Some(time_str) = captures.name("time").map(|m| m.as_str()) else {
                continue;
            };
            let Some(format) = TimestampFormat::classify(time_str) else {
                continue;
            };

            // A structural match that fails to parse falls through to the next pattern
            let Ok(naive_dt) = NaiveDateTime::parse_from_str(time_str, format.chrono_format()) else {
                continue;
            };

            let tz_offset = captures
                .name("offset")
                .and_then(|m| parse_offset_seconds(m.as_str()));

            // A wall-clock time skipped by a DST change is treated like an unparseable one
            let Some(utc_dt) = self.convert_to_utc(naive_dt, tz_offset) else {
                continue;
            };
            return Some(utc_dt);
        }

        None
    }

    /// `None` only for a local time that falls in a DST gap of the configured zone
    fn convert_to_utc(&self, naive_dt: NaiveDateTime, tz_offset_secs: Option<i32>) -> Option<NaiveDateTime> {
        if let Some(offset_secs) = tz_offset_secs {
            if let Some(offset) = FixedOffset::east_opt(offset_secs) {
                if let Some(dt_with_tz) = offset.from_local_datetime(&naive_dt).earliest() {
                    return Some(dt_with_tz.with_timezone(&Utc).naive_utc());
                }
            }
        }
        // No explicit offset: the timestamp is in the configured local timezone
        self.local_tz
            .from_local_datetime(&naive_dt)
            .earliest()
            .map(|local_dt| local_dt.with_timezone(&Utc).naive_utc())
    }
}

/// Parse an offset like "+0000" or "-0600" into seconds east of UTC
fn parse_offset_seconds(tz_str: &str) -> Option<i32> {
    let sign = if tz_str.starts_with('-') { -1 } else { 1 };
    let hours: i32 = tz_str.get(1..3)?.parse().ok()?;
    let minutes: i32 = tz_str.get(3..5)?.parse().ok()?;
    Some(sign * (hours * 3600 + minutes * 60))
}
