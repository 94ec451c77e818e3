use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Arguments shared by every analyzer binary
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct CommonArgs {
    /// Access log file to analyze (.log, .gz or .zst)
    pub(crate) log_file: PathBuf,

    /// Timezone for timestamps without an explicit offset, e.g. "Europe/Berlin".
    /// Defaults to $TZ, then UTC.
    #[arg(long)]
    pub(crate) timezone: Option<String>,

    /// Also write the results as JSON to this path
    #[arg(long)]
    pub(crate) output_json: Option<PathBuf>,
}

impl CommonArgs {
    pub(crate) fn local_timezone(&self) -> Result<Tz> {
        resolve_timezone(self.timezone.as_deref(), env::var("TZ").ok().as_deref())
    }
}

/// An explicit timezone must be valid. A bad $TZ only falls back to UTC, since
/// it usually comes from the surrounding environment rather than the user.
pub(crate) fn resolve_timezone(explicit: Option<&str>, env_tz: Option<&str>) -> Result<Tz> {
    if let Some(tz_str) = explicit {
        return tz_str
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid timezone '{}': {}", tz_str, e));
    }

    match env_tz {
        Some(tz_str) if !tz_str.is_empty() => Ok(tz_str.parse::<Tz>().unwrap_or_else(|_| {
            warn!(tz = tz_str, "Unrecognized TZ value, using UTC");
            chrono_tz::UTC
        })),
        _ => Ok(chrono_tz::UTC),
    }
}
