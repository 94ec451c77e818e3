use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};
use tracing::info;

mod burst_window;
mod config;
mod key_counter;
mod log_reader;
mod log_scanner;
mod logging;
mod models;
mod parser;
mod report;
mod timestamp;

use burst_window::{burst_window, ClientHistory, BURST_WINDOW_SECONDS};
use config::CommonArgs;
use parser::LogParser;
use report::{BurstReport, JsonReport};

/// Per-client burst analysis over an access log
#[derive(clap::Parser, Debug)]
#[command(name = "ip_burst_analyzer")]
#[command(about = "Reports, per client IP, the most requests seen within 10 seconds after any one request")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> Result<()> {
    logging::init_logging();
    let args = Args::parse();

    let parser = LogParser::new(args.common.local_timezone()?);
    let mut history = ClientHistory::new();

    let stats = log_scanner::scan_log_file(&args.common.log_file, &parser, |record| {
        if let Some((client_ip, timestamp)) = record.burst_key() {
            history.record(client_ip, timestamp);
        }
    })?;
    report::log_parse_stats(&stats);

    info!(
        clients = history.client_count(),
        window_seconds = BURST_WINDOW_SECONDS,
        "Computing burst windows"
    );
    let result = history.analyze(burst_window());

    let mut out = io::stdout().lock();
    report::write_burst_report(&mut out, &result)?;
    out.flush()?;

    if let Some(output_json) = &args.common.output_json {
        let json = JsonReport::new(&args.common.log_file, stats).with_bursts(BurstReport::new(&result));
        report::write_json_report(output_json, &json)?;
    }

    Ok(())
}
