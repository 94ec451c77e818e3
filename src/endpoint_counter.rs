use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};

#[allow(dead_code)] // Only the report types are used here
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

use config::CommonArgs;
use key_counter::KeyCounter;
use parser::LogParser;
use report::{JsonReport, KeyCountReport};

/// Endpoint hit counter
#[derive(clap::Parser, Debug)]
#[command(name = "endpoint_counter")]
#[command(about = "Counts requests per endpoint path (\"METHOD /path HTTP/x\")")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Only list the N most requested endpoints
    #[arg(long)]
    top: Option<usize>,
}

fn main() -> Result<()> {
    logging::init_logging();
    let args = Args::parse();

    let parser = LogParser::new(args.common.local_timezone()?);
    let mut endpoints = KeyCounter::new();

    let stats = log_scanner::scan_log_file(&args.common.log_file, &parser, |record| {
        if let Some(endpoint) = record.endpoint() {
            endpoints.increment(endpoint);
        }
    })?;
    report::log_parse_stats(&stats);

    let mut out = io::stdout().lock();
    report::write_endpoint_report(&mut out, &endpoints, args.top)?;
    out.flush()?;

    if let Some(output_json) = &args.common.output_json {
        let json = JsonReport::new(&args.common.log_file, stats)
            .with_endpoints(KeyCountReport::new(&endpoints, args.top));
        report::write_json_report(output_json, &json)?;
    }

    Ok(())
}
