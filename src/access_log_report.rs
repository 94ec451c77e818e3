use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};

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

use burst_window::{burst_window, ClientHistory};
use config::CommonArgs;
use key_counter::KeyCounter;
use parser::LogParser;
use report::{BurstReport, JsonReport, KeyCountReport, UserAgentReport};

/// Combined access log report
#[derive(clap::Parser, Debug)]
#[command(name = "access_log_report")]
#[command(about = "Burst windows, endpoint counts and user agents from a single read of the log")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Limit the endpoint and user agent listings to the N most frequent entries
    #[arg(long)]
    top: Option<usize>,
}

fn main() -> Result<()> {
    logging::init_logging();
    let args = Args::parse();

    let parser = LogParser::new(args.common.local_timezone()?);

    // Each analysis owns its accumulator; the scan fans every record out to all three
    let mut history = ClientHistory::new();
    let mut endpoints = KeyCounter::new();
    let mut user_agents = KeyCounter::new();

    let stats = log_scanner::scan_log_file(&args.common.log_file, &parser, |record| {
        if let Some((client_ip, timestamp)) = record.burst_key() {
            history.record(client_ip, timestamp);
        }
        if let Some(endpoint) = record.endpoint() {
            endpoints.increment(endpoint);
        }
        if let Some(user_agent) = record.user_agent() {
            user_agents.increment(user_agent);
        }
    })?;
    report::log_parse_stats(&stats);

    let bursts = history.analyze(burst_window());

    let mut out = io::stdout().lock();
    report::write_burst_report(&mut out, &bursts)?;
    writeln!(out)?;
    writeln!(out, "Endpoint Request Counts")?;
    writeln!(out, "{}", "=".repeat(50))?;
    report::write_endpoint_report(&mut out, &endpoints, args.top)?;
    writeln!(out)?;
    report::write_user_agent_report(&mut out, &user_agents, args.top)?;
    out.flush()?;

    if let Some(output_json) = &args.common.output_json {
        let json = JsonReport::new(&args.common.log_file, stats)
            .with_bursts(BurstReport::new(&bursts))
            .with_endpoints(KeyCountReport::new(&endpoints, args.top))
            .with_user_agents(UserAgentReport::new(&user_agents, args.top));
        report::write_json_report(output_json, &json)?;
    }

    Ok(())
}
