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
use report::{JsonReport, UserAgentReport};

/// User agent counter and categorizer
#[derive(clap::Parser, Debug)]
#[command(name = "user_agent_counter")]
#[command(about = "Counts requests per user agent and groups them into bots, browsers, mobile and tools")]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Only list the N most frequent user agents (categories always cover all of them)
    #[arg(long)]
    top: Option<usize>,
}

fn main() -> Result<()> {
    logging::init_logging();
    let args = Args::parse();

    let parser = LogParser::new(args.common.local_timezone()?);
    let mut user_agents = KeyCounter::new();

    let stats = log_scanner::scan_log_file(&args.common.log_file, &parser, |record| {
        if let Some(user_agent) = record.user_agent() {
            user_agents.increment(user_agent);
        }
    })?;
    report::log_parse_stats(&stats);

    let mut out = io::stdout().lock();
    report::write_user_agent_report(&mut out, &user_agents, args.top)?;
    out.flush()?;

    if let Some(output_json) = &args.common.output_json {
        let json = JsonReport::new(&args.common.log_file, stats)
            .with_user_agents(UserAgentReport::new(&user_agents, args.top));
        report::write_json_report(output_json, &json)?;
    }

    Ok(())
}
