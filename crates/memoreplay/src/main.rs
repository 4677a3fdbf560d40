//! memoreplay - replay recorded cache requests through memocache

mod replay;
mod trace;

use anyhow::{Context, Result};
use clap::Parser;
use memocache::RequestLog;
use std::path::PathBuf;
use tracing::info;

use crate::replay::{replay, Report};
use crate::trace::read_trace;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Request trace, one key per line
    trace: PathBuf,

    /// Cache capacity (0 = unbounded); comma-separate to compare several
    #[arg(short, long, value_delimiter = ',', default_value = "1000")]
    capacity: Vec<usize>,

    /// Number of most recently used keys to list
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Write the replayed requests to this file (first capacity only)
    #[arg(long)]
    record: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("Starting memoreplay v{}", env!("CARGO_PKG_VERSION"));
    info!("Trace: {:?}", args.trace);
    info!("Capacities: {:?}", args.capacity);

    let requests = read_trace(&args.trace)?;
    info!("Loaded {} requests", requests.len());

    let log = args.record.as_ref().map(|_| RequestLog::new());

    let reports: Vec<Report> = args
        .capacity
        .iter()
        .enumerate()
        .map(|(i, &capacity)| {
            let log = if i == 0 { log.clone() } else { None };
            replay(&requests, capacity, args.top, log)
        })
        .collect();

    if let (Some(path), Some(log)) = (&args.record, &log) {
        log.write_to(path)
            .with_context(|| format!("Failed to write request log {:?}", path))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_table(&reports);
    }

    Ok(())
}

fn print_table(reports: &[Report]) {
    println!(
        "{:>10} {:>10} {:>10} {:>10} {:>10} {:>9}",
        "capacity", "requests", "hits", "misses", "evictions", "hit ratio"
    );
    for report in reports {
        let capacity = if report.capacity == 0 {
            "unbounded".to_string()
        } else {
            report.capacity.to_string()
        };
        println!(
            "{:>10} {:>10} {:>10} {:>10} {:>10} {:>8.2}%",
            capacity,
            report.requests,
            report.hits,
            report.misses,
            report.evictions,
            report.hit_ratio * 100.0
        );
    }

    for report in reports {
        println!(
            "\ncapacity {} holds {} keys, most recent: {}",
            report.capacity,
            report.size,
            report.most_recent.join(", ")
        );
    }
}
