use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use picoclobber_core::sim::{self, HostSink, RunSummary};
use picoclobber_core::{AtomicScratch, ClobberFlag, Reporter, ScratchRegion, REGION_LEN};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a board profile (YAML); Pico defaults when omitted
    #[arg(short, long)]
    board: Option<PathBuf>,

    /// Number of status lines to emit before stopping (0 = run forever)
    #[arg(short, long, default_value = "64")]
    lines: u64,

    /// Delay before the clobber worker is launched, in milliseconds
    #[arg(long, default_value = "0")]
    worker_delay_ms: u64,

    /// Pace serial output at the profile's baud rate
    #[arg(long)]
    throttle: bool,

    /// Write a JSON run summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Enable debug-level tracing
    #[arg(short, long)]
    trace: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the serial stream and nothing else.
    if args.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    info!("Starting PicoClobber host demo");

    let profile = match &args.board {
        Some(path) => {
            info!("Loading board profile: {:?}", path);
            picoclobber_config::BoardProfile::from_file(path)?
        }
        None => {
            info!("Using default Pico board profile");
            picoclobber_config::BoardProfile::default()
        }
    };
    info!(
        "Board '{}': UART {} baud on GPIO{}/GPIO{}, scratch region at {:#x}",
        profile.name,
        profile.uart.baud,
        profile.uart.tx_pin,
        profile.uart.rx_pin,
        profile.scratch.base
    );

    let region = Arc::new(AtomicScratch::new());
    let flag = Arc::new(ClobberFlag::new());
    let before = region.snapshot();

    let started = Instant::now();
    let worker = sim::spawn_worker(
        region.clone(),
        flag.clone(),
        Duration::from_millis(args.worker_delay_ms),
    );

    let stdout = std::io::stdout();
    let mut sink = if args.throttle {
        HostSink::throttled(stdout.lock(), profile.uart.baud)
    } else {
        HostSink::new(stdout.lock())
    };

    let mut reporter = Reporter::new();
    let mut emitted: u64 = 0;
    let budget = args.lines;
    reporter.run(&mut sink, &flag, || 0, || {
        emitted += 1;
        budget != 0 && emitted >= budget
    });

    let stats = worker.stop()?;
    let after = region.snapshot();
    let touched = before.iter().zip(after.iter()).filter(|(b, a)| a != b).count();

    let summary = RunSummary {
        lines_emitted: emitted,
        final_counter: reporter.counter(),
        worker_iterations: stats.iterations,
        clobber_observed: flag.is_raised(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    info!(
        "Reporter emitted {} lines (counter now {:#x})",
        summary.lines_emitted, summary.final_counter
    );
    info!(
        "Worker ran {} iterations; {} of {} bytes visibly changed",
        stats.iterations, touched, REGION_LEN
    );

    if let Some(path) = &args.summary {
        let f = std::fs::File::create(path)
            .with_context(|| format!("Failed to create summary file at {:?}", path))?;
        serde_json::to_writer_pretty(f, &summary).context("Failed to write run summary")?;
        info!("Run summary written to {:?}", path);
    }

    Ok(())
}
