use anyhow::Context;
use clap::Parser;
use std::{
    cell::RefCell,
    collections::VecDeque,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::PathBuf,
    rc::Rc,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    event::parse_line,
    monitor::{Monitor, Signal},
    orders::{Quantity, Side},
    report::{OutputFormat, PriceChange},
};

/// Reads order book events and reports the cost of filling a target size
#[derive(Parser, Debug)]
#[command(name = "pricer")]
#[command(
    version,
    about = "Tracks the cost of buying and selling a target size against a limit order book"
)]
pub struct Cli {
    /// Quantity to price on each side (must be > 0)
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub target_size: Quantity,

    /// Read events from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Stop at the first malformed line, unknown order or duplicate add
    #[arg(long)]
    pub strict: bool,

    /// Output format for price changes
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Log the top levels of both sides once the input is exhausted
    #[arg(long)]
    pub dump_book: bool,
}

/// Counters for one pass over the input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub skipped: usize,
    pub emitted: usize,
}

const DUMP_DEPTH: usize = 10;

/// Feeds every line of `input` through a fresh [`Monitor`] and writes each
/// price change to `out` as it happens.
///
/// Lines that fail to decode or apply are logged and skipped unless
/// `--strict` is set. A corrupted book always aborts the run.
pub fn run<R: BufRead, W: Write>(cli: &Cli, input: R, out: &mut W) -> anyhow::Result<RunSummary> {
    let mut monitor = Monitor::new(cli.target_size)?;
    let pending: Rc<RefCell<VecDeque<PriceChange>>> = Rc::default();

    let queue = Rc::clone(&pending);
    monitor.on_buying_price_changed(move |ts, total| {
        queue
            .borrow_mut()
            .push_back(PriceChange::new(ts, Signal::Buying, total));
    });
    let queue = Rc::clone(&pending);
    monitor.on_selling_price_changed(move |ts, total| {
        queue
            .borrow_mut()
            .push_back(PriceChange::new(ts, Signal::Selling, total));
    });

    let mut summary = RunSummary::default();
    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;

        let event = match parse_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) if cli.strict => {
                return Err(e).with_context(|| format!("malformed event on line {line_no}"));
            }
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping malformed event");
                summary.skipped += 1;
                continue;
            }
        };

        let id = event.order_id().to_owned();
        let timestamp = event.timestamp();
        match event.apply(&mut monitor) {
            Ok(()) => summary.applied += 1,
            Err(e) if e.is_fatal() => {
                error!(line = line_no, error = %e, "order book state is corrupted");
                return Err(e).with_context(|| format!("aborting at line {line_no}"));
            }
            Err(e) if cli.strict => {
                return Err(e).with_context(|| format!("rejected event on line {line_no}"));
            }
            Err(e) => {
                warn!(line = line_no, timestamp, order = %id, error = %e, "skipping rejected event");
                summary.skipped += 1;
            }
        }

        let changes: Vec<PriceChange> = pending.borrow_mut().drain(..).collect();
        for change in changes {
            change.write_to(out, cli.format)?;
            summary.emitted += 1;
        }
    }

    if cli.dump_book {
        dump_book(&monitor)?;
    }
    info!(
        target = monitor.target(),
        applied = summary.applied,
        skipped = summary.skipped,
        emitted = summary.emitted,
        "input exhausted"
    );
    Ok(summary)
}

fn dump_book(monitor: &Monitor) -> anyhow::Result<()> {
    let book = monitor.book();
    let bids = serde_json::to_string(&book.depth(Side::Buy, DUMP_DEPTH))?;
    let asks = serde_json::to_string(&book.depth(Side::Sell, DUMP_DEPTH))?;
    info!(orders = book.len(), %bids, %asks, "final book");
    Ok(())
}

/// Installs the stderr log subscriber, honouring `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            run(&cli, BufReader::new(file), &mut out)?;
        }
        None => {
            run(&cli, io::stdin().lock(), &mut out)?;
        }
    }
    out.flush().context("failed to flush output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pricer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parses_arguments() {
        let c = cli(&["200", "--strict", "--format", "json", "--dump-book"]);
        assert_eq!(c.target_size, 200);
        assert!(c.strict && c.dump_book);
        assert_eq!(c.format, OutputFormat::Json);
        assert!(c.input.is_none());
    }

    #[test]
    fn test_rejects_zero_target() {
        assert!(Cli::try_parse_from(["pricer", "0"]).is_err());
    }

    #[test]
    fn test_lenient_run_skips_bad_lines() {
        let input = "1 A a S 10.00 5\nbogus\n2 R nope 1\n\n3 R a 5\n";
        let mut out = Vec::new();
        let summary = run(&cli(&["5"]), input.as_bytes(), &mut out).unwrap();

        assert_eq!(
            summary,
            RunSummary {
                applied: 2,
                skipped: 2,
                emitted: 2
            }
        );
        assert_eq!(String::from_utf8(out).unwrap(), "1 B 50.00\n3 B NA\n");
    }

    #[test]
    fn test_strict_run_stops_at_first_error() {
        let input = "1 A a S 10.00 5\n2 R nope 1\n3 R a 5\n";
        let mut out = Vec::new();
        let err = run(&cli(&["5", "--strict"]), input.as_bytes(), &mut out).unwrap_err();

        assert!(err.to_string().contains("line 2"));
        assert_eq!(String::from_utf8(out).unwrap(), "1 B 50.00\n");
    }
}
