use std::{fmt, io::Write};

use crate::{
    monitor::Signal,
    orders::{Notional, Timestamp},
};

/// A single emitted signal change.
///
/// `total` is in cents; `None` means the target quantity cannot currently be
/// filled from the resting liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PriceChange {
    pub timestamp: Timestamp,
    pub signal: Signal,
    pub total: Option<Notional>,
}

/// How emitted changes are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// `<timestamp> <B|S> <total|NA>`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl PriceChange {
    pub fn new(timestamp: Timestamp, signal: Signal, total: Option<Notional>) -> Self {
        Self {
            timestamp,
            signal,
            total,
        }
    }

    /// Writes this change as one line in `format`.
    pub fn write_to<W: Write>(&self, out: &mut W, format: OutputFormat) -> anyhow::Result<()> {
        match format {
            OutputFormat::Text => writeln!(out, "{self}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, self)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for PriceChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.signal {
            Signal::Buying => 'B',
            Signal::Selling => 'S',
        };
        write!(f, "{} {} ", self.timestamp, tag)?;
        match self.total {
            Some(cents) => write!(f, "{}", Cents(cents)),
            None => f.write_str("NA"),
        }
    }
}

/// Renders an amount in cents as currency units with two decimals.
pub struct Cents(pub Notional);

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
