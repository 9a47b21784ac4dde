//! Order book state monitor.
//!
//! Keeps a descriptive limit order book for one instrument and reports, every
//! time it changes, what it would cost to buy a fixed target size against the
//! asks and what selling the same size into the bids would raise.

pub mod cli;
pub mod errors;
pub mod event;
pub mod monitor;
pub mod orderbook;
pub mod orders;
pub mod pricing;
pub mod report;
