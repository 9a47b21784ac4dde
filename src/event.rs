//! Decoding of the textual event feed.
//!
//! ```text
//! <timestamp> A <order-id> <B|S> <price> <size>
//! <timestamp> R <order-id> <size>
//! ```
//!
//! Prices are decimals in currency units and are converted to integer cents
//! with round-half-away-from-zero.

use std::str::{FromStr, SplitWhitespace};

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::{
    errors::{BookResult, FeedError},
    monitor::Monitor,
    orders::{Order, OrderId, Price, Quantity, Side, Timestamp},
};

/// One decoded feed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Add {
        timestamp: Timestamp,
        order: Order,
    },
    Reduce {
        timestamp: Timestamp,
        id: OrderId,
        quantity: Quantity,
    },
}

impl Event {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Event::Add { timestamp, .. } | Event::Reduce { timestamp, .. } => *timestamp,
        }
    }

    pub fn order_id(&self) -> &str {
        match self {
            Event::Add { order, .. } => &order.id,
            Event::Reduce { id, .. } => id,
        }
    }

    /// Feeds this event into `monitor`.
    pub fn apply(self, monitor: &mut Monitor) -> BookResult<()> {
        match self {
            Event::Add { timestamp, order } => monitor.add(timestamp, order),
            Event::Reduce {
                timestamp,
                id,
                quantity,
            } => monitor.reduce(timestamp, &id, quantity),
        }
    }
}

impl FromStr for Event {
    type Err = FeedError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split_whitespace();
        let timestamp = next_number(&mut fields, "timestamp")?;
        let action = next_field(&mut fields, "action")?;
        let id = next_field(&mut fields, "order id")?.to_owned();

        let event = match action {
            "A" => {
                let side = match next_field(&mut fields, "side")? {
                    "B" => Side::Buy,
                    "S" => Side::Sell,
                    other => return Err(FeedError::UnknownSide(other.to_owned())),
                };
                let price = parse_price(next_field(&mut fields, "price")?)?;
                let quantity = next_size(&mut fields)?;
                Event::Add {
                    timestamp,
                    order: Order::new(id, side, price, quantity),
                }
            }
            "R" => Event::Reduce {
                timestamp,
                id,
                quantity: next_size(&mut fields)?,
            },
            other => return Err(FeedError::UnknownAction(other.to_owned())),
        };

        let rest: Vec<&str> = fields.collect();
        if !rest.is_empty() {
            return Err(FeedError::TrailingInput(rest.join(" ")));
        }
        Ok(event)
    }
}

/// Parses one feed line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Event>, FeedError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    line.parse().map(Some)
}

/// Converts a decimal price such as `44.265` into cents, rounding halves
/// away from zero.
pub fn parse_price(text: &str) -> Result<Price, FeedError> {
    let invalid = || FeedError::InvalidPrice(text.to_owned());
    let price = Decimal::from_str(text).map_err(|_| invalid())?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(invalid());
    }
    price
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_u64())
        .ok_or_else(invalid)
}

fn next_field<'a>(fields: &mut SplitWhitespace<'a>, name: &'static str) -> Result<&'a str, FeedError> {
    fields.next().ok_or(FeedError::MissingField(name))
}

fn next_number<T: FromStr>(fields: &mut SplitWhitespace<'_>, name: &'static str) -> Result<T, FeedError> {
    let value = next_field(fields, name)?;
    value.parse().map_err(|_| FeedError::InvalidNumber {
        field: name,
        value: value.to_owned(),
    })
}

fn next_size(fields: &mut SplitWhitespace<'_>) -> Result<Quantity, FeedError> {
    match next_number(fields, "size")? {
        0 => Err(FeedError::ZeroSize),
        size => Ok(size),
    }
}
