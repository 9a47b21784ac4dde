//! Aggregate cost of filling a fixed quantity against one side of the book.
//!
//! The walk starts at the best level and moves to successively worse ones,
//! taking `min(available, remaining)` at each price, so only as many levels
//! as are needed to cover the target are visited.

use crate::{
    orderbook::Level,
    orders::{Notional, Quantity},
};

/// Total cost (or proceeds) of consuming exactly `target` units from
/// `levels`, which must be ordered best price first.
///
/// Returns `None` when the levels run out before `target` is covered.
/// This is a total, not a per-unit average.
pub fn fill_cost<I>(levels: I, target: Quantity) -> Option<Notional>
where
    I: IntoIterator<Item = Level>,
{
    let mut remaining = target;
    let mut total: Notional = 0;

    for level in levels {
        // Determine how many units this level contributes
        let take = remaining.min(level.quantity);
        total += Notional::from(level.price) * Notional::from(take);
        remaining -= take;
        if remaining == 0 {
            return Some(total);
        }
    }
    None
}
