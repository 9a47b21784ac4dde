use crate::{
    errors::{BookError, BookResult},
    orderbook::DualBook,
    orders::{Notional, Order, Quantity, Side, Timestamp},
    pricing::fill_cost,
};
use tracing::debug;

/// Observer invoked with the event timestamp and the new total, or `None`
/// when the target quantity can no longer be filled.
pub type PriceCallback = Box<dyn FnMut(Timestamp, Option<Notional>)>;

/// Which of the two derived signals changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Signal {
    /// Cost of buying the target quantity, walked over the asks.
    Buying,
    /// Proceeds of selling the target quantity, walked over the bids.
    Selling,
}

impl Signal {
    /// The signal whose value is computed from `side`.
    pub fn sourced_from(side: Side) -> Self {
        match side {
            Side::Sell => Signal::Buying,
            Side::Buy => Signal::Selling,
        }
    }

    /// The book side walked to compute this signal.
    pub fn source_side(self) -> Side {
        match self {
            Signal::Buying => Side::Sell,
            Signal::Selling => Side::Buy,
        }
    }
}

/// Watches a single instrument's book and reports the cost of filling a
/// fixed target quantity on either side whenever it changes.
///
/// Events must be applied in arrival order: "changed" is judged against the
/// last value emitted for each signal, not against the book alone.
pub struct Monitor {
    target: Quantity,
    book: DualBook,
    last_buying: Option<Notional>,
    last_selling: Option<Notional>,
    on_buying: Option<PriceCallback>,
    on_selling: Option<PriceCallback>,
}

impl Monitor {
    pub fn new(target: Quantity) -> BookResult<Self> {
        if target == 0 {
            return Err(BookError::ZeroTarget);
        }
        Ok(Self {
            target,
            book: DualBook::new(),
            last_buying: None,
            last_selling: None,
            on_buying: None,
            on_selling: None,
        })
    }

    pub fn target(&self) -> Quantity {
        self.target
    }

    pub fn book(&self) -> &DualBook {
        &self.book
    }

    /// Last emitted cost of buying the target quantity.
    pub fn buying_price(&self) -> Option<Notional> {
        self.last_buying
    }

    /// Last emitted proceeds of selling the target quantity.
    pub fn selling_price(&self) -> Option<Notional> {
        self.last_selling
    }

    /// Registers the buying-price observer, replacing any previous one.
    pub fn on_buying_price_changed<F>(&mut self, callback: F)
    where
        F: FnMut(Timestamp, Option<Notional>) + 'static,
    {
        self.on_buying = Some(Box::new(callback));
    }

    /// Registers the selling-price observer, replacing any previous one.
    pub fn on_selling_price_changed<F>(&mut self, callback: F)
    where
        F: FnMut(Timestamp, Option<Notional>) + 'static,
    {
        self.on_selling = Some(Box::new(callback));
    }

    /// Applies a new limit order and re-evaluates the signal fed by its side.
    pub fn add(&mut self, timestamp: Timestamp, order: Order) -> BookResult<()> {
        let side = order.side;
        self.book.insert(order)?;
        self.refresh(timestamp, Signal::sourced_from(side));
        Ok(())
    }

    /// Reduces a live order by `quantity`, removing it once nothing remains.
    ///
    /// Reducing by more than the remaining size is a full removal, not an
    /// error. A zero reduction or an unknown identifier leaves the book and
    /// observers untouched.
    pub fn reduce(&mut self, timestamp: Timestamp, id: &str, quantity: Quantity) -> BookResult<()> {
        if quantity == 0 {
            return Err(BookError::ZeroQuantity(id.to_owned()));
        }
        let (side, remaining) = match self.book.locate(id) {
            Some(order) => (order.side, order.quantity),
            None => return Err(BookError::UnknownOrder(id.to_owned())),
        };

        match remaining.checked_sub(quantity) {
            Some(left) if left > 0 => self.book.mutate_quantity(id, left)?,
            _ => {
                self.book.remove(id)?;
            }
        }
        self.refresh(timestamp, Signal::sourced_from(side));
        Ok(())
    }

    /// Recomputes `signal` and fires its observer if the value moved.
    fn refresh(&mut self, timestamp: Timestamp, signal: Signal) {
        let current = fill_cost(self.book.levels(signal.source_side()), self.target);
        let (last, callback) = match signal {
            Signal::Buying => (&mut self.last_buying, &mut self.on_buying),
            Signal::Selling => (&mut self.last_selling, &mut self.on_selling),
        };
        if *last == current {
            return;
        }
        *last = current;
        debug!(timestamp, ?signal, total = ?current, "price changed");
        if let Some(callback) = callback.as_mut() {
            callback(timestamp, current);
        }
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("target", &self.target)
            .field("book", &self.book)
            .field("last_buying", &self.last_buying)
            .field("last_selling", &self.last_selling)
            .finish_non_exhaustive()
    }
}
