use crate::{
    errors::{BookError, BookResult},
    orders::{Order, OrderId, Price, Quantity, Side},
};
use std::collections::{BTreeMap, VecDeque, btree_map::Entry};
use tracing::debug;

/// Aggregated view of one price level: the price and the total resting
/// quantity of every order queued at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Level {
    pub price: Price,
    pub quantity: Quantity,
}

/// A [`DualBook`] holds every **live** order twice:
/// - once in `orders`, keyed by identifier, for reductions;
/// - once in `bids` or `asks`, keyed by price, for the aggregate walk.
///
/// Each price level (key) has a FIFO queue of orders stored in a [`VecDeque`]
/// to keep **price-time** priority. The two copies of an order are
/// independent values; every quantity change goes through
/// [`DualBook::mutate_quantity`] so they never drift apart.
#[derive(Debug, Default)]
pub struct DualBook {
    /// Every live order, keyed by identifier.
    orders: BTreeMap<OrderId, Order>,

    /// Buy orders, keyed by price in ascending order.
    ///
    /// Walked **in reverse** so the highest bid comes first.
    bids: BTreeMap<Price, VecDeque<Order>>,

    /// Sell orders, keyed by price in ascending order.
    ///
    /// Walked **forwards** so the lowest ask comes first.
    asks: BTreeMap<Price, VecDeque<Order>>,
}

/// Internal enum to unify forward (`Iter`) and reverse (`Rev<Iter>`) BTreeMap iteration.
///
/// - [`EitherIter::Fwd`] handles ascending iteration over prices (asks).
/// - [`EitherIter::Rev`] handles descending iteration over prices (bids).
enum EitherIter<'a> {
    /// Forward (ascending) iteration over the price levels.
    Fwd(std::collections::btree_map::Iter<'a, Price, VecDeque<Order>>),
    /// Reverse (descending) iteration over the price levels.
    Rev(std::iter::Rev<std::collections::btree_map::Iter<'a, Price, VecDeque<Order>>>),
}

impl<'a> Iterator for EitherIter<'a> {
    type Item = (&'a Price, &'a VecDeque<Order>);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            EitherIter::Fwd(iter) => iter.next(),
            EitherIter::Rev(iter) => iter.next(),
        }
    }
}

/// Price levels of one side, best price first.
///
/// Created by [`DualBook::levels`].
pub struct Levels<'a> {
    inner: EitherIter<'a>,
}

impl Iterator for Levels<'_> {
    type Item = Level;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(&price, queue)| Level {
            price,
            quantity: queue.iter().map(|o| o.quantity).sum(),
        })
    }
}

impl DualBook {
    /// Creates a new, empty [`DualBook`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn side(&self, side: Side) -> &BTreeMap<Price, VecDeque<Order>> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Price, VecDeque<Order>> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Adds a limit order to the index and to the tail of its price level.
    ///
    /// A live identifier is rejected with [`BookError::DuplicateOrder`] and
    /// neither structure is touched.
    pub fn insert(&mut self, order: Order) -> BookResult<()> {
        if order.quantity == 0 {
            return Err(BookError::ZeroQuantity(order.id));
        }
        match self.orders.entry(order.id.clone()) {
            Entry::Occupied(_) => return Err(BookError::DuplicateOrder(order.id)),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
            }
        }
        debug!(id = %order.id, side = ?order.side, price = order.price, quantity = order.quantity, "order inserted");
        self.side_mut(order.side)
            .entry(order.price)
            .or_default()
            .push_back(order);
        Ok(())
    }

    /// Looks an order up by identifier.
    pub fn locate(&self, id: &str) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Finds the position of `id` inside the queue at `price` on `side`.
    ///
    /// Only the orders at that one price level are scanned.
    pub fn locate_in_side(&self, side: Side, price: Price, id: &str) -> Option<usize> {
        self.side(side)
            .get(&price)?
            .iter()
            .position(|o| o.id == id)
    }

    /// Deletes an order from both structures and returns it.
    ///
    /// Empty price levels are pruned.
    pub fn remove(&mut self, id: &str) -> BookResult<Order> {
        let (side, price) = match self.orders.get(id) {
            Some(order) => (order.side, order.price),
            None => return Err(BookError::UnknownOrder(id.to_owned())),
        };
        let pos = self
            .locate_in_side(side, price, id)
            .ok_or_else(|| inconsistent(id, side, price))?;

        let book_side = self.side_mut(side);
        if let Some(queue) = book_side.get_mut(&price) {
            queue.remove(pos);
            //prune the price level if needed
            if queue.is_empty() {
                book_side.remove(&price);
            }
        }
        debug!(id, ?side, price, "order removed");
        self.orders
            .remove(id)
            .ok_or_else(|| inconsistent(id, side, price))
    }

    /// Sets the remaining quantity of a live order in both copies at once.
    ///
    /// `new_quantity` must be positive; a zero remainder is a removal.
    pub fn mutate_quantity(&mut self, id: &str, new_quantity: Quantity) -> BookResult<()> {
        if new_quantity == 0 {
            return Err(BookError::ZeroQuantity(id.to_owned()));
        }
        let (side, price) = match self.orders.get(id) {
            Some(order) => (order.side, order.price),
            None => return Err(BookError::UnknownOrder(id.to_owned())),
        };
        let pos = self
            .locate_in_side(side, price, id)
            .ok_or_else(|| inconsistent(id, side, price))?;

        let resting = self
            .side_mut(side)
            .get_mut(&price)
            .and_then(|queue| queue.get_mut(pos))
            .ok_or_else(|| inconsistent(id, side, price))?;
        resting.quantity = new_quantity;
        if let Some(indexed) = self.orders.get_mut(id) {
            indexed.quantity = new_quantity;
        }
        debug!(id, ?side, price, quantity = new_quantity, "order resized");
        Ok(())
    }

    /// Aggregated price levels of `side`, best price first.
    pub fn levels(&self, side: Side) -> Levels<'_> {
        let inner = match side {
            Side::Buy => EitherIter::Rev(self.bids.iter().rev()),
            Side::Sell => EitherIter::Fwd(self.asks.iter()),
        };
        Levels { inner }
    }

    /// Best level of `side`, if any.
    pub fn best(&self, side: Side) -> Option<Level> {
        self.levels(side).next()
    }

    /// Up to `depth` aggregated levels of `side`, best first.
    pub fn depth(&self, side: Side, depth: usize) -> Vec<Level> {
        self.levels(side).take(depth).collect()
    }

    /// Verifies that the index and both sides hold the same live orders
    /// with the same quantities.
    pub fn check_invariants(&self) -> BookResult<()> {
        let mut resting = 0;
        for side in [Side::Buy, Side::Sell] {
            for (&price, queue) in self.side(side) {
                if queue.is_empty() {
                    return Err(inconsistent("", side, price));
                }
                for order in queue {
                    resting += 1;
                    match self.orders.get(&order.id) {
                        Some(indexed) if indexed == order && order.quantity > 0 => {}
                        _ => return Err(inconsistent(&order.id, side, price)),
                    }
                }
            }
        }
        if resting != self.orders.len() {
            // something indexed is missing from its side
            let missing = self
                .orders
                .values()
                .find(|o| self.locate_in_side(o.side, o.price, &o.id).is_none());
            return Err(match missing {
                Some(o) => inconsistent(&o.id, o.side, o.price),
                None => inconsistent("", Side::Buy, 0),
            });
        }
        Ok(())
    }
}

fn inconsistent(id: &str, side: Side, price: Price) -> BookError {
    BookError::InconsistentState {
        id: id.to_owned(),
        side,
        price,
    }
}
