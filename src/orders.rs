/// Limit price in minimal price increments (cents).
pub type Price = u64;

/// Order size in units of the instrument.
pub type Quantity = u64;

/// Opaque event timestamp, passed through to emitted signals untouched.
pub type Timestamp = u64;

/// Externally assigned order identifier. Unique while the order is live.
pub type OrderId = String;

/// Total cost or proceeds of filling a quantity, in cents.
///
/// Wider than `Price * Quantity` so the aggregate walk never overflows.
pub type Notional = u128;

/// Represents which side of the market the order is on.
///
/// # Intuition
/// - `Buy` (Bid): resting buy interest. Walked from **highest to lowest price**,
///   which is the order a seller would consume it in.
/// - `Sell` (Ask): resting sell interest. Walked from **lowest to highest price**,
///   which is the order a buyer would consume it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,  // Bid
    Sell, // Ask
}

/// A resting limit order.
///
/// Only `quantity` ever changes after creation; side and price are fixed for
/// the life of the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

impl Order {
    pub fn new(id: impl Into<OrderId>, side: Side, price: Price, quantity: Quantity) -> Self {
        Self {
            id: id.into(),
            side,
            price,
            quantity,
        }
    }

    pub fn buy(id: impl Into<OrderId>, price: Price, quantity: Quantity) -> Self {
        Self::new(id, Side::Buy, price, quantity)
    }

    pub fn sell(id: impl Into<OrderId>, price: Price, quantity: Quantity) -> Self {
        Self::new(id, Side::Sell, price, quantity)
    }
}
