use thiserror::Error;

use crate::orders::{OrderId, Price, Side};

/// Errors raised by the book and the monitor.
///
/// Every variant except [`BookError::InconsistentState`] is reported before
/// any mutation happens, so the book is untouched when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("unknown order `{0}`")]
    UnknownOrder(OrderId),

    #[error("order `{0}` is already live in the book")]
    DuplicateOrder(OrderId),

    #[error("order `{0}` has zero quantity")]
    ZeroQuantity(OrderId),

    #[error("target quantity must be greater than zero")]
    ZeroTarget,

    #[error("order `{id}` is indexed but missing from the {side:?} level at {price}")]
    InconsistentState {
        id: OrderId,
        side: Side,
        price: Price,
    },
}

impl BookError {
    /// Errors that mean the book can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BookError::InconsistentState { .. })
    }
}

/// Errors from decoding an event line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("unknown action `{0}`, expected `A` or `R`")]
    UnknownAction(String),

    #[error("unknown side `{0}`, expected `B` or `S`")]
    UnknownSide(String),

    #[error("invalid {field}: `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid price `{0}`")]
    InvalidPrice(String),

    #[error("size must be greater than zero")]
    ZeroSize,

    #[error("unexpected trailing input `{0}`")]
    TrailingInput(String),
}

pub type BookResult<T> = Result<T, BookError>;
