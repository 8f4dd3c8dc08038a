//! Error taxonomy for the simulation core.
//!
//! Validation and not-found cases are ordinary negative results returned to
//! the caller. An [`SimError::InvariantViolation`] signals an internal
//! consistency failure and is fatal for the affected symbol's lane.

use std::fmt;
use types::{InvalidOrder, OrderId, Symbol};

/// Result type for simulation core operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors produced by the matching core and execution engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// The requested symbol is not registered.
    UnknownSymbol(Symbol),
    /// A symbol was registered twice.
    DuplicateSymbol(Symbol),
    /// The referenced order is not known or no longer active.
    OrderNotFound(OrderId),
    /// The order failed shape validation.
    InvalidOrder(InvalidOrder),
    /// A priced order type arrived without a usable price.
    MissingLimitPrice(OrderId),
    /// An internal consistency check failed. Fatal for the symbol's lane.
    InvariantViolation { symbol: Symbol, detail: String },
    /// The symbol's lane was halted by an earlier invariant violation.
    LaneHalted(Symbol),
    /// The simulation has stopped and accepts no further operations.
    Shutdown,
}

impl SimError {
    /// Whether this error halts the symbol's simulation lane.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::InvariantViolation { .. })
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::UnknownSymbol(s) => write!(f, "unknown symbol: {}", s),
            SimError::DuplicateSymbol(s) => write!(f, "symbol already registered: {}", s),
            SimError::OrderNotFound(id) => write!(f, "order not found: {}", id),
            SimError::InvalidOrder(e) => write!(f, "invalid order: {}", e),
            SimError::MissingLimitPrice(id) => {
                write!(f, "{} requires a limit price but has none", id)
            }
            SimError::InvariantViolation { symbol, detail } => {
                write!(f, "invariant violation on {}: {}", symbol, detail)
            }
            SimError::LaneHalted(s) => write!(f, "lane for {} is halted", s),
            SimError::Shutdown => write!(f, "simulation is shut down"),
        }
    }
}

impl std::error::Error for SimError {}

impl From<InvalidOrder> for SimError {
    fn from(e: InvalidOrder) -> Self {
        SimError::InvalidOrder(e)
    }
}
