//! Order types: sides, order kinds, lifecycle status, and the Order struct.
//!
//! Constructors validate their inputs, so an `Order` value always satisfies
//! the basic shape constraints (non-zero quantity, positive prices where a
//! price is required). Fill accumulation keeps `filled_quantity <= quantity`
//! and maintains the volume-weighted average fill price.

use crate::ids::{AgentId, OrderId, Symbol, Timestamp};
use crate::money::{Cash, Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Order Side
// =============================================================================

/// Which side of the market the order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// Direction sign: +1 for buys, -1 for sells.
    pub fn sign(self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

// =============================================================================
// Order Type
// =============================================================================

/// Type of order determining execution rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute immediately at best available price.
    Market,
    /// Execute at the specified price or better.
    Limit { price: Price },
    /// Rest untriggered; becomes a market order once the reference price
    /// crosses `trigger`.
    Stop { trigger: Price },
    /// Rest untriggered; becomes a limit order at `price` once the reference
    /// price crosses `trigger`.
    StopLimit { trigger: Price, price: Price },
}

impl OrderType {
    /// Whether this type starts out waiting on a stop trigger.
    pub fn is_stop(&self) -> bool {
        matches!(self, OrderType::Stop { .. } | OrderType::StopLimit { .. })
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit { price } => write!(f, "LIMIT@{}", price),
            OrderType::Stop { trigger } => write!(f, "STOP@{}", trigger),
            OrderType::StopLimit { trigger, price } => {
                write!(f, "STOP@{}/LIMIT@{}", trigger, price)
            }
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle status of an order.
///
/// Transitions: `Pending -> {Open, Rejected}`,
/// `Open -> {PartiallyFilled, Filled, Cancelled}`,
/// `PartiallyFilled -> {PartiallyFilled, Filled, Cancelled}`.
/// `Filled`, `Cancelled`, and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Created, not yet validated by the execution engine.
    #[default]
    Pending,
    /// Validated and live (resting in the book or awaiting a stop trigger).
    Open,
    /// Some quantity executed, remainder still live.
    PartiallyFilled,
    /// Entire quantity executed.
    Filled,
    /// Explicitly cancelled before completion.
    Cancelled,
    /// Failed validation or unfillable under the configured policy.
    Rejected,
}

impl OrderStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Why an order could not be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidOrder {
    /// Quantity must be strictly positive.
    ZeroQuantity,
    /// Limit/trigger prices must be strictly positive.
    NonPositivePrice(Price),
}

impl fmt::Display for InvalidOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidOrder::ZeroQuantity => write!(f, "order quantity must be positive"),
            InvalidOrder::NonPositivePrice(p) => {
                write!(f, "order price must be positive, got {}", p)
            }
        }
    }
}

impl std::error::Error for InvalidOrder {}

fn require_positive(price: Price) -> Result<Price, InvalidOrder> {
    if price.is_positive() {
        Ok(price)
    } else {
        Err(InvalidOrder::NonPositivePrice(price))
    }
}

// =============================================================================
// Order Struct
// =============================================================================

/// A trading order submitted by an agent or an external caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier (assigned by the engine; 0 until submission).
    pub id: OrderId,
    /// Owning participant.
    pub agent_id: AgentId,
    /// Symbol being traded.
    pub symbol: Symbol,
    /// Buy or Sell.
    pub side: OrderSide,
    /// Execution rules for this order.
    pub order_type: OrderType,
    /// Total requested quantity.
    pub quantity: Quantity,
    /// Cumulative executed quantity. Always `<= quantity`.
    pub filled_quantity: Quantity,
    /// Cumulative notional of executed quantity, for the volume-weighted
    /// average fill price.
    pub filled_notional: Cash,
    /// Submission timestamp (wall clock, assigned by the engine).
    pub timestamp: Timestamp,
    /// Current lifecycle status.
    pub status: OrderStatus,
}

impl Order {
    fn new(
        agent_id: AgentId,
        symbol: impl Into<Symbol>,
        side: OrderSide,
        order_type: OrderType,
        quantity: Quantity,
    ) -> Result<Self, InvalidOrder> {
        if quantity.is_zero() {
            return Err(InvalidOrder::ZeroQuantity);
        }
        Ok(Self {
            id: OrderId(0),
            agent_id,
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            filled_quantity: Quantity::ZERO,
            filled_notional: Cash::ZERO,
            timestamp: 0,
            status: OrderStatus::Pending,
        })
    }

    /// Create a limit order. Fails on zero quantity or non-positive price.
    pub fn limit(
        agent_id: AgentId,
        symbol: impl Into<Symbol>,
        side: OrderSide,
        price: Price,
        quantity: Quantity,
    ) -> Result<Self, InvalidOrder> {
        let price = require_positive(price)?;
        Self::new(agent_id, symbol, side, OrderType::Limit { price }, quantity)
    }

    /// Create a market order. Fails on zero quantity.
    pub fn market(
        agent_id: AgentId,
        symbol: impl Into<Symbol>,
        side: OrderSide,
        quantity: Quantity,
    ) -> Result<Self, InvalidOrder> {
        Self::new(agent_id, symbol, side, OrderType::Market, quantity)
    }

    /// Create a stop (stop-market) order.
    pub fn stop(
        agent_id: AgentId,
        symbol: impl Into<Symbol>,
        side: OrderSide,
        trigger: Price,
        quantity: Quantity,
    ) -> Result<Self, InvalidOrder> {
        let trigger = require_positive(trigger)?;
        Self::new(agent_id, symbol, side, OrderType::Stop { trigger }, quantity)
    }

    /// Create a stop-limit order.
    pub fn stop_limit(
        agent_id: AgentId,
        symbol: impl Into<Symbol>,
        side: OrderSide,
        trigger: Price,
        price: Price,
        quantity: Quantity,
    ) -> Result<Self, InvalidOrder> {
        let trigger = require_positive(trigger)?;
        let price = require_positive(price)?;
        Self::new(
            agent_id,
            symbol,
            side,
            OrderType::StopLimit { trigger, price },
            quantity,
        )
    }

    /// Get the limit price if this order has one.
    pub fn limit_price(&self) -> Option<Price> {
        match self.order_type {
            OrderType::Limit { price } | OrderType::StopLimit { price, .. } => Some(price),
            OrderType::Market | OrderType::Stop { .. } => None,
        }
    }

    /// Get the stop trigger price if this order has one.
    pub fn trigger_price(&self) -> Option<Price> {
        match self.order_type {
            OrderType::Stop { trigger } | OrderType::StopLimit { trigger, .. } => Some(trigger),
            OrderType::Market | OrderType::Limit { .. } => None,
        }
    }

    /// Quantity not yet executed.
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity.saturating_sub(self.filled_quantity)
    }

    /// Volume-weighted average fill price. `None` until the first fill.
    pub fn avg_fill_price(&self) -> Option<Price> {
        if self.filled_quantity.is_zero() {
            None
        } else {
            Some(Price(self.filled_notional.raw() / self.filled_quantity.raw() as i64))
        }
    }

    /// Record an execution against this order, updating fill accumulation
    /// and status. Quantity in excess of the remainder is ignored.
    pub fn record_fill(&mut self, price: Price, quantity: Quantity) {
        let executed = quantity.min(self.remaining_quantity());
        if executed.is_zero() {
            return;
        }
        self.filled_quantity += executed;
        self.filled_notional += price * executed;
        self.status = if self.filled_quantity == self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }

    /// Check if the order is fully filled.
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Check if the order can still execute or be cancelled.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Check if this is a buy order.
    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }

    /// Check if this is a sell order.
    pub fn is_sell(&self) -> bool {
        self.side == OrderSide::Sell
    }
}
