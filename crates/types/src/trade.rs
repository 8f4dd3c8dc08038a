//! Trade and fill records.
//!
//! A single match between two orders produces one [`Trade`] (the pairing of
//! both sides, used for agent notification and the fill ledger) and two
//! [`Fill`]s (one per order, tagged maker or taker). Both are immutable once
//! created.

use crate::ids::{AgentId, FillId, OrderId, Symbol, Tick, Timestamp, TradeId};
use crate::money::{Cash, Price, Quantity};
use crate::order::OrderSide;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Trade
// =============================================================================

/// A completed match between a buy order and a sell order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique trade identifier.
    pub id: TradeId,
    /// Symbol traded.
    pub symbol: Symbol,
    /// Agent on the buy side.
    pub buyer_id: AgentId,
    /// Agent on the sell side.
    pub seller_id: AgentId,
    /// Buy-side order.
    pub buyer_order_id: OrderId,
    /// Sell-side order.
    pub seller_order_id: OrderId,
    /// Execution price (the resting order's price level).
    pub price: Price,
    /// Quantity exchanged.
    pub quantity: Quantity,
    /// Wall clock time of execution.
    pub timestamp: Timestamp,
    /// Simulation tick of execution.
    pub tick: Tick,
}

impl Trade {
    /// Notional value of the trade.
    pub fn value(&self) -> Cash {
        self.price * self.quantity
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} shares @ {} (buyer: {}, seller: {})",
            self.id, self.symbol, self.quantity, self.price, self.buyer_id, self.seller_id
        )
    }
}

// =============================================================================
// Fill
// =============================================================================

/// Whether an order provided or consumed resting liquidity in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiquidityRole {
    /// The resting order that provided liquidity.
    Maker,
    /// The incoming order that consumed liquidity.
    Taker,
}

impl fmt::Display for LiquidityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiquidityRole::Maker => write!(f, "MAKER"),
            LiquidityRole::Taker => write!(f, "TAKER"),
        }
    }
}

/// One order's side of a single execution. Appended to the per-symbol fill
/// ledger and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Unique fill identifier.
    pub id: FillId,
    /// The order this fill executed against.
    pub order_id: OrderId,
    /// Owner of that order.
    pub agent_id: AgentId,
    /// Symbol traded.
    pub symbol: Symbol,
    /// Side of the filled order.
    pub side: OrderSide,
    /// Effective execution price recorded for this fill. Taker fills carry
    /// the slippage adjustment; maker fills execute at the book price.
    pub price: Price,
    /// Quoted book price the match crossed at.
    pub book_price: Price,
    /// Quantity executed.
    pub quantity: Quantity,
    /// Maker or taker.
    pub role: LiquidityRole,
    /// Wall clock time, including any modeled latency.
    pub timestamp: Timestamp,
    /// Simulation tick of execution.
    pub tick: Tick,
}

impl Fill {
    /// Signed execution cost per share: positive means the fill was worse
    /// than the quoted book price for this side.
    pub fn slippage(&self) -> Price {
        match self.side {
            OrderSide::Buy => self.price - self.book_price,
            OrderSide::Sell => self.book_price - self.price,
        }
    }

    /// Slippage in basis points of the book price.
    pub fn slippage_bps(&self) -> f64 {
        if self.book_price.raw() == 0 {
            return 0.0;
        }
        self.slippage().raw() as f64 / self.book_price.raw() as f64 * 10_000.0
    }

    /// Notional value at the effective price.
    pub fn value(&self) -> Cash {
        self.price * self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fill(side: OrderSide, price: f64, book: f64) -> Fill {
        Fill {
            id: FillId(1),
            order_id: OrderId(1),
            agent_id: AgentId(1),
            symbol: "TEST".to_string(),
            side,
            price: Price::from_float(price),
            book_price: Price::from_float(book),
            quantity: Quantity(100),
            role: LiquidityRole::Taker,
            timestamp: 0,
            tick: 0,
        }
    }

    #[test]
    fn test_buy_slippage_positive_when_paying_up() {
        let fill = make_fill(OrderSide::Buy, 100.10, 100.00);
        assert_eq!(fill.slippage(), Price::from_float(0.10));
        assert!((fill.slippage_bps() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_sell_slippage_positive_when_selling_down() {
        let fill = make_fill(OrderSide::Sell, 99.90, 100.00);
        assert_eq!(fill.slippage(), Price::from_float(0.10));
    }

    #[test]
    fn test_maker_fill_has_no_slippage() {
        let fill = make_fill(OrderSide::Buy, 100.0, 100.0);
        assert_eq!(fill.slippage(), Price::ZERO);
        assert_eq!(fill.slippage_bps(), 0.0);
    }

    #[test]
    fn test_trade_value() {
        let trade = Trade {
            id: TradeId(1),
            symbol: "TEST".to_string(),
            buyer_id: AgentId(1),
            seller_id: AgentId(2),
            buyer_order_id: OrderId(1),
            seller_order_id: OrderId(2),
            price: Price::from_float(100.5),
            quantity: Quantity(100),
            timestamp: 0,
            tick: 0,
        };
        assert_eq!(trade.value(), Cash::from_float(10_050.0));
    }
}
