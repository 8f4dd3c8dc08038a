//! Common agent accounting state.
//!
//! Tracks position, cash, and realized P&L with a weighted-average cost
//! basis:
//! - On buy: `new_avg_cost = (old_qty * old_avg + buy_qty * buy_price) / (old_qty + buy_qty)`
//! - On sell: `realized_pnl += (sell_price - avg_cost) * closed_qty`

use types::{Cash, Price};

/// Position, cash, and trading metrics shared by all agent implementations.
#[derive(Debug, Clone, Default)]
pub struct AgentState {
    /// Current position in shares (positive = long, negative = short).
    position: i64,
    /// Current cash balance.
    cash: Cash,
    /// Weighted average cost basis per share.
    avg_cost: f64,
    /// Accumulated realized P&L from closed positions.
    realized_pnl: Cash,
    /// Total number of orders placed.
    orders_placed: u64,
    /// Total number of fills received.
    fills_received: u64,
}

impl AgentState {
    /// Create a new agent state with initial cash.
    pub fn new(initial_cash: Cash) -> Self {
        Self {
            cash: initial_cash,
            ..Default::default()
        }
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn cash(&self) -> Cash {
        self.cash
    }

    pub fn orders_placed(&self) -> u64 {
        self.orders_placed
    }

    pub fn fills_received(&self) -> u64 {
        self.fills_received
    }

    pub fn realized_pnl(&self) -> Cash {
        self.realized_pnl
    }

    /// Average cost basis per share of the current long position.
    pub fn avg_cost(&self) -> f64 {
        self.avg_cost
    }

    /// Cash plus the position marked at `price`.
    pub fn equity(&self, price: Price) -> Cash {
        self.cash + Cash::from_float(self.position as f64 * price.to_float())
    }

    /// Update state after a buy fill, re-weighting the cost basis.
    pub fn on_buy(&mut self, quantity: u64, value: Cash) {
        let buy_price = value.to_float() / quantity as f64;
        let old_qty = self.position.max(0) as f64;
        let new_qty = old_qty + quantity as f64;

        // Cost basis only tracks the long side.
        if new_qty > 0.0 {
            self.avg_cost = (old_qty * self.avg_cost + quantity as f64 * buy_price) / new_qty;
        }

        self.position += quantity as i64;
        self.cash -= value;
        self.fills_received += 1;
    }

    /// Update state after a sell fill, realizing P&L against the cost basis.
    pub fn on_sell(&mut self, quantity: u64, value: Cash) {
        let sell_price = value.to_float() / quantity as f64;

        if self.position > 0 && self.avg_cost > 0.0 {
            let closed_qty = (quantity as i64).min(self.position) as f64;
            let pnl = (sell_price - self.avg_cost) * closed_qty;
            self.realized_pnl += Cash::from_float(pnl);
        }

        self.position -= quantity as i64;
        self.cash += value;
        self.fills_received += 1;
    }

    /// Increment the orders-placed counter.
    pub fn record_order(&mut self) {
        self.orders_placed += 1;
    }

    /// Increment the orders-placed counter by `count`.
    pub fn record_orders(&mut self, count: u64) {
        self.orders_placed += count;
    }
}
