//! Per-tick read-only context handed to agents.

use types::{BookSnapshot, MarketState, Price, Tick, Timestamp, Trade};

/// Everything an agent may look at when deciding its action for a tick.
///
/// Borrows the snapshot published at the end of the previous tick; agents
/// must extract what they need during `on_tick` and cannot hold on to the
/// context.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    /// Current simulation tick.
    pub tick: Tick,
    /// Current simulation timestamp.
    pub timestamp: Timestamp,
    /// Last published book snapshot.
    pub snapshot: &'a BookSnapshot,
    /// Last published market state.
    pub market: &'a MarketState,
    /// Recent trades, oldest first.
    pub recent_trades: &'a [Trade],
    /// Deterministic component of the next price-discovery move, in price
    /// units. Informed traders build their signal from this.
    pub drift_hint: f64,
}

impl<'a> StrategyContext<'a> {
    pub fn new(
        tick: Tick,
        timestamp: Timestamp,
        snapshot: &'a BookSnapshot,
        market: &'a MarketState,
        recent_trades: &'a [Trade],
        drift_hint: f64,
    ) -> Self {
        Self {
            tick,
            timestamp,
            snapshot,
            market,
            recent_trades,
            drift_hint,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.market.symbol
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.snapshot.best_bid()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.snapshot.best_ask()
    }

    /// Book mid, falling back to the reference price when a side is empty.
    pub fn mid_price(&self) -> Price {
        self.snapshot.mid_price().unwrap_or(self.market.last_price)
    }

    /// Reference price from the latest price-discovery update.
    pub fn last_price(&self) -> Price {
        self.market.last_price
    }

    /// Momentum estimate, in price units per tick.
    pub fn momentum(&self) -> f64 {
        self.market.momentum
    }
}
