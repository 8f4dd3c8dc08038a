//! Published market data: order book snapshots and per-symbol market state.
//!
//! These are the immutable views readers consume. They are rebuilt at the
//! end of each completed tick; nothing here aliases live book structures.

use crate::ids::{Symbol, Tick, Timestamp};
use crate::money::{Price, Quantity};
use serde::{Deserialize, Serialize};

// =============================================================================
// Order Book Snapshot
// =============================================================================

/// A single price level in the order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Price at this level.
    pub price: Price,
    /// Total quantity resting at this price.
    pub quantity: Quantity,
    /// Number of orders at this level.
    pub order_count: usize,
}

/// Depth-limited snapshot of the order book at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BookSnapshot {
    /// Symbol this book is for.
    pub symbol: Symbol,
    /// Bid levels (highest first).
    pub bids: Vec<BookLevel>,
    /// Ask levels (lowest first).
    pub asks: Vec<BookLevel>,
    /// When the snapshot was taken.
    pub timestamp: Timestamp,
    /// Simulation tick.
    pub tick: Tick,
}

impl BookSnapshot {
    /// Get the best bid price.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    /// Get the best ask price.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    /// Spread between best bid and ask.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Mid price.
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(Price((bid.0 + ask.0) / 2)),
            _ => None,
        }
    }

    /// Total resting bid quantity across the snapshot's levels.
    pub fn bid_depth(&self) -> Quantity {
        self.bids.iter().map(|l| l.quantity).sum()
    }

    /// Total resting ask quantity across the snapshot's levels.
    pub fn ask_depth(&self) -> Quantity {
        self.asks.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Market State
// =============================================================================

/// Per-symbol state derived from price discovery and the liquidity model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    /// Symbol this state describes.
    pub symbol: Symbol,
    /// Reference price after the latest price-discovery update.
    pub last_price: Price,
    /// Realized volatility estimate (std dev of recent log returns).
    pub volatility: f64,
    /// Momentum estimate (recent price trend per tick, in price units).
    pub momentum: f64,
    /// Current liquidity level in the impact model.
    pub liquidity: f64,
    /// When this state was produced.
    pub timestamp: Timestamp,
    /// Simulation tick.
    pub tick: Tick,
}

impl MarketState {
    /// Initial state for a freshly registered symbol.
    pub fn initial(symbol: impl Into<Symbol>, price: Price, liquidity: f64) -> Self {
        Self {
            symbol: symbol.into(),
            last_price: price,
            volatility: 0.0,
            momentum: 0.0,
            liquidity,
            timestamp: 0,
            tick: 0,
        }
    }
}
