//! Microstructure analytics computed from book snapshots and trade flow.
//!
//! The engine is fed prices and trades continuously but only recomputes its
//! published metrics on a configurable cadence (every tick, or every N
//! trades) to bound cost.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use types::{BookSnapshot, OrderSide, Price, Quantity, Tick};

use crate::rolling::RollingWindow;
use crate::stats;

// =============================================================================
// Configuration
// =============================================================================

/// When the engine recomputes its published metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalyticsCadence {
    /// Recompute at every tick boundary.
    EveryTick,
    /// Recompute once at least this many trades have printed since the last
    /// recompute.
    EveryNTrades(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Price observations kept for realized volatility.
    pub volatility_window: usize,
    /// Per-trade effective spreads kept for averaging.
    pub effective_spread_window: usize,
    /// Book levels per side considered for imbalance.
    pub imbalance_depth: usize,
    /// Trades kept for the windowed VWAP.
    pub vwap_window: usize,
    pub cadence: AnalyticsCadence,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            volatility_window: 50,
            effective_spread_window: 50,
            imbalance_depth: 5,
            vwap_window: 100,
            cadence: AnalyticsCadence::EveryTick,
        }
    }
}

impl AnalyticsConfig {
    pub fn with_volatility_window(mut self, window: usize) -> Self {
        self.volatility_window = window;
        self
    }

    pub fn with_imbalance_depth(mut self, depth: usize) -> Self {
        self.imbalance_depth = depth;
        self
    }

    pub fn with_vwap_window(mut self, window: usize) -> Self {
        self.vwap_window = window;
        self
    }

    pub fn with_cadence(mut self, cadence: AnalyticsCadence) -> Self {
        self.cadence = cadence;
        self
    }
}

// =============================================================================
// Published metrics
// =============================================================================

/// Snapshot of the metrics as of the last recompute.
///
/// Metrics are `None` until enough history has accumulated (or, for the
/// spread/imbalance, when the relevant book side is empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalytics {
    /// `best_ask - best_bid` from the snapshot at recompute time.
    pub quoted_spread: Option<Price>,
    /// Mean of `2 * sign(side) * (trade_price - mid)` over recent trades,
    /// in price units. Positive means takers paid to cross.
    pub effective_spread: Option<f64>,
    /// Rolling standard deviation of log price returns.
    pub realized_volatility: Option<f64>,
    /// `bid_qty / (bid_qty + ask_qty)` over the top N levels, in `[0, 1]`.
    pub imbalance: Option<f64>,
    /// Volume-weighted average price over the trade window.
    pub vwap: Option<Price>,
    /// Tick of the last recompute.
    pub tick: Tick,
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    prices: RollingWindow,
    effective_spreads: RollingWindow,
    /// (raw price, quantity) per trade, oldest first.
    vwap_trades: VecDeque<(i64, u64)>,
    vwap_notional: i128,
    vwap_volume: u128,
    trades_since_recompute: u64,
    latest: MarketAnalytics,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        let prices = RollingWindow::new(config.volatility_window.max(2));
        let effective_spreads = RollingWindow::new(config.effective_spread_window.max(1));
        Self {
            config,
            prices,
            effective_spreads,
            vwap_trades: VecDeque::new(),
            vwap_notional: 0,
            vwap_volume: 0,
            trades_since_recompute: 0,
            latest: MarketAnalytics::default(),
        }
    }

    /// Record one reference-price observation (once per tick).
    pub fn record_price(&mut self, price: Price) {
        self.prices.push(price.to_float());
    }

    /// Record one executed trade. `mid` is the mid price at execution time,
    /// when both sides of the book were quoted.
    pub fn record_trade(
        &mut self,
        price: Price,
        quantity: Quantity,
        taker_side: OrderSide,
        mid: Option<Price>,
    ) {
        if let Some(mid) = mid {
            let signed = 2.0 * taker_side.sign() as f64 * (price - mid).to_float();
            self.effective_spreads.push(signed);
        }

        self.vwap_trades.push_back((price.raw(), quantity.raw()));
        self.vwap_notional += price.raw() as i128 * quantity.raw() as i128;
        self.vwap_volume += quantity.raw() as u128;
        while self.vwap_trades.len() > self.config.vwap_window {
            if let Some((p, q)) = self.vwap_trades.pop_front() {
                self.vwap_notional -= p as i128 * q as i128;
                self.vwap_volume -= q as u128;
            }
        }

        self.trades_since_recompute += 1;
    }

    /// Tick-boundary hook: recomputes and republishes metrics if the cadence
    /// is due. Returns whether a recompute happened.
    pub fn observe(&mut self, tick: Tick, snapshot: &BookSnapshot) -> bool {
        let due = match self.config.cadence {
            AnalyticsCadence::EveryTick => true,
            AnalyticsCadence::EveryNTrades(n) => self.trades_since_recompute >= n,
        };
        if !due {
            return false;
        }

        self.latest = MarketAnalytics {
            quoted_spread: snapshot.spread(),
            effective_spread: self.effective_spreads.mean(),
            realized_volatility: self.realized_volatility(),
            imbalance: self.imbalance(snapshot),
            vwap: self.vwap(),
            tick,
        };
        self.trades_since_recompute = 0;
        true
    }

    /// Metrics as of the last recompute.
    pub fn latest(&self) -> &MarketAnalytics {
        &self.latest
    }

    /// Rolling standard deviation of log returns over the price window.
    pub fn realized_volatility(&self) -> Option<f64> {
        let prices: Vec<f64> = self.prices.iter().collect();
        let rets = stats::log_returns(&prices);
        stats::std_dev(&rets)
    }

    /// VWAP over the current trade window.
    pub fn vwap(&self) -> Option<Price> {
        if self.vwap_volume == 0 {
            return None;
        }
        Some(Price((self.vwap_notional / self.vwap_volume as i128) as i64))
    }

    /// Resting-quantity imbalance over the configured top-of-book depth.
    pub fn imbalance(&self, snapshot: &BookSnapshot) -> Option<f64> {
        let depth = self.config.imbalance_depth;
        let bid_qty: u64 = snapshot
            .bids
            .iter()
            .take(depth)
            .map(|l| l.quantity.raw())
            .sum();
        let ask_qty: u64 = snapshot
            .asks
            .iter()
            .take(depth)
            .map(|l| l.quantity.raw())
            .sum();
        let total = bid_qty + ask_qty;
        if total == 0 {
            return None;
        }
        Some(bid_qty as f64 / total as f64)
    }
}
