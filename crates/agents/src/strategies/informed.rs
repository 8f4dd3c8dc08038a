//! Informed trader: trades on a noisy preview of the next price move.
//!
//! The context exposes the deterministic drift of the next price-discovery
//! step; the trader observes it through private noise and sends a market
//! order in the expected direction when the signal clears its threshold.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use types::{AgentId, Cash, Order, OrderSide, Quantity};

use crate::state::AgentState;
use crate::traits::{Agent, AgentAction, AgentError};
use crate::StrategyContext;

/// Configuration for an [`InformedTrader`].
#[derive(Debug, Clone)]
pub struct InformedTraderConfig {
    /// Symbol to trade.
    pub symbol: String,
    /// Minimum absolute signal (price units) before acting.
    pub signal_threshold: f64,
    /// Standard deviation of the private observation noise, price units.
    pub signal_noise: f64,
    /// Market-order size per signal.
    pub order_size: u64,
    /// Absolute position cap, in shares.
    pub max_position: i64,
    /// Starting cash balance.
    pub initial_cash: Cash,
}

impl Default for InformedTraderConfig {
    fn default() -> Self {
        Self {
            symbol: "TEST".to_string(),
            signal_threshold: 0.05,
            signal_noise: 0.02,
            order_size: 50,
            max_position: 500,
            initial_cash: Cash::from_float(250_000.0),
        }
    }
}

/// Trader with a noisy look at the next price-discovery drift.
pub struct InformedTrader {
    id: AgentId,
    config: InformedTraderConfig,
    state: AgentState,
    rng: StdRng,
}

impl InformedTrader {
    pub fn new(id: AgentId, config: InformedTraderConfig, seed: u64) -> Self {
        let initial_cash = config.initial_cash;
        Self {
            id,
            config,
            state: AgentState::new(initial_cash),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The drift as this trader observes it.
    fn observe_signal(&mut self, drift: f64) -> f64 {
        let noise: f64 = self.rng.sample(StandardNormal);
        drift + self.config.signal_noise * noise
    }
}

impl Agent for InformedTrader {
    fn id(&self) -> AgentId {
        self.id
    }

    fn on_tick(&mut self, ctx: &StrategyContext<'_>) -> Result<AgentAction, AgentError> {
        let signal = self.observe_signal(ctx.drift_hint);

        let side = if signal > self.config.signal_threshold {
            OrderSide::Buy
        } else if signal < -self.config.signal_threshold {
            OrderSide::Sell
        } else {
            return Ok(AgentAction::none());
        };

        // Position cap: never build beyond max_position in either direction.
        let position = self.state.position();
        let capped = match side {
            OrderSide::Buy => position + self.config.order_size as i64 > self.config.max_position,
            OrderSide::Sell => position - (self.config.order_size as i64) < -self.config.max_position,
        };
        if capped {
            return Ok(AgentAction::none());
        }

        let order = Order::market(
            self.id,
            &self.config.symbol,
            side,
            Quantity(self.config.order_size),
        )
        .map_err(|e| AgentError::new(self.id, e.to_string()))?;

        self.state.record_order();
        Ok(AgentAction::single(order))
    }

    fn name(&self) -> &str {
        "InformedTrader"
    }

    fn state(&self) -> &AgentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{BookSnapshot, MarketState, Price};

    fn noiseless(threshold: f64) -> InformedTraderConfig {
        InformedTraderConfig {
            signal_threshold: threshold,
            signal_noise: 0.0,
            ..Default::default()
        }
    }

    fn act(trader: &mut InformedTrader, drift: f64) -> AgentAction {
        let snapshot = BookSnapshot::default();
        let market = MarketState::initial("TEST", Price::from_float(100.0), 10_000.0);
        let ctx = StrategyContext::new(1, 0, &snapshot, &market, &[], drift);
        trader.on_tick(&ctx).unwrap()
    }

    #[test]
    fn test_trades_with_the_expected_move() {
        let mut trader = InformedTrader::new(AgentId(1), noiseless(0.05), 42);

        let action = act(&mut trader, 0.2);
        assert_eq!(action.orders.len(), 1);
        assert_eq!(action.orders[0].side, OrderSide::Buy);

        let action = act(&mut trader, -0.2);
        assert_eq!(action.orders[0].side, OrderSide::Sell);
    }

    #[test]
    fn test_weak_signal_ignored() {
        let mut trader = InformedTrader::new(AgentId(1), noiseless(0.05), 42);
        assert!(act(&mut trader, 0.01).is_empty());
        assert!(act(&mut trader, -0.04).is_empty());
    }

    #[test]
    fn test_position_cap_blocks_buys() {
        let config = InformedTraderConfig {
            max_position: 100,
            order_size: 60,
            ..noiseless(0.05)
        };
        let mut trader = InformedTrader::new(AgentId(1), config, 42);

        trader.state.on_buy(60, Cash::from_float(6_000.0));
        // 60 held + 60 more would exceed the 100-share cap.
        assert!(act(&mut trader, 0.5).is_empty());
        // The sell side is still open.
        assert_eq!(act(&mut trader, -0.5).orders[0].side, OrderSide::Sell);
    }
}
