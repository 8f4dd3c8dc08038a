//! Momentum trader: extrapolates the recent realized trend.
//!
//! Reads the per-tick trend estimate from MarketState and trades with it
//! once it clears a threshold, on the view that moves persist. The mirror
//! image of the mean-reversion pull inside price discovery.

use types::{AgentId, Cash, Order, OrderSide, Quantity};

use crate::state::AgentState;
use crate::traits::{Agent, AgentAction, AgentError};
use crate::StrategyContext;

/// Configuration for a [`MomentumTrader`].
#[derive(Debug, Clone)]
pub struct MomentumTraderConfig {
    /// Symbol to trade.
    pub symbol: String,
    /// Minimum absolute trend (price units per tick) before acting.
    pub trend_threshold: f64,
    /// Market-order size per signal.
    pub order_size: u64,
    /// Absolute position cap, in shares.
    pub max_position: i64,
    /// Starting cash balance.
    pub initial_cash: Cash,
}

impl Default for MomentumTraderConfig {
    fn default() -> Self {
        Self {
            symbol: "TEST".to_string(),
            trend_threshold: 0.02,
            order_size: 50,
            max_position: 500,
            initial_cash: Cash::from_float(250_000.0),
        }
    }
}

/// Trend-following agent.
pub struct MomentumTrader {
    id: AgentId,
    config: MomentumTraderConfig,
    state: AgentState,
}

impl MomentumTrader {
    pub fn new(id: AgentId, config: MomentumTraderConfig) -> Self {
        let initial_cash = config.initial_cash;
        Self {
            id,
            config,
            state: AgentState::new(initial_cash),
        }
    }

    pub fn with_defaults(id: AgentId) -> Self {
        Self::new(id, MomentumTraderConfig::default())
    }
}

impl Agent for MomentumTrader {
    fn id(&self) -> AgentId {
        self.id
    }

    fn on_tick(&mut self, ctx: &StrategyContext<'_>) -> Result<AgentAction, AgentError> {
        let trend = ctx.momentum();

        let side = if trend > self.config.trend_threshold {
            OrderSide::Buy
        } else if trend < -self.config.trend_threshold {
            OrderSide::Sell
        } else {
            return Ok(AgentAction::none());
        };

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
        "MomentumTrader"
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

    fn act(trader: &mut MomentumTrader, momentum: f64) -> AgentAction {
        let snapshot = BookSnapshot::default();
        let mut market = MarketState::initial("TEST", Price::from_float(100.0), 10_000.0);
        market.momentum = momentum;
        let ctx = StrategyContext::new(1, 0, &snapshot, &market, &[], 0.0);
        trader.on_tick(&ctx).unwrap()
    }

    #[test]
    fn test_follows_the_trend() {
        let mut trader = MomentumTrader::with_defaults(AgentId(1));

        let action = act(&mut trader, 0.1);
        assert_eq!(action.orders.len(), 1);
        assert_eq!(action.orders[0].side, OrderSide::Buy);

        let action = act(&mut trader, -0.1);
        assert_eq!(action.orders[0].side, OrderSide::Sell);
    }

    #[test]
    fn test_flat_market_no_trade() {
        let mut trader = MomentumTrader::with_defaults(AgentId(1));
        assert!(act(&mut trader, 0.0).is_empty());
        assert!(act(&mut trader, 0.01).is_empty());
    }

    #[test]
    fn test_position_cap() {
        let config = MomentumTraderConfig {
            max_position: 50,
            order_size: 50,
            ..Default::default()
        };
        let mut trader = MomentumTrader::new(AgentId(1), config);

        trader.state.on_buy(50, Cash::from_float(5_000.0));
        assert!(act(&mut trader, 1.0).is_empty());
        assert_eq!(act(&mut trader, -1.0).orders[0].side, OrderSide::Sell);
    }
}
