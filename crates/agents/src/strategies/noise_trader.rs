//! Noise trader: uninformed random order flow.
//!
//! Each tick, with a configured probability, places one limit order on a
//! random side at a random price near the reference, with a random size.
//! Seeded per agent so runs reproduce exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use types::{AgentId, Cash, Order, OrderSide, Price, Quantity};

use crate::state::AgentState;
use crate::traits::{Agent, AgentAction, AgentError};
use crate::StrategyContext;

/// Configuration for a [`NoiseTrader`].
#[derive(Debug, Clone)]
pub struct NoiseTraderConfig {
    /// Symbol to trade.
    pub symbol: String,
    /// Probability of placing an order each tick, in `[0, 1]`.
    pub order_probability: f64,
    /// Maximum price deviation from the reference, as a fraction.
    pub price_deviation: f64,
    /// Minimum order size.
    pub min_quantity: u64,
    /// Maximum order size.
    pub max_quantity: u64,
    /// Starting cash balance.
    pub initial_cash: Cash,
}

impl Default for NoiseTraderConfig {
    fn default() -> Self {
        Self {
            symbol: "TEST".to_string(),
            order_probability: 0.3,
            price_deviation: 0.02,
            min_quantity: 10,
            max_quantity: 100,
            initial_cash: Cash::from_float(100_000.0),
        }
    }
}

/// Random trader with no informational edge.
pub struct NoiseTrader {
    id: AgentId,
    config: NoiseTraderConfig,
    state: AgentState,
    rng: StdRng,
}

impl NoiseTrader {
    /// Create a seeded noise trader.
    pub fn new(id: AgentId, config: NoiseTraderConfig, seed: u64) -> Self {
        let initial_cash = config.initial_cash;
        Self {
            id,
            config,
            state: AgentState::new(initial_cash),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn generate_order(&mut self, reference: Price) -> Result<Order, AgentError> {
        let side = if self.rng.random_bool(0.5) {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };

        let deviation = self
            .rng
            .random_range(-self.config.price_deviation..self.config.price_deviation);
        let price = Price::from_float((reference.to_float() * (1.0 + deviation)).max(0.01));

        let quantity = Quantity(
            self.rng
                .random_range(self.config.min_quantity..=self.config.max_quantity),
        );

        Order::limit(self.id, &self.config.symbol, side, price, quantity)
            .map_err(|e| AgentError::new(self.id, e.to_string()))
    }
}

impl Agent for NoiseTrader {
    fn id(&self) -> AgentId {
        self.id
    }

    fn on_tick(&mut self, ctx: &StrategyContext<'_>) -> Result<AgentAction, AgentError> {
        if !self.rng.random_bool(self.config.order_probability) {
            return Ok(AgentAction::none());
        }

        let order = self.generate_order(ctx.mid_price())?;
        self.state.record_order();
        Ok(AgentAction::single(order))
    }

    fn name(&self) -> &str {
        "NoiseTrader"
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
    use types::{BookSnapshot, MarketState};

    fn context_inputs() -> (BookSnapshot, MarketState) {
        (
            BookSnapshot::default(),
            MarketState::initial("TEST", Price::from_float(100.0), 10_000.0),
        )
    }

    fn run_ticks(trader: &mut NoiseTrader, ticks: u64) -> Vec<Order> {
        let (snapshot, market) = context_inputs();
        let mut orders = Vec::new();
        for tick in 0..ticks {
            let ctx = StrategyContext::new(tick, tick, &snapshot, &market, &[], 0.0);
            orders.extend(trader.on_tick(&ctx).unwrap().orders);
        }
        orders
    }

    #[test]
    fn test_same_seed_same_orders() {
        let mut a = NoiseTrader::new(AgentId(1), NoiseTraderConfig::default(), 42);
        let mut b = NoiseTrader::new(AgentId(1), NoiseTraderConfig::default(), 42);

        let orders_a = run_ticks(&mut a, 50);
        let orders_b = run_ticks(&mut b, 50);

        assert!(!orders_a.is_empty());
        assert_eq!(orders_a.len(), orders_b.len());
        for (x, y) in orders_a.iter().zip(&orders_b) {
            assert_eq!(x.side, y.side);
            assert_eq!(x.limit_price(), y.limit_price());
            assert_eq!(x.quantity, y.quantity);
        }
    }

    #[test]
    fn test_orders_stay_near_reference() {
        let config = NoiseTraderConfig {
            order_probability: 1.0,
            ..Default::default()
        };
        let mut trader = NoiseTrader::new(AgentId(1), config.clone(), 7);

        for order in run_ticks(&mut trader, 100) {
            let price = order.limit_price().unwrap().to_float();
            assert!(price >= 100.0 * (1.0 - config.price_deviation) - 1e-6);
            assert!(price <= 100.0 * (1.0 + config.price_deviation) + 1e-6);
            let qty = order.quantity.raw();
            assert!(qty >= config.min_quantity && qty <= config.max_quantity);
        }
    }

    #[test]
    fn test_zero_probability_never_trades() {
        let config = NoiseTraderConfig {
            order_probability: 0.0,
            ..Default::default()
        };
        let mut trader = NoiseTrader::new(AgentId(1), config, 7);
        assert!(run_ticks(&mut trader, 50).is_empty());
        assert_eq!(trader.state().orders_placed(), 0);
    }
}
