//! Stochastic price-discovery process.
//!
//! Advances the per-symbol reference price once per tick as the sum of a
//! momentum term, a mean-reversion term, a Brownian-style noise increment,
//! and the market impact of the previous tick's net signed order flow. The
//! process is a pure state update; it never touches the book.

use analytics::RollingWindow;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use types::{OrderSide, Price, Quantity};

use crate::liquidity::LiquidityModel;

// =============================================================================
// Configuration
// =============================================================================

/// Price-process coefficients, immutable for the life of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceProcessConfig {
    /// Weight on the recent per-tick price trend.
    pub momentum_factor: f64,
    /// Pull per tick toward the rolling reference mean.
    pub mean_reversion_rate: f64,
    /// Per-tick noise standard deviation, as a fraction of price.
    pub volatility: f64,
    /// Ticks of history behind the trend estimate.
    pub trend_window: usize,
    /// Ticks of history behind the mean-reversion reference.
    pub reference_window: usize,
}

impl Default for PriceProcessConfig {
    fn default() -> Self {
        Self {
            momentum_factor: 0.1,
            mean_reversion_rate: 0.05,
            volatility: 0.005,
            trend_window: 10,
            reference_window: 50,
        }
    }
}

impl PriceProcessConfig {
    pub fn with_momentum_factor(mut self, factor: f64) -> Self {
        self.momentum_factor = factor;
        self
    }

    pub fn with_mean_reversion_rate(mut self, rate: f64) -> Self {
        self.mean_reversion_rate = rate;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }
}

// =============================================================================
// Process
// =============================================================================

/// Per-symbol price process with its own seeded RNG.
#[derive(Debug, Clone)]
pub struct PriceProcess {
    config: PriceProcessConfig,
    price: Price,
    rng: StdRng,
    /// Short window driving the trend estimate.
    trend_prices: RollingWindow,
    /// Longer window driving the mean-reversion reference.
    reference_prices: RollingWindow,
    /// Net signed order flow (buy positive) recorded since the last step,
    /// applied to the *next* step's flow-impact term.
    pending_flow: i64,
    momentum: f64,
}

impl PriceProcess {
    pub fn new(config: PriceProcessConfig, initial_price: Price, seed: u64) -> Self {
        let mut trend_prices = RollingWindow::new(config.trend_window.max(2));
        let mut reference_prices = RollingWindow::new(config.reference_window.max(2));
        trend_prices.push(initial_price.to_float());
        reference_prices.push(initial_price.to_float());
        Self {
            config,
            price: initial_price,
            rng: StdRng::seed_from_u64(seed),
            trend_prices,
            reference_prices,
            pending_flow: 0,
            momentum: 0.0,
        }
    }

    /// Current reference price.
    pub fn price(&self) -> Price {
        self.price
    }

    /// Latest per-tick trend estimate, in price units per tick.
    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    /// Record signed order flow executed during the current tick. It feeds
    /// the flow-impact term of the following step.
    pub fn record_flow(&mut self, side: OrderSide, quantity: Quantity) {
        self.pending_flow += side.sign() * quantity.raw() as i64;
    }

    /// Deterministic drift components of the next step (momentum plus mean
    /// reversion, no noise, no flow). Used as the informed traders' signal
    /// source without consuming RNG state.
    pub fn expected_drift(&self) -> f64 {
        self.momentum_term() + self.reversion_term()
    }

    /// Advance the price by one tick and return the new reference price.
    pub fn step(&mut self, liquidity: &LiquidityModel) -> Price {
        let momentum = self.momentum_term();
        let reversion = self.reversion_term();
        let noise = self.noise_term();
        let flow = self.flow_impact_term(liquidity);

        let next = self.price.to_float() + momentum + reversion + noise + flow;
        // Price floor: one raw unit, the process never crosses zero.
        self.price = Price((next * types::PRICE_SCALE as f64).round() as i64).max(Price(1));

        self.momentum = self.trend();
        self.trend_prices.push(self.price.to_float());
        self.reference_prices.push(self.price.to_float());
        self.price
    }

    /// Per-tick realized trend over the short window, in price units.
    fn trend(&self) -> f64 {
        let n = self.trend_prices.len();
        if n < 2 {
            return 0.0;
        }
        match (self.trend_prices.first(), self.trend_prices.last()) {
            (Some(first), Some(last)) => (last - first) / (n - 1) as f64,
            _ => 0.0,
        }
    }

    fn momentum_term(&self) -> f64 {
        self.config.momentum_factor * self.trend()
    }

    fn reversion_term(&self) -> f64 {
        match self.reference_prices.mean() {
            Some(reference) => {
                self.config.mean_reversion_rate * (reference - self.price.to_float())
            }
            None => 0.0,
        }
    }

    fn noise_term(&mut self) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        self.config.volatility * self.price.to_float() * z
    }

    fn flow_impact_term(&mut self, liquidity: &LiquidityModel) -> f64 {
        let flow = std::mem::take(&mut self.pending_flow);
        if flow == 0 {
            return 0.0;
        }
        let side = if flow > 0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        let magnitude = liquidity.impact_magnitude(Quantity(flow.unsigned_abs()), self.price);
        side.sign() as f64 * magnitude.to_float()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liquidity::LiquidityConfig;

    fn quiet_config() -> PriceProcessConfig {
        // Zero volatility isolates the deterministic terms.
        PriceProcessConfig::default().with_volatility(0.0)
    }

    fn liquidity() -> LiquidityModel {
        LiquidityModel::new(LiquidityConfig::default())
    }

    #[test]
    fn test_same_seed_same_path() {
        let config = PriceProcessConfig::default();
        let start = Price::from_float(100.0);
        let mut a = PriceProcess::new(config.clone(), start, 42);
        let mut b = PriceProcess::new(config, start, 42);
        let liq = liquidity();

        for _ in 0..100 {
            assert_eq!(a.step(&liq), b.step(&liq));
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let config = PriceProcessConfig::default();
        let start = Price::from_float(100.0);
        let mut a = PriceProcess::new(config.clone(), start, 1);
        let mut b = PriceProcess::new(config, start, 2);
        let liq = liquidity();

        let path_a: Vec<Price> = (0..20).map(|_| a.step(&liq)).collect();
        let path_b: Vec<Price> = (0..20).map(|_| b.step(&liq)).collect();
        assert_ne!(path_a, path_b);
    }

    #[test]
    fn test_no_signal_no_move() {
        let mut process = PriceProcess::new(quiet_config(), Price::from_float(100.0), 7);
        let liq = liquidity();
        // Flat history, no noise, no flow: every term is zero.
        for _ in 0..10 {
            assert_eq!(process.step(&liq), Price::from_float(100.0));
        }
        assert_eq!(process.momentum(), 0.0);
    }

    #[test]
    fn test_buy_flow_pushes_price_up_next_step() {
        let mut process = PriceProcess::new(quiet_config(), Price::from_float(100.0), 7);
        let liq = liquidity();

        process.record_flow(OrderSide::Buy, Quantity(2_500));
        let after_flow = process.step(&liq);
        assert!(after_flow > Price::from_float(100.0));

        // Flow is consumed by the step; reversion now pulls back down.
        let next = process.step(&liq);
        assert!(next < after_flow);
    }

    #[test]
    fn test_sell_flow_pushes_price_down() {
        let mut process = PriceProcess::new(quiet_config(), Price::from_float(100.0), 7);
        let liq = liquidity();

        process.record_flow(OrderSide::Sell, Quantity(2_500));
        assert!(process.step(&liq) < Price::from_float(100.0));
    }

    #[test]
    fn test_opposing_flow_nets_out() {
        let mut process = PriceProcess::new(quiet_config(), Price::from_float(100.0), 7);
        let liq = liquidity();

        process.record_flow(OrderSide::Buy, Quantity(500));
        process.record_flow(OrderSide::Sell, Quantity(500));
        assert_eq!(process.step(&liq), Price::from_float(100.0));
    }

    #[test]
    fn test_price_never_non_positive() {
        let config = PriceProcessConfig::default().with_volatility(5.0);
        let mut process = PriceProcess::new(config, Price(2), 13);
        let liq = liquidity();

        for _ in 0..200 {
            assert!(process.step(&liq).is_positive());
        }
    }
}
