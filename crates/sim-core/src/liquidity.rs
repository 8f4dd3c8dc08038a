//! Liquidity and market-impact model.
//!
//! Tracks liquidity available beyond the visible book as a single scalar
//! level per symbol. Trading consumes liquidity; between trades the level
//! recovers toward a configured base at an exponential rate. Price impact
//! of a given order size follows a square-root curve in size relative to
//! the current level.

use serde::{Deserialize, Serialize};
use types::{OrderSide, Price, Quantity};

// =============================================================================
// Configuration
// =============================================================================

/// Liquidity model parameters, immutable for the life of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityConfig {
    /// Resting liquidity level the model recovers toward, in shares.
    pub base_liquidity: f64,
    /// Exponential recovery rate per tick.
    pub recovery_rate: f64,
    /// Scale of the square-root impact curve (fraction of price at
    /// size == liquidity).
    pub impact_coefficient: f64,
    /// Liquidity consumed per share traded.
    pub consumption_per_share: f64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            base_liquidity: 10_000.0,
            recovery_rate: 0.1,
            impact_coefficient: 0.001,
            consumption_per_share: 1.0,
        }
    }
}

impl LiquidityConfig {
    /// Set the base liquidity level.
    pub fn with_base_liquidity(mut self, base: f64) -> Self {
        self.base_liquidity = base;
        self
    }

    /// Set the per-tick recovery rate.
    pub fn with_recovery_rate(mut self, rate: f64) -> Self {
        self.recovery_rate = rate;
        self
    }

    /// Set the impact coefficient.
    pub fn with_impact_coefficient(mut self, coefficient: f64) -> Self {
        self.impact_coefficient = coefficient;
        self
    }
}

// =============================================================================
// Model
// =============================================================================

/// Per-symbol liquidity state.
#[derive(Debug, Clone)]
pub struct LiquidityModel {
    config: LiquidityConfig,
    level: f64,
}

impl LiquidityModel {
    /// Create a model at the configured base level.
    pub fn new(config: LiquidityConfig) -> Self {
        let level = config.base_liquidity;
        Self { config, level }
    }

    /// Current liquidity level.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// The configured base level.
    pub fn base(&self) -> f64 {
        self.config.base_liquidity
    }

    /// Signed price adjustment for trading `size` shares at the current
    /// liquidity level: buys push the price up, sells push it down.
    /// Magnitude is `coefficient * reference * sqrt(size / level)`.
    pub fn impact(&self, side: OrderSide, size: Quantity, reference: Price) -> Price {
        let magnitude = self.impact_magnitude(size, reference);
        Price(side.sign() * magnitude.raw())
    }

    /// Unsigned impact magnitude in price units.
    pub fn impact_magnitude(&self, size: Quantity, reference: Price) -> Price {
        if size.is_zero() {
            return Price::ZERO;
        }
        // Treat a drained pool as one share of depth so the impact stays
        // finite and large.
        let level = self.level.max(1.0);
        let ratio = size.raw() as f64 / level;
        let fraction = self.config.impact_coefficient * ratio.sqrt();
        Price((reference.raw() as f64 * fraction).round() as i64)
    }

    /// Consume liquidity in proportion to traded quantity. Never drops
    /// below zero.
    pub fn apply_consumption(&mut self, consumed: Quantity) {
        let drain = consumed.raw() as f64 * self.config.consumption_per_share;
        self.level = (self.level - drain).max(0.0);
    }

    /// Recover toward the base level over `elapsed_ticks` at the configured
    /// exponential rate. Never overshoots the base; a level above base
    /// decays down toward it the same way.
    pub fn decay_toward_base(&mut self, elapsed_ticks: u64) {
        if elapsed_ticks == 0 {
            return;
        }
        let base = self.config.base_liquidity;
        let fraction = 1.0 - (-self.config.recovery_rate * elapsed_ticks as f64).exp();
        self.level += (base - self.level) * fraction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(base: f64, rate: f64, coefficient: f64) -> LiquidityModel {
        LiquidityModel::new(
            LiquidityConfig::default()
                .with_base_liquidity(base)
                .with_recovery_rate(rate)
                .with_impact_coefficient(coefficient),
        )
    }

    #[test]
    fn test_starts_at_base() {
        let model = model(5_000.0, 0.1, 0.001);
        assert_eq!(model.level(), 5_000.0);
    }

    #[test]
    fn test_impact_sign_follows_side() {
        let model = model(10_000.0, 0.1, 0.01);
        let reference = Price::from_float(100.0);

        let buy = model.impact(OrderSide::Buy, Quantity(2_500), reference);
        let sell = model.impact(OrderSide::Sell, Quantity(2_500), reference);

        assert!(buy.is_positive());
        assert_eq!(sell, -buy);
        // sqrt(2500/10000) = 0.5, so magnitude = 0.01 * 0.5 * 100 = 0.5
        assert_eq!(buy, Price::from_float(0.5));
    }

    #[test]
    fn test_impact_grows_sublinearly() {
        let model = model(10_000.0, 0.1, 0.01);
        let reference = Price::from_float(100.0);

        let small = model.impact_magnitude(Quantity(100), reference);
        let large = model.impact_magnitude(Quantity(400), reference);

        // 4x the size is only 2x the impact
        assert_eq!(large.raw(), small.raw() * 2);
    }

    #[test]
    fn test_consumption_floors_at_zero() {
        let mut model = model(1_000.0, 0.1, 0.001);
        model.apply_consumption(Quantity(600));
        assert_eq!(model.level(), 400.0);

        model.apply_consumption(Quantity(9_999));
        assert_eq!(model.level(), 0.0);
    }

    #[test]
    fn test_recovery_monotone_and_capped_at_base() {
        let mut model = model(1_000.0, 0.5, 0.001);
        model.apply_consumption(Quantity(800));

        let mut previous = model.level();
        for _ in 0..50 {
            model.decay_toward_base(1);
            assert!(model.level() >= previous);
            assert!(model.level() <= model.base());
            previous = model.level();
        }
        assert!((model.level() - 1_000.0).abs() < 1.0);
    }

    #[test]
    fn test_multi_tick_recovery_matches_repeated_single_ticks() {
        let mut a = model(1_000.0, 0.2, 0.001);
        let mut b = a.clone();
        a.apply_consumption(Quantity(500));
        b.apply_consumption(Quantity(500));

        a.decay_toward_base(3);
        for _ in 0..3 {
            b.decay_toward_base(1);
        }
        assert!((a.level() - b.level()).abs() < 1e-9);
    }
}
