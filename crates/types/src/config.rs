//! Execution-policy configuration shared across the engine crates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Price;

// =============================================================================
// Slippage Model
// =============================================================================

/// Shape of the execution-cost curve in order size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SlippageModel {
    /// Cost grows linearly with size relative to liquidity.
    Linear,
    /// Cost grows with the square root of size relative to liquidity.
    #[default]
    SquareRoot,
    /// Cost grows with the square of size relative to liquidity.
    Quadratic,
}

impl fmt::Display for SlippageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlippageModel::Linear => write!(f, "linear"),
            SlippageModel::SquareRoot => write!(f, "sqrt"),
            SlippageModel::Quadratic => write!(f, "quadratic"),
        }
    }
}

// =============================================================================
// Unfilled Market-Order Policy
// =============================================================================

/// What happens to a market order's remainder when contra-side depth runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UnfilledPolicy {
    /// The remainder is rejected; fills already produced stand.
    #[default]
    Reject,
    /// The order simply stays partially filled with no resting remainder.
    LeaveUnfilled,
}

// =============================================================================
// Execution Configuration
// =============================================================================

/// Execution engine settings, immutable for the life of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Slippage curve applied to taker fills.
    pub slippage_model: SlippageModel,
    /// Scale of the slippage curve (fraction of price at size == liquidity).
    pub slippage_coefficient: f64,
    /// Logical latency added to recorded fill timestamps, in ticks.
    pub latency_ticks: u64,
    /// Market-order shortfall handling.
    pub unfilled_policy: UnfilledPolicy,
    /// Price grid granularity. Incoming limit and trigger prices are
    /// snapped to the nearest multiple before matching.
    pub tick_size: Price,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            slippage_model: SlippageModel::SquareRoot,
            slippage_coefficient: 0.001,
            latency_ticks: 0,
            unfilled_policy: UnfilledPolicy::Reject,
            tick_size: Price::from_float(0.01),
        }
    }
}

impl ExecutionConfig {
    /// Set the slippage curve.
    pub fn with_slippage_model(mut self, model: SlippageModel) -> Self {
        self.slippage_model = model;
        self
    }

    /// Set the slippage coefficient.
    pub fn with_slippage_coefficient(mut self, coefficient: f64) -> Self {
        self.slippage_coefficient = coefficient;
        self
    }

    /// Set the modeled latency in ticks.
    pub fn with_latency_ticks(mut self, ticks: u64) -> Self {
        self.latency_ticks = ticks;
        self
    }

    /// Set the market-order shortfall policy.
    pub fn with_unfilled_policy(mut self, policy: UnfilledPolicy) -> Self {
        self.unfilled_policy = policy;
        self
    }

    /// Set the price grid granularity.
    pub fn with_tick_size(mut self, tick_size: Price) -> Self {
        self.tick_size = tick_size;
        self
    }
}
