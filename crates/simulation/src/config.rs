//! Simulation configuration options.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use analytics::AnalyticsConfig;
use sim_core::{LiquidityConfig, PriceProcessConfig};
use types::{ExecutionConfig, Symbol};

/// How many agents of each strategy to spawn per symbol.
#[derive(Debug, Clone)]
pub struct AgentPopulation {
    pub market_makers: usize,
    pub noise_traders: usize,
    pub informed_traders: usize,
    pub momentum_traders: usize,
}

impl Default for AgentPopulation {
    fn default() -> Self {
        Self {
            market_makers: 1,
            noise_traders: 4,
            informed_traders: 2,
            momentum_traders: 2,
        }
    }
}

impl AgentPopulation {
    /// Total number of agents across all strategies.
    pub fn total(&self) -> usize {
        self.market_makers + self.noise_traders + self.informed_traders + self.momentum_traders
    }
}

/// Configuration for the simulation.
///
/// One master `seed` fans out into per-component sub-seeds, so two runs
/// with the same configuration produce identical tick sequences.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Wall-clock cadence of the threaded driver. `step()`-driven runs
    /// ignore it.
    pub tick_interval: Duration,

    /// Number of book levels to include in published snapshots.
    pub snapshot_depth: usize,

    /// Maximum number of recent trades kept per symbol.
    pub max_recent_trades: usize,

    /// Liquidity / market-impact model parameters.
    pub liquidity: LiquidityConfig,

    /// Stochastic price-discovery parameters.
    pub price_process: PriceProcessConfig,

    /// Execution engine settings (slippage, latency, unfilled policy).
    pub execution: ExecutionConfig,

    /// Analytics windows and recompute cadence.
    pub analytics: AnalyticsConfig,

    /// Agents spawned per symbol by [`populate`](crate::MarketSim::populate).
    pub population: AgentPopulation,

    /// Master seed for all stochastic components.
    pub seed: u64,

    /// Run agent collection sequentially even with the `parallel` feature.
    pub force_sequential: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
            snapshot_depth: 10,
            max_recent_trades: 100,
            liquidity: LiquidityConfig::default(),
            price_process: PriceProcessConfig::default(),
            execution: ExecutionConfig::default(),
            analytics: AnalyticsConfig::default(),
            population: AgentPopulation::default(),
            seed: 42,
            force_sequential: false,
        }
    }
}

impl SimConfig {
    /// Set the driver tick cadence.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the snapshot depth.
    pub fn with_snapshot_depth(mut self, depth: usize) -> Self {
        self.snapshot_depth = depth;
        self
    }

    /// Set the maximum recent trades kept per symbol.
    pub fn with_max_recent_trades(mut self, max: usize) -> Self {
        self.max_recent_trades = max;
        self
    }

    /// Set the liquidity model parameters.
    pub fn with_liquidity(mut self, config: LiquidityConfig) -> Self {
        self.liquidity = config;
        self
    }

    /// Set the price-discovery parameters.
    pub fn with_price_process(mut self, config: PriceProcessConfig) -> Self {
        self.price_process = config;
        self
    }

    /// Set the execution engine settings.
    pub fn with_execution(mut self, config: ExecutionConfig) -> Self {
        self.execution = config;
        self
    }

    /// Set the analytics configuration.
    pub fn with_analytics(mut self, config: AnalyticsConfig) -> Self {
        self.analytics = config;
        self
    }

    /// Set the per-symbol agent population.
    pub fn with_population(mut self, population: AgentPopulation) -> Self {
        self.population = population;
        self
    }

    /// Set the master seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Force sequential agent collection.
    pub fn with_force_sequential(mut self, force: bool) -> Self {
        self.force_sequential = force;
        self
    }

    /// Derive a sub-seed for one named component of one symbol's lane.
    ///
    /// Deterministic in (master seed, symbol, component), so adding a
    /// symbol never perturbs the streams of the others.
    pub fn sub_seed(&self, symbol: &Symbol, component: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        symbol.hash(&mut hasher);
        component.hash(&mut hasher);
        hasher.finish()
    }
}
