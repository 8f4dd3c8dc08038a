//! Simulation crate: the tick orchestrator for the market simulator.
//!
//! [`MarketSim`] coordinates, per tick and per symbol:
//! - stochastic price discovery fed by the previous tick's order flow
//! - liquidity recovery and stop-order triggers
//! - agent decision collection and order routing through execution
//! - analytics recompute and publication of immutable snapshots
//!
//! # Determinism
//!
//! A run is a pure function of [`SimConfig`] and its master seed. Lanes
//! iterate in symbol order, agents step in ascending id order, and every
//! stochastic component draws from its own seeded RNG. The `parallel`
//! feature changes only how agent decisions are collected, never their
//! order.
//!
//! # Threaded operation
//!
//! [`SimDriver`] moves the simulation onto its own thread, steps it at
//! the configured tick interval, serializes external order flow through a
//! command channel, and republishes read-only views after every tick:
//!
//! ```ignore
//! use simulation::{MarketSim, SimConfig, SimDriver};
//!
//! let mut sim = MarketSim::new(SimConfig::default());
//! sim.add_symbol("TEST", types::Price::from_float(100.0))?;
//! sim.populate("TEST")?;
//!
//! let driver = SimDriver::start(sim);
//! let state = driver.market_state("TEST")?;
//! let sim = driver.stop();
//! ```

pub mod config;
mod driver;
mod lane;
pub mod parallel;
mod runner;

pub use config::{AgentPopulation, SimConfig};
pub use driver::{MarketView, SimDriver};
pub use runner::{AgentSummary, MarketSim, SimStats};
