//! market-sim binary: run a populated market simulation headlessly.
//!
//! Registers one symbol, spawns the configured agent population, runs for
//! a fixed number of ticks, and logs market statistics plus per-agent
//! accounting at the end.

use clap::Parser;
use simulation::{AgentPopulation, MarketSim, SimConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;
use types::Price;

/// Multi-agent market microstructure simulator.
#[derive(Parser, Debug)]
#[command(name = "market-sim")]
#[command(about = "Multi-agent market microstructure simulator")]
#[command(version)]
struct Args {
    /// Symbol to simulate
    #[arg(long, default_value = "TEST", env = "SIM_SYMBOL")]
    symbol: String,

    /// Initial reference price
    #[arg(long, default_value_t = 100.0, env = "SIM_INITIAL_PRICE")]
    initial_price: f64,

    /// Ticks to run
    #[arg(long, default_value_t = 1_000, env = "SIM_TICKS")]
    ticks: u64,

    /// Master seed for all stochastic components
    #[arg(long, default_value_t = 42, env = "SIM_SEED")]
    seed: u64,

    /// Number of market makers
    #[arg(long, default_value_t = 1)]
    market_makers: usize,

    /// Number of noise traders
    #[arg(long, default_value_t = 4)]
    noise_traders: usize,

    /// Number of informed traders
    #[arg(long, default_value_t = 2)]
    informed_traders: usize,

    /// Number of momentum traders
    #[arg(long, default_value_t = 2)]
    momentum_traders: usize,

    /// Force sequential agent collection (profiling)
    #[arg(long, env = "SIM_SEQUENTIAL")]
    sequential: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = SimConfig::default()
        .with_seed(args.seed)
        .with_population(AgentPopulation {
            market_makers: args.market_makers,
            noise_traders: args.noise_traders,
            informed_traders: args.informed_traders,
            momentum_traders: args.momentum_traders,
        })
        .with_force_sequential(args.sequential);

    let mut sim = MarketSim::new(config);
    sim.add_symbol(args.symbol.as_str(), Price::from_float(args.initial_price))?;
    sim.populate(args.symbol.as_str())?;

    info!(symbol = %args.symbol, ticks = args.ticks, seed = args.seed, "starting run");
    sim.run(args.ticks);

    let stats = sim.stats();
    let state = sim.get_market_state(&args.symbol)?;
    let analytics = sim.get_analytics(&args.symbol)?;
    info!(
        orders = stats.total_orders,
        trades = stats.total_trades,
        volume = stats.total_volume,
        "run complete"
    );
    info!(
        last_price = %state.last_price,
        volatility = state.volatility,
        momentum = state.momentum,
        liquidity = state.liquidity,
        "final market state"
    );
    info!(
        quoted_spread = ?analytics.quoted_spread,
        effective_spread = ?analytics.effective_spread,
        imbalance = ?analytics.imbalance,
        vwap = ?analytics.vwap,
        "final analytics"
    );

    for agent in sim.agent_summaries() {
        info!(
            id = %agent.id,
            name = %agent.name,
            position = agent.position,
            cash = %agent.cash,
            realized_pnl = %agent.realized_pnl,
            equity = %agent.equity,
            "agent summary"
        );
    }

    Ok(())
}
