//! Core market mechanics for one simulated symbol:
//! - Order book with price-time priority, backed by an order arena
//! - Matching engine producing trades plus maker/taker fills
//! - Liquidity and square-root market-impact model
//! - Stochastic price-discovery process
//! - Execution engine (validation, stops, slippage, latency, cancels)

mod error;
mod execution;
mod liquidity;
mod matching;
mod order_book;
mod price_discovery;

pub use error::{Result, SimError};
pub use execution::{ExecutionEngine, ExecutionReport};
pub use liquidity::{LiquidityConfig, LiquidityModel};
pub use matching::{MatchParams, MatchResult, MatchingEngine};
pub use order_book::{BestQuote, OrderBook, PriceLevel};
pub use price_discovery::{PriceProcess, PriceProcessConfig};
