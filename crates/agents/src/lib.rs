//! Synthetic market participants.
//!
//! This crate provides:
//! - The [`Agent`] trait: one decision capability for a closed set of
//!   strategy implementations
//! - [`StrategyContext`], the read-only per-tick view agents decide from
//! - [`AgentAction`], what an agent wants submitted or cancelled
//! - [`AgentState`] accounting (position, cash, realized P&L)
//! - The four strategies under [`strategies`]
//!
//! The simulation steps agents in ascending id order, routes their orders,
//! and notifies them of fills; agents never touch the book directly.

mod context;
mod state;
pub mod strategies;
mod traits;

pub use context::StrategyContext;
pub use state::AgentState;
pub use strategies::{
    InformedTrader, InformedTraderConfig, MarketMaker, MarketMakerConfig, MomentumTrader,
    MomentumTraderConfig, NoiseTrader, NoiseTraderConfig,
};
pub use traits::{Agent, AgentAction, AgentError};
