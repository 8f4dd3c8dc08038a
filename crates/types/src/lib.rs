//! Shared value types for the market simulator.
//!
//! Everything other crates exchange lives here: identifiers, fixed-point
//! monetary types, orders and their lifecycle, trades and fills, published
//! market data, and execution-policy configuration.

pub mod config;
pub mod ids;
pub mod market_data;
pub mod money;
pub mod order;
pub mod trade;

pub use config::{ExecutionConfig, SlippageModel, UnfilledPolicy};
pub use ids::{AgentId, FillId, OrderId, Symbol, Tick, Timestamp, TradeId};
pub use market_data::{BookLevel, BookSnapshot, MarketState};
pub use money::{Cash, Price, Quantity, PRICE_SCALE};
pub use order::{InvalidOrder, Order, OrderSide, OrderStatus, OrderType};
pub use trade::{Fill, LiquidityRole, Trade};
