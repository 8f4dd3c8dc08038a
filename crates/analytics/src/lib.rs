//! Microstructure analytics: rolling windows, statistics helpers, and the
//! per-symbol analytics engine.

pub mod engine;
pub mod rolling;
pub mod stats;

pub use engine::{AnalyticsCadence, AnalyticsConfig, AnalyticsEngine, MarketAnalytics};
pub use rolling::RollingWindow;
