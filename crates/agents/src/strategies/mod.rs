//! Concrete `Agent` implementations.
//!
//! The four participant types of the simulation:
//! - [`MarketMaker`] - two-sided quotes around the mid, inventory-skewed
//! - [`NoiseTrader`] - random uninformed order flow
//! - [`InformedTrader`] - trades a noisy preview of the next price move
//! - [`MomentumTrader`] - follows the recent realized trend

mod informed;
mod market_maker;
mod momentum;
mod noise_trader;

pub use informed::{InformedTrader, InformedTraderConfig};
pub use market_maker::{MarketMaker, MarketMakerConfig};
pub use momentum::{MomentumTrader, MomentumTraderConfig};
pub use noise_trader::{NoiseTrader, NoiseTraderConfig};
