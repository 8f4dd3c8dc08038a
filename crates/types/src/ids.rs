//! Identifiers and logical-time aliases.
//!
//! Ids are plain u64 newtypes handed out by the simulation in submission
//! order, so their `Ord` doubles as arrival order wherever a stable,
//! deterministic sort key is needed (agent stepping, stop-trigger
//! release).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            Default,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.0)
            }
        }
    };
}

define_id!(
    /// One order, unique for the life of a run.
    OrderId,
    "Order"
);

define_id!(
    /// One market participant.
    AgentId,
    "Agent"
);

define_id!(
    /// One match between two orders.
    TradeId,
    "Trade"
);

define_id!(
    /// One order's side of a single match.
    FillId,
    "Fill"
);

/// Simulated instrument symbol (e.g., "TEST").
pub type Symbol = String;

/// Logical event time: starts at zero and advances once per tick. Fill
/// records may carry a later timestamp when latency is modeled.
pub type Timestamp = u64;

/// Discrete simulation time step.
pub type Tick = u64;
