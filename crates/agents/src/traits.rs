//! The agent decision capability.
//!
//! Every synthetic participant implements [`Agent`]: once per tick it
//! receives a read-only [`StrategyContext`] and returns an [`AgentAction`]
//! (orders to submit, ids to cancel). A failed decision is isolated to the
//! agent and the tick; the simulation continues without it.

use std::fmt;

use types::{AgentId, Order, OrderId, Trade};

use crate::state::AgentState;
use crate::StrategyContext;

/// A single agent's decision failure for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentError {
    pub agent: AgentId,
    pub detail: String,
}

impl AgentError {
    pub fn new(agent: AgentId, detail: impl Into<String>) -> Self {
        Self {
            agent,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} decision failed: {}", self.agent, self.detail)
    }
}

impl std::error::Error for AgentError {}

/// What an agent wants done this tick: zero or more submissions plus zero
/// or more cancellations. Cancellations are applied before submissions.
#[derive(Debug, Clone, Default)]
pub struct AgentAction {
    /// Orders to submit this tick.
    pub orders: Vec<Order>,
    /// Resting order ids to cancel this tick.
    pub cancellations: Vec<OrderId>,
}

impl AgentAction {
    /// No orders, no cancellations.
    pub fn none() -> Self {
        Self::default()
    }

    /// A single order.
    pub fn single(order: Order) -> Self {
        Self {
            orders: vec![order],
            cancellations: vec![],
        }
    }

    /// Multiple orders.
    pub fn multiple(orders: Vec<Order>) -> Self {
        Self {
            orders,
            cancellations: vec![],
        }
    }

    /// Cancel existing orders and place new ones.
    pub fn cancel_and_replace(cancellations: Vec<OrderId>, orders: Vec<Order>) -> Self {
        Self {
            orders,
            cancellations,
        }
    }

    /// Whether this action does anything at all.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty() && self.cancellations.is_empty()
    }
}

/// The decision capability all trading agents implement.
///
/// The context borrows from simulation state, so agents extract what they
/// need during `on_tick` rather than holding references.
pub trait Agent: Send {
    /// Unique, stable identifier. Agents are stepped in ascending id order.
    fn id(&self) -> AgentId;

    /// Decide this tick's action from the published market view.
    fn on_tick(&mut self, ctx: &StrategyContext<'_>) -> Result<AgentAction, AgentError>;

    /// Accounting state (position, cash, realized P&L).
    fn state(&self) -> &AgentState;

    /// Mutable accounting state, used by the default fill handler.
    fn state_mut(&mut self) -> &mut AgentState;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "Agent"
    }

    /// Called once for every trade one of this agent's orders participated
    /// in. The default updates position/cash/P&L from the trade. A
    /// self-trade applies both legs and nets flat.
    fn on_fill(&mut self, trade: &Trade) {
        let id = self.id();
        let value = trade.value();
        if trade.buyer_id == id {
            self.state_mut().on_buy(trade.quantity.raw(), value);
        }
        if trade.seller_id == id {
            self.state_mut().on_sell(trade.quantity.raw(), value);
        }
    }

    /// Called after submission when one of this agent's orders rests on the
    /// book, with the id assigned by the simulation. Default: ignore.
    fn on_order_resting(&mut self, _order_id: OrderId, _order: &Order) {}

    /// Current position in shares.
    fn position(&self) -> i64 {
        self.state().position()
    }

    /// Current cash balance.
    fn cash(&self) -> types::Cash {
        self.state().cash()
    }

    /// Realized P&L so far.
    fn realized_pnl(&self) -> types::Cash {
        self.state().realized_pnl()
    }
}
