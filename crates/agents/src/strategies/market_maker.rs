//! Market maker: quotes both sides of the book around the mid.
//!
//! Keeps a bid and an ask resting at a configured half-spread, refreshing
//! on an interval so the quotes track the moving mid. Inventory skews both
//! quotes: a long book shades prices down to shed shares, a short book
//! shades them up to buy back.

use types::{AgentId, Cash, Order, OrderId, OrderSide, Price, Quantity, Trade};

use crate::state::AgentState;
use crate::traits::{Agent, AgentAction, AgentError};
use crate::StrategyContext;

/// Configuration for a [`MarketMaker`].
#[derive(Debug, Clone)]
pub struct MarketMakerConfig {
    /// Symbol to quote.
    pub symbol: String,
    /// Half-spread as a fraction of mid (0.005 = 0.5%).
    pub half_spread: f64,
    /// Size quoted on each side.
    pub quote_size: u64,
    /// Starting cash balance.
    pub initial_cash: Cash,
    /// Inventory beyond which the skew stops growing, in shares.
    pub max_inventory: i64,
    /// Price shade per share of inventory, as a fraction of mid.
    pub inventory_skew: f64,
    /// Ticks between quote refreshes.
    pub refresh_interval: u64,
}

impl Default for MarketMakerConfig {
    fn default() -> Self {
        Self {
            symbol: "TEST".to_string(),
            half_spread: 0.005,
            quote_size: 100,
            initial_cash: Cash::from_float(1_000_000.0),
            max_inventory: 1_000,
            inventory_skew: 0.0001,
            refresh_interval: 5,
        }
    }
}

/// Liquidity-providing agent quoting a two-sided market.
pub struct MarketMaker {
    id: AgentId,
    config: MarketMakerConfig,
    state: AgentState,
    /// Quote ids currently resting, cancelled on the next refresh.
    live_quotes: Vec<OrderId>,
    last_quote_tick: u64,
    has_quoted: bool,
}

impl MarketMaker {
    pub fn new(id: AgentId, config: MarketMakerConfig) -> Self {
        let initial_cash = config.initial_cash;
        Self {
            id,
            config,
            state: AgentState::new(initial_cash),
            live_quotes: Vec::new(),
            last_quote_tick: 0,
            has_quoted: false,
        }
    }

    pub fn with_defaults(id: AgentId) -> Self {
        Self::new(id, MarketMakerConfig::default())
    }

    /// Skew in fractional price units. Long inventory shades quotes down,
    /// short inventory shades them up.
    fn quote_skew(&self) -> f64 {
        let clamped = self
            .state
            .position()
            .clamp(-self.config.max_inventory, self.config.max_inventory);
        -self.config.inventory_skew * clamped as f64
    }

    fn generate_quotes(&self, reference: Price) -> Result<Vec<Order>, AgentError> {
        let mid = reference.to_float();
        let skew = self.quote_skew();
        let bid_price = Price::from_float(mid * (1.0 - self.config.half_spread + skew));
        let ask_price = Price::from_float(mid * (1.0 + self.config.half_spread + skew));
        let size = Quantity(self.config.quote_size);

        let bid = Order::limit(self.id, &self.config.symbol, OrderSide::Buy, bid_price, size)
            .map_err(|e| AgentError::new(self.id, e.to_string()))?;
        let ask = Order::limit(self.id, &self.config.symbol, OrderSide::Sell, ask_price, size)
            .map_err(|e| AgentError::new(self.id, e.to_string()))?;
        Ok(vec![bid, ask])
    }

    fn should_refresh(&self, tick: u64) -> bool {
        !self.has_quoted || tick >= self.last_quote_tick + self.config.refresh_interval
    }
}

impl Agent for MarketMaker {
    fn id(&self) -> AgentId {
        self.id
    }

    fn on_tick(&mut self, ctx: &StrategyContext<'_>) -> Result<AgentAction, AgentError> {
        if !self.should_refresh(ctx.tick) {
            return Ok(AgentAction::none());
        }

        let orders = self.generate_quotes(ctx.mid_price())?;
        let stale = std::mem::take(&mut self.live_quotes);

        self.state.record_orders(orders.len() as u64);
        self.last_quote_tick = ctx.tick;
        self.has_quoted = true;

        Ok(AgentAction::cancel_and_replace(stale, orders))
    }

    fn on_order_resting(&mut self, order_id: OrderId, _order: &Order) {
        self.live_quotes.push(order_id);
    }

    fn on_fill(&mut self, trade: &Trade) {
        let value = trade.value();
        if trade.buyer_id == self.id {
            self.state.on_buy(trade.quantity.raw(), value);
        }
        if trade.seller_id == self.id {
            self.state.on_sell(trade.quantity.raw(), value);
        }
    }

    fn name(&self) -> &str {
        "MarketMaker"
    }

    fn state(&self) -> &AgentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }
}
