//! Order book with price-time priority, backed by an order arena.
//!
//! Resting orders live in a single arena keyed by [`OrderId`]; price levels
//! hold id queues rather than order values, so an order is never reachable
//! through two mutable paths at once. Bids and asks are `BTreeMap`s, giving
//! sorted iteration on both sides. Within a level, ids queue FIFO (time
//! priority).

use std::collections::{BTreeMap, HashMap, VecDeque};

use types::{
    AgentId, BookLevel, BookSnapshot, InvalidOrder, Order, OrderId, OrderSide, OrderStatus, Price,
    Quantity, Symbol, Tick, Timestamp,
};

use crate::error::{Result, SimError};

/// A single price level: aggregate quantity plus the FIFO id queue.
#[derive(Debug, Clone, Default)]
pub struct PriceLevel {
    /// Total remaining quantity across all orders at this price.
    pub total_quantity: Quantity,
    /// Order ids at this price, front = oldest.
    pub orders: VecDeque<OrderId>,
}

impl PriceLevel {
    /// Check if this level holds no orders.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Number of orders at this level.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

/// Top-of-book view of one resting order, used by the matching loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestQuote {
    pub price: Price,
    pub order_id: OrderId,
    pub agent_id: AgentId,
    pub remaining: Quantity,
}

/// Order book for a single symbol.
#[derive(Debug, Clone)]
pub struct OrderBook {
    /// The symbol this book is for.
    symbol: Symbol,
    /// Bid levels; iterate in reverse for highest-first.
    bids: BTreeMap<Price, PriceLevel>,
    /// Ask levels; iterate forward for lowest-first.
    asks: BTreeMap<Price, PriceLevel>,
    /// All resting orders, keyed by id. Orders leave the arena when they
    /// fill completely or are removed.
    arena: HashMap<OrderId, Order>,
    /// Last trade price.
    last_price: Option<Price>,
}

impl OrderBook {
    /// Create a new empty order book for a symbol.
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            arena: HashMap::new(),
            last_price: None,
        }
    }

    /// Get the symbol this book is for.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Rest an order in the book, transitioning it to `Open` (or keeping
    /// `PartiallyFilled` for a partially matched remainder).
    ///
    /// Only orders with a limit price can rest; market orders must go
    /// through the matching engine.
    pub fn add(&mut self, mut order: Order) -> Result<()> {
        if order.remaining_quantity().is_zero() {
            return Err(SimError::InvalidOrder(InvalidOrder::ZeroQuantity));
        }
        let price = order
            .limit_price()
            .ok_or(SimError::MissingLimitPrice(order.id))?;
        if !price.is_positive() {
            return Err(SimError::InvalidOrder(InvalidOrder::NonPositivePrice(price)));
        }

        if order.status == OrderStatus::Pending {
            order.status = OrderStatus::Open;
        }

        let level = match order.side {
            OrderSide::Buy => self.bids.entry(price).or_default(),
            OrderSide::Sell => self.asks.entry(price).or_default(),
        };
        level.total_quantity += order.remaining_quantity();
        level.orders.push_back(order.id);
        self.arena.insert(order.id, order);

        Ok(())
    }

    /// Remove a resting order from the book and return it. The caller
    /// decides the final status (e.g. `Cancelled`).
    pub fn remove(&mut self, order_id: OrderId) -> Result<Order> {
        let order = self
            .arena
            .remove(&order_id)
            .ok_or(SimError::OrderNotFound(order_id))?;

        // The arena entry implies a level entry; a miss here surfaces via
        // check_invariants.
        let price = order.limit_price().unwrap_or(Price::ZERO);
        let book_side = match order.side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        };
        if let Some(level) = book_side.get_mut(&price) {
            if let Some(pos) = level.orders.iter().position(|id| *id == order_id) {
                level.orders.remove(pos);
                level.total_quantity = level
                    .total_quantity
                    .saturating_sub(order.remaining_quantity());
            }
            if level.is_empty() {
                book_side.remove(&price);
            }
        }

        Ok(order)
    }

    /// Look up a resting order.
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.arena.get(&order_id)
    }

    /// Whether an order is currently resting in this book.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.arena.contains_key(&order_id)
    }

    /// Get the best bid price.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    /// Get the best ask price.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Spread between best bid and ask.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Mid price, falling back to the one-sided quote or the last trade
    /// price when a side is empty.
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(Price((bid.raw() + ask.raw()) / 2)),
            (Some(bid), None) => Some(bid),
            (None, Some(ask)) => Some(ask),
            (None, None) => self.last_price,
        }
    }

    /// Front order at the best ask, if any.
    pub fn peek_best_ask(&self) -> Option<BestQuote> {
        self.peek(self.asks.iter().next())
    }

    /// Front order at the best bid, if any.
    pub fn peek_best_bid(&self) -> Option<BestQuote> {
        self.peek(self.bids.iter().next_back())
    }

    fn peek(&self, entry: Option<(&Price, &PriceLevel)>) -> Option<BestQuote> {
        let (price, level) = entry?;
        let order_id = *level.orders.front()?;
        let order = self.arena.get(&order_id)?;
        Some(BestQuote {
            price: *price,
            order_id,
            agent_id: order.agent_id,
            remaining: order.remaining_quantity(),
        })
    }

    /// Execute `quantity` against the front order at the best ask, applying
    /// the fill to the maker order in the arena. Returns the maker order if
    /// it completed and left the book.
    pub fn fill_best_ask(&mut self, quantity: Quantity) -> Option<Order> {
        Self::fill_best(&mut self.asks, &mut self.arena, quantity, false)
    }

    /// Execute `quantity` against the front order at the best bid.
    pub fn fill_best_bid(&mut self, quantity: Quantity) -> Option<Order> {
        Self::fill_best(&mut self.bids, &mut self.arena, quantity, true)
    }

    fn fill_best(
        side: &mut BTreeMap<Price, PriceLevel>,
        arena: &mut HashMap<OrderId, Order>,
        quantity: Quantity,
        from_back: bool,
    ) -> Option<Order> {
        let price = if from_back {
            *side.keys().next_back()?
        } else {
            *side.keys().next()?
        };
        let level = side.get_mut(&price)?;
        let order_id = *level.orders.front()?;
        let order = arena.get_mut(&order_id)?;

        let executed = quantity.min(order.remaining_quantity());
        order.record_fill(price, executed);
        level.total_quantity = level.total_quantity.saturating_sub(executed);

        let completed = if order.is_filled() {
            level.orders.pop_front();
            arena.remove(&order_id)
        } else {
            None
        };
        if level.is_empty() {
            side.remove(&price);
        }
        completed
    }

    /// Update the last traded price.
    pub fn set_last_price(&mut self, price: Price) {
        self.last_price = Some(price);
    }

    /// Get the last traded price.
    pub fn last_price(&self) -> Option<Price> {
        self.last_price
    }

    /// Total bid quantity over the top `levels` price levels.
    pub fn bid_depth(&self, levels: usize) -> Quantity {
        self.bids
            .values()
            .rev()
            .take(levels)
            .map(|l| l.total_quantity)
            .sum()
    }

    /// Total ask quantity over the top `levels` price levels.
    pub fn ask_depth(&self, levels: usize) -> Quantity {
        self.asks
            .values()
            .take(levels)
            .map(|l| l.total_quantity)
            .sum()
    }

    /// Check if the book has any orders.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Number of price levels on the bid side.
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Number of price levels on the ask side.
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Total number of resting orders.
    pub fn order_count(&self) -> usize {
        self.arena.len()
    }

    /// Get a depth-limited snapshot of the current book state.
    pub fn snapshot(&self, timestamp: Timestamp, tick: Tick, depth: usize) -> BookSnapshot {
        let to_level = |(price, level): (&Price, &PriceLevel)| BookLevel {
            price: *price,
            quantity: level.total_quantity,
            order_count: level.order_count(),
        };

        BookSnapshot {
            symbol: self.symbol.clone(),
            bids: self.bids.iter().rev().take(depth).map(to_level).collect(),
            asks: self.asks.iter().take(depth).map(to_level).collect(),
            timestamp,
            tick,
        }
    }

    /// Audit structural consistency. A failure here means the book state is
    /// corrupt and the symbol's lane must halt.
    pub fn check_invariants(&self) -> Result<()> {
        let violation = |detail: String| SimError::InvariantViolation {
            symbol: self.symbol.clone(),
            detail,
        };

        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                return Err(violation(format!("crossed book: bid {} >= ask {}", bid, ask)));
            }
        }

        let mut queued = 0usize;
        for (side, levels) in [(OrderSide::Buy, &self.bids), (OrderSide::Sell, &self.asks)] {
            for (price, level) in levels {
                if level.is_empty() {
                    return Err(violation(format!("empty {} level at {}", side, price)));
                }
                let mut level_sum = Quantity::ZERO;
                for order_id in &level.orders {
                    let order = self.arena.get(order_id).ok_or_else(|| {
                        violation(format!("{} queued at {} missing from arena", order_id, price))
                    })?;
                    if order.side != side || order.limit_price() != Some(*price) {
                        return Err(violation(format!(
                            "{} queued at {} {} but carries {} {}",
                            order_id,
                            side,
                            price,
                            order.side,
                            order.order_type
                        )));
                    }
                    if order.remaining_quantity().is_zero() {
                        return Err(violation(format!("{} resting with zero remainder", order_id)));
                    }
                    level_sum += order.remaining_quantity();
                }
                if level_sum != level.total_quantity {
                    return Err(violation(format!(
                        "level {} {} total {} != order sum {}",
                        side, price, level.total_quantity, level_sum
                    )));
                }
                queued += level.order_count();
            }
        }

        if queued != self.arena.len() {
            return Err(violation(format!(
                "arena holds {} orders but levels queue {}",
                self.arena.len(),
                queued
            )));
        }

        Ok(())
    }
}
