//! Matching engine implementing price-time priority.
//!
//! Incoming orders cross against the contra side of the book, best price
//! first, FIFO within a level. Every match produces one [`Trade`] plus a
//! taker fill and a maker fill. The engine never rests remainders itself;
//! the execution engine decides what happens to unmatched quantity.

use smallvec::SmallVec;
use types::{
    Fill, FillId, LiquidityRole, Order, OrderSide, OrderStatus, Price, Quantity, Tick, Timestamp,
    Trade, TradeId,
};

use crate::order_book::{BestQuote, OrderBook};

/// Per-call matching parameters supplied by the execution engine.
#[derive(Debug, Clone, Copy)]
pub struct MatchParams {
    /// Timestamp recorded on trades and fills (latency already applied).
    pub timestamp: Timestamp,
    /// Simulation tick of the matching pass.
    pub tick: Tick,
    /// Per-share execution-cost magnitude added to taker fill prices:
    /// buys pay up, sells receive less. Zero disables slippage.
    pub taker_offset: Price,
}

impl MatchParams {
    /// Parameters with no slippage adjustment.
    pub fn at(timestamp: Timestamp, tick: Tick) -> Self {
        Self {
            timestamp,
            tick,
            taker_offset: Price::ZERO,
        }
    }
}

/// Result of one matching pass for an incoming order.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Trades in execution order.
    pub trades: Vec<Trade>,
    /// Taker and maker fills, two per trade.
    pub fills: SmallVec<[Fill; 8]>,
    /// Status of the incoming order after the pass.
    pub status: OrderStatus,
    /// Unmatched quantity of the incoming order.
    pub remaining_quantity: Quantity,
}

impl MatchResult {
    /// Check if any trades occurred.
    pub fn has_trades(&self) -> bool {
        !self.trades.is_empty()
    }

    /// Total quantity matched in this pass.
    pub fn filled_quantity(&self) -> Quantity {
        self.trades.iter().map(|t| t.quantity).sum()
    }

    /// Number of price levels crossed.
    pub fn levels_crossed(&self) -> usize {
        self.trades
            .iter()
            .map(|t| t.price)
            .collect::<std::collections::BTreeSet<_>>()
            .len()
    }
}

/// Matching engine for a single symbol's order book.
///
/// Owns the trade/fill id counters so ids are unique and monotonic within
/// a symbol lane.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    next_trade_id: u64,
    next_fill_id: u64,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngine {
    /// Create a new matching engine.
    pub fn new() -> Self {
        Self {
            next_trade_id: 1,
            next_fill_id: 1,
        }
    }

    fn next_trade_id(&mut self) -> TradeId {
        let id = TradeId(self.next_trade_id);
        self.next_trade_id += 1;
        id
    }

    fn next_fill_id(&mut self) -> FillId {
        let id = FillId(self.next_fill_id);
        self.next_fill_id += 1;
        id
    }

    /// Match an incoming order against the book.
    ///
    /// Crosses levels while the incoming order's price admits the contra
    /// side's best price (always, for market orders). Updates the incoming
    /// order's fill accumulation and status in place; maker orders are
    /// updated through the book. Unmatched remainder is left on the order
    /// for the caller to rest, reject, or drop.
    pub fn match_order(
        &mut self,
        book: &mut OrderBook,
        order: &mut Order,
        params: MatchParams,
    ) -> MatchResult {
        let mut result = MatchResult {
            remaining_quantity: order.remaining_quantity(),
            status: order.status,
            ..Default::default()
        };

        while !result.remaining_quantity.is_zero() {
            let quote = match order.side {
                OrderSide::Buy => book.peek_best_ask(),
                OrderSide::Sell => book.peek_best_bid(),
            };
            let Some(quote) = quote else { break };

            if !Self::price_admits(order, quote.price) {
                break;
            }

            let quantity = result.remaining_quantity.min(quote.remaining);
            self.execute(book, order, &quote, quantity, params, &mut result);
            result.remaining_quantity = order.remaining_quantity();
        }

        result.status = order.status;
        result
    }

    /// Whether the incoming order's price constraint allows crossing at
    /// `level_price`.
    fn price_admits(order: &Order, level_price: Price) -> bool {
        match order.limit_price() {
            None => true,
            Some(limit) => match order.side {
                OrderSide::Buy => level_price <= limit,
                OrderSide::Sell => level_price >= limit,
            },
        }
    }

    fn execute(
        &mut self,
        book: &mut OrderBook,
        order: &mut Order,
        quote: &BestQuote,
        quantity: Quantity,
        params: MatchParams,
        result: &mut MatchResult,
    ) {
        let book_price = quote.price;
        let taker_price = Self::effective_taker_price(order.side, book_price, params.taker_offset);

        let (buyer_id, seller_id, buyer_order_id, seller_order_id) = match order.side {
            OrderSide::Buy => (order.agent_id, quote.agent_id, order.id, quote.order_id),
            OrderSide::Sell => (quote.agent_id, order.agent_id, quote.order_id, order.id),
        };

        result.trades.push(Trade {
            id: self.next_trade_id(),
            symbol: book.symbol().to_string(),
            buyer_id,
            seller_id,
            buyer_order_id,
            seller_order_id,
            price: book_price,
            quantity,
            timestamp: params.timestamp,
            tick: params.tick,
        });

        result.fills.push(Fill {
            id: self.next_fill_id(),
            order_id: order.id,
            agent_id: order.agent_id,
            symbol: book.symbol().to_string(),
            side: order.side,
            price: taker_price,
            book_price,
            quantity,
            role: LiquidityRole::Taker,
            timestamp: params.timestamp,
            tick: params.tick,
        });
        result.fills.push(Fill {
            id: self.next_fill_id(),
            order_id: quote.order_id,
            agent_id: quote.agent_id,
            symbol: book.symbol().to_string(),
            side: order.side.opposite(),
            price: book_price,
            book_price,
            quantity,
            role: LiquidityRole::Maker,
            timestamp: params.timestamp,
            tick: params.tick,
        });

        order.record_fill(taker_price, quantity);
        match order.side {
            OrderSide::Buy => book.fill_best_ask(quantity),
            OrderSide::Sell => book.fill_best_bid(quantity),
        };
        book.set_last_price(book_price);
    }

    /// Taker price after the execution-cost offset, kept strictly positive.
    fn effective_taker_price(side: OrderSide, book_price: Price, offset: Price) -> Price {
        let adjusted = match side {
            OrderSide::Buy => book_price + offset,
            OrderSide::Sell => book_price - offset,
        };
        if adjusted.is_positive() {
            adjusted
        } else {
            Price(1)
        }
    }

    /// Check whether an incoming order would cross (without executing).
    pub fn would_match(&self, book: &OrderBook, order: &Order) -> bool {
        let best = match order.side {
            OrderSide::Buy => book.best_ask(),
            OrderSide::Sell => book.best_bid(),
        };
        match best {
            Some(price) => Self::price_admits(order, price),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{AgentId, OrderId};

    fn make_limit_order(id: u64, agent_id: u64, side: OrderSide, price: f64, quantity: u64) -> Order {
        let mut order = Order::limit(
            AgentId(agent_id),
            "TEST",
            side,
            Price::from_float(price),
            Quantity(quantity),
        )
        .unwrap();
        order.id = OrderId(id);
        order
    }

    fn make_market_order(id: u64, agent_id: u64, side: OrderSide, quantity: u64) -> Order {
        let mut order = Order::market(AgentId(agent_id), "TEST", side, Quantity(quantity)).unwrap();
        order.id = OrderId(id);
        order
    }

    #[test]
    fn test_no_match_empty_book() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        let mut order = make_limit_order(1, 1, OrderSide::Buy, 100.0, 50);

        let result = engine.match_order(&mut book, &mut order, MatchParams::at(0, 0));

        assert!(!result.has_trades());
        assert_eq!(result.remaining_quantity, 50);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_exact_match() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 100.0, 50)).unwrap();

        let mut buy = make_limit_order(2, 2, OrderSide::Buy, 100.0, 50);
        let result = engine.match_order(&mut book, &mut buy, MatchParams::at(1000, 1));

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.remaining_quantity, 0);
        assert_eq!(buy.status, OrderStatus::Filled);

        let trade = &result.trades[0];
        assert_eq!(trade.quantity, 50);
        assert_eq!(trade.price, Price::from_float(100.0));
        assert_eq!(trade.buyer_id, AgentId(2));
        assert_eq!(trade.seller_id, AgentId(1));

        assert!(book.is_empty());
    }

    #[test]
    fn test_partial_match_leaves_remainder_on_order() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 100.0, 30)).unwrap();

        let mut buy = make_limit_order(2, 2, OrderSide::Buy, 100.0, 50);
        let result = engine.match_order(&mut book, &mut buy, MatchParams::at(1000, 1));

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.remaining_quantity, 20);
        assert_eq!(buy.status, OrderStatus::PartiallyFilled);
        assert_eq!(buy.filled_quantity, 30);
        assert!(book.is_empty());
    }

    #[test]
    fn test_match_multiple_levels_best_price_first() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 101.0, 30)).unwrap();
        book.add(make_limit_order(2, 2, OrderSide::Sell, 100.0, 20)).unwrap();
        book.add(make_limit_order(3, 3, OrderSide::Sell, 102.0, 50)).unwrap();

        let mut buy = make_limit_order(4, 4, OrderSide::Buy, 102.0, 60);
        let result = engine.match_order(&mut book, &mut buy, MatchParams::at(1000, 1));

        assert_eq!(result.trades.len(), 3);
        assert_eq!(result.remaining_quantity, 0);
        assert_eq!(result.trades[0].price, Price::from_float(100.0));
        assert_eq!(result.trades[0].quantity, 20);
        assert_eq!(result.trades[1].price, Price::from_float(101.0));
        assert_eq!(result.trades[1].quantity, 30);
        assert_eq!(result.trades[2].price, Price::from_float(102.0));
        assert_eq!(result.trades[2].quantity, 10);
        assert_eq!(result.levels_crossed(), 3);

        assert_eq!(book.ask_depth(10), 40);
    }

    #[test]
    fn test_time_priority_within_level() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 100.0, 30)).unwrap();
        book.add(make_limit_order(2, 2, OrderSide::Sell, 100.0, 30)).unwrap();

        let mut buy = make_limit_order(3, 3, OrderSide::Buy, 100.0, 40);
        let result = engine.match_order(&mut book, &mut buy, MatchParams::at(1000, 1));

        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].seller_id, AgentId(1));
        assert_eq!(result.trades[0].quantity, 30);
        assert_eq!(result.trades[1].seller_id, AgentId(2));
        assert_eq!(result.trades[1].quantity, 10);
    }

    #[test]
    fn test_limit_price_respected() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 100.0, 50)).unwrap();
        book.add(make_limit_order(2, 2, OrderSide::Sell, 105.0, 50)).unwrap();

        let mut buy = make_limit_order(3, 3, OrderSide::Buy, 102.0, 100);
        let result = engine.match_order(&mut book, &mut buy, MatchParams::at(1000, 1));

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].price, Price::from_float(100.0));
        assert_eq!(result.remaining_quantity, 50);
    }

    #[test]
    fn test_market_sell_hits_best_bids_first() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Buy, 100.0, 30)).unwrap();
        book.add(make_limit_order(2, 2, OrderSide::Buy, 95.0, 30)).unwrap();

        let mut sell = make_market_order(3, 3, OrderSide::Sell, 40);
        let result = engine.match_order(&mut book, &mut sell, MatchParams::at(1000, 1));

        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].price, Price::from_float(100.0));
        assert_eq!(result.trades[0].quantity, 30);
        assert_eq!(result.trades[1].price, Price::from_float(95.0));
        assert_eq!(result.trades[1].quantity, 10);
    }

    #[test]
    fn test_maker_and_taker_fills_produced() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 100.0, 30)).unwrap();

        let mut buy = make_limit_order(2, 2, OrderSide::Buy, 100.0, 30);
        let result = engine.match_order(&mut book, &mut buy, MatchParams::at(1000, 1));

        assert_eq!(result.fills.len(), 2);
        let taker = &result.fills[0];
        let maker = &result.fills[1];

        assert_eq!(taker.role, LiquidityRole::Taker);
        assert_eq!(taker.order_id, OrderId(2));
        assert_eq!(taker.side, OrderSide::Buy);

        assert_eq!(maker.role, LiquidityRole::Maker);
        assert_eq!(maker.order_id, OrderId(1));
        assert_eq!(maker.side, OrderSide::Sell);
        assert_eq!(maker.quantity, taker.quantity);
        assert_eq!(maker.book_price, taker.book_price);
    }

    #[test]
    fn test_taker_offset_applied_to_taker_only() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 100.0, 50)).unwrap();

        let mut buy = make_market_order(2, 2, OrderSide::Buy, 50);
        let params = MatchParams {
            timestamp: 1000,
            tick: 1,
            taker_offset: Price::from_float(0.05),
        };
        let result = engine.match_order(&mut book, &mut buy, params);

        let taker = &result.fills[0];
        assert_eq!(taker.price, Price::from_float(100.05));
        assert_eq!(taker.book_price, Price::from_float(100.0));
        assert_eq!(taker.slippage(), Price::from_float(0.05));

        let maker = &result.fills[1];
        assert_eq!(maker.price, Price::from_float(100.0));

        // Trades stay at the book price
        assert_eq!(result.trades[0].price, Price::from_float(100.0));
        // The order's own accumulation reflects the effective cost
        assert_eq!(buy.avg_fill_price(), Some(Price::from_float(100.05)));
    }

    #[test]
    fn test_maker_accumulates_across_matches() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 100.0, 100)).unwrap();

        let mut buy_a = make_market_order(2, 2, OrderSide::Buy, 40);
        engine.match_order(&mut book, &mut buy_a, MatchParams::at(1000, 1));

        let maker = book.order(OrderId(1)).unwrap();
        assert_eq!(maker.status, OrderStatus::PartiallyFilled);
        assert_eq!(maker.filled_quantity, 40);

        let mut buy_b = make_market_order(3, 3, OrderSide::Buy, 60);
        engine.match_order(&mut book, &mut buy_b, MatchParams::at(1001, 2));

        // Maker completed and left the book
        assert!(book.order(OrderId(1)).is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn test_self_trade_allowed() {
        // No self-trade prevention: an agent's order can cross its own quote
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 100.0, 50)).unwrap();

        let mut buy = make_limit_order(2, 1, OrderSide::Buy, 100.0, 50);
        let result = engine.match_order(&mut book, &mut buy, MatchParams::at(1000, 1));

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].buyer_id, result.trades[0].seller_id);
    }

    #[test]
    fn test_would_match() {
        let mut book = OrderBook::new("TEST");
        let engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 100.0, 50)).unwrap();
        book.add(make_limit_order(2, 2, OrderSide::Buy, 98.0, 50)).unwrap();

        assert!(engine.would_match(&book, &make_limit_order(3, 3, OrderSide::Buy, 100.0, 10)));
        assert!(!engine.would_match(&book, &make_limit_order(4, 4, OrderSide::Buy, 99.0, 10)));
        assert!(engine.would_match(&book, &make_market_order(5, 5, OrderSide::Buy, 10)));
        assert!(engine.would_match(&book, &make_limit_order(6, 6, OrderSide::Sell, 98.0, 10)));
        assert!(!engine.would_match(&book, &make_limit_order(7, 7, OrderSide::Sell, 99.0, 10)));
    }

    #[test]
    fn test_trade_and_fill_ids_increment() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Sell, 100.0, 100)).unwrap();
        book.add(make_limit_order(2, 2, OrderSide::Sell, 101.0, 100)).unwrap();

        let mut buy = make_limit_order(3, 3, OrderSide::Buy, 101.0, 150);
        let result = engine.match_order(&mut book, &mut buy, MatchParams::at(1000, 1));

        assert_eq!(result.trades[0].id, TradeId(1));
        assert_eq!(result.trades[1].id, TradeId(2));
        assert_eq!(result.fills[0].id, FillId(1));
        assert_eq!(result.fills[3].id, FillId(4));
    }

    #[test]
    fn test_no_crossed_book_after_pass() {
        let mut book = OrderBook::new("TEST");
        let mut engine = MatchingEngine::new();
        book.add(make_limit_order(1, 1, OrderSide::Buy, 99.0, 50)).unwrap();
        book.add(make_limit_order(2, 2, OrderSide::Sell, 101.0, 50)).unwrap();

        // Marketable limit that exhausts the ask level and rests nothing here
        let mut buy = make_limit_order(3, 3, OrderSide::Buy, 101.0, 80);
        engine.match_order(&mut book, &mut buy, MatchParams::at(1000, 1));

        book.check_invariants().unwrap();
    }
}
