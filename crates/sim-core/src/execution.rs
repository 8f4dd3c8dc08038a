//! Execution engine: the single entry point for incoming orders.
//!
//! Validates orders, parks untriggered stop orders, computes the slippage
//! offset applied to taker fills, routes marketable quantity through the
//! matching engine, rests limit remainders, and applies the configured
//! policy to unfilled market-order quantity. Cancellation is
//! idempotent-negative: cancelling a terminal or unknown order returns
//! `OrderNotFound` without touching the book.

use std::collections::HashMap;

use smallvec::SmallVec;
use tracing::debug;
use types::{
    ExecutionConfig, Fill, InvalidOrder, Order, OrderId, OrderSide, OrderStatus, OrderType, Price,
    SlippageModel, Tick, Timestamp, Trade, UnfilledPolicy,
};

use crate::error::{Result, SimError};
use crate::liquidity::LiquidityModel;
use crate::matching::{MatchParams, MatchingEngine};
use crate::order_book::OrderBook;

/// Outcome of one submission: the order's post-submit state plus what it
/// executed.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// The order as of the end of the submission pass. If quantity rested,
    /// this mirrors the resting copy in the book.
    pub order: Order,
    pub trades: Vec<Trade>,
    pub fills: SmallVec<[Fill; 8]>,
}

impl ExecutionReport {
    pub fn order_id(&self) -> OrderId {
        self.order.id
    }

    pub fn status(&self) -> OrderStatus {
        self.order.status
    }
}

/// Per-symbol execution engine.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    config: ExecutionConfig,
    matching: MatchingEngine,
    /// Stop and stop-limit orders waiting for their trigger.
    pending_stops: HashMap<OrderId, Order>,
}

impl ExecutionEngine {
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            matching: MatchingEngine::new(),
            pending_stops: HashMap::new(),
        }
    }

    /// Submit an order against the book.
    ///
    /// Stop orders are parked untriggered and produce an empty report.
    /// Everything else matches immediately; limit remainders rest, market
    /// remainders follow the configured [`UnfilledPolicy`].
    pub fn submit(
        &mut self,
        book: &mut OrderBook,
        liquidity: &LiquidityModel,
        mut order: Order,
        timestamp: Timestamp,
        tick: Tick,
    ) -> Result<ExecutionReport> {
        if order.remaining_quantity().is_zero() {
            return Err(SimError::InvalidOrder(InvalidOrder::ZeroQuantity));
        }
        self.snap_to_grid(&mut order);

        if order.order_type.is_stop() {
            debug!(order_id = %order.id, trigger = ?order.trigger_price(), "parking stop order");
            self.pending_stops.insert(order.id, order.clone());
            return Ok(ExecutionReport {
                order,
                trades: Vec::new(),
                fills: SmallVec::new(),
            });
        }

        // Latency is a logical delay on recorded timestamps, never a wait.
        let effective_timestamp = timestamp + self.config.latency_ticks;
        let params = MatchParams {
            timestamp: effective_timestamp,
            tick,
            taker_offset: self.taker_offset(book, liquidity, &order),
        };

        let result = self.matching.match_order(book, &mut order, params);

        if !result.remaining_quantity.is_zero() {
            match order.order_type {
                OrderType::Limit { .. } => {
                    // Rest the remainder; `add` moves Pending to Open.
                    book.add(order.clone())?;
                    if let Some(resting) = book.order(order.id) {
                        order.status = resting.status;
                    }
                }
                OrderType::Market => match self.config.unfilled_policy {
                    UnfilledPolicy::Reject => {
                        if result.has_trades() {
                            order.status = OrderStatus::Cancelled;
                        } else {
                            order.status = OrderStatus::Rejected;
                        }
                    }
                    // Remainder is simply dropped; the partial status stands.
                    UnfilledPolicy::LeaveUnfilled => {}
                },
                OrderType::Stop { .. } | OrderType::StopLimit { .. } => {}
            }
        }

        debug!(
            order_id = %order.id,
            status = ?order.status,
            trades = result.trades.len(),
            remaining = %result.remaining_quantity,
            "order submitted"
        );

        Ok(ExecutionReport {
            order,
            trades: result.trades,
            fills: result.fills,
        })
    }

    /// Cancel a resting or parked order.
    ///
    /// Returns the cancelled order, or `OrderNotFound` if the id is unknown
    /// or already terminal. Never mutates book quantities on the error path.
    pub fn cancel(&mut self, book: &mut OrderBook, order_id: OrderId) -> Result<Order> {
        if let Some(mut order) = self.pending_stops.remove(&order_id) {
            order.status = OrderStatus::Cancelled;
            return Ok(order);
        }

        let mut order = book.remove(order_id)?;
        order.status = OrderStatus::Cancelled;
        Ok(order)
    }

    /// Release stop orders whose trigger the reference price has crossed:
    /// buys trigger at or above, sells at or below. Triggered stops convert
    /// to market orders and stop-limits to limit orders, returned in id
    /// order for the caller to submit.
    pub fn check_triggers(&mut self, reference: Price) -> Vec<Order> {
        let mut triggered_ids: Vec<OrderId> = self
            .pending_stops
            .values()
            .filter(|order| Self::triggered(order, reference))
            .map(|order| order.id)
            .collect();
        triggered_ids.sort_unstable();

        triggered_ids
            .into_iter()
            .filter_map(|id| self.pending_stops.remove(&id))
            .map(|mut order| {
                order.order_type = match order.order_type {
                    OrderType::Stop { .. } => OrderType::Market,
                    OrderType::StopLimit { price, .. } => OrderType::Limit { price },
                    other => other,
                };
                debug!(order_id = %order.id, "stop order triggered");
                order
            })
            .collect()
    }

    /// Whether any stop orders are still parked.
    pub fn has_pending_stops(&self) -> bool {
        !self.pending_stops.is_empty()
    }

    /// Round limit and trigger prices to the nearest multiple of the
    /// configured tick size. Market orders carry no price to snap.
    fn snap_to_grid(&self, order: &mut Order) {
        let tick = self.config.tick_size;
        order.order_type = match order.order_type {
            OrderType::Market => OrderType::Market,
            OrderType::Limit { price } => OrderType::Limit {
                price: price.round_to_tick(tick),
            },
            OrderType::Stop { trigger } => OrderType::Stop {
                trigger: trigger.round_to_tick(tick),
            },
            OrderType::StopLimit { trigger, price } => OrderType::StopLimit {
                trigger: trigger.round_to_tick(tick),
                price: price.round_to_tick(tick),
            },
        };
    }

    fn triggered(order: &Order, reference: Price) -> bool {
        match order.trigger_price() {
            Some(trigger) => match order.side {
                OrderSide::Buy => reference >= trigger,
                OrderSide::Sell => reference <= trigger,
            },
            None => false,
        }
    }

    /// Per-share execution-cost offset from the configured slippage curve,
    /// in size relative to current liquidity.
    fn taker_offset(&self, book: &OrderBook, liquidity: &LiquidityModel, order: &Order) -> Price {
        let Some(reference) = book.mid_price().or(order.limit_price()) else {
            return Price::ZERO;
        };
        let ratio = order.remaining_quantity().raw() as f64 / liquidity.level().max(1.0);
        let curve = match self.config.slippage_model {
            SlippageModel::Linear => ratio,
            SlippageModel::SquareRoot => ratio.sqrt(),
            SlippageModel::Quadratic => ratio * ratio,
        };
        let fraction = self.config.slippage_coefficient * curve;
        Price((reference.raw() as f64 * fraction).round() as i64)
    }
}
