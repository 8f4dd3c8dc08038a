//! Per-symbol simulation lane.
//!
//! A lane owns every mutable structure for one symbol: the order book, the
//! execution engine, the liquidity model, the price process, and the
//! analytics engine. All order flow for a symbol is serialized through its
//! lane, which is what lets the matching path stay lock-free.
//!
//! A lane that fails an internal consistency check is halted: the error is
//! logged, every later mutation returns `LaneHalted`, and reads keep
//! serving the snapshot published at the end of the last completed tick.

use analytics::{AnalyticsEngine, MarketAnalytics};
use sim_core::{
    ExecutionEngine, ExecutionReport, LiquidityModel, OrderBook, PriceProcess, Result, SimError,
};
use tracing::{debug, error};
use types::{
    BookSnapshot, MarketState, Order, OrderId, Price, Quantity, Symbol, Tick, Timestamp, Trade,
};

use crate::config::SimConfig;

pub(crate) struct SymbolLane {
    symbol: Symbol,
    book: OrderBook,
    execution: ExecutionEngine,
    liquidity: LiquidityModel,
    price: PriceProcess,
    analytics: AnalyticsEngine,
    /// Most recent trades, oldest first, bounded by `max_recent_trades`.
    recent_trades: Vec<Trade>,
    /// Published views from the last completed tick.
    snapshot: BookSnapshot,
    state: MarketState,
    halted: bool,
    snapshot_depth: usize,
    max_recent_trades: usize,
}

impl SymbolLane {
    pub(crate) fn new(symbol: Symbol, initial_price: Price, config: &SimConfig) -> Self {
        let liquidity = LiquidityModel::new(config.liquidity.clone());
        let price = PriceProcess::new(
            config.price_process.clone(),
            initial_price,
            config.sub_seed(&symbol, "price"),
        );
        let book = OrderBook::new(symbol.clone());
        let snapshot = book.snapshot(0, 0, config.snapshot_depth);
        let state = MarketState::initial(symbol.clone(), initial_price, liquidity.level());

        Self {
            symbol,
            book,
            execution: ExecutionEngine::new(config.execution.clone()),
            liquidity,
            price,
            analytics: AnalyticsEngine::new(config.analytics.clone()),
            recent_trades: Vec::new(),
            snapshot,
            state,
            halted: false,
            snapshot_depth: config.snapshot_depth,
            max_recent_trades: config.max_recent_trades,
        }
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted
    }

    /// Last published book snapshot.
    pub(crate) fn snapshot(&self) -> &BookSnapshot {
        &self.snapshot
    }

    /// Last published market state.
    pub(crate) fn market_state(&self) -> &MarketState {
        &self.state
    }

    /// Last recomputed analytics.
    pub(crate) fn analytics(&self) -> &MarketAnalytics {
        self.analytics.latest()
    }

    pub(crate) fn recent_trades(&self) -> &[Trade] {
        &self.recent_trades
    }

    /// Whether the order still rests on the book.
    pub(crate) fn contains_order(&self, order_id: OrderId) -> bool {
        self.book.contains(order_id)
    }

    /// Deterministic drift of the next price-discovery step, handed to
    /// informed traders as their signal source.
    pub(crate) fn drift_hint(&self) -> f64 {
        self.price.expected_drift()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.halted {
            Err(SimError::LaneHalted(self.symbol.clone()))
        } else {
            Ok(())
        }
    }

    fn halt(&mut self, violation: &SimError) {
        self.halted = true;
        error!(symbol = %self.symbol, %violation, "lane halted");
    }

    /// Run the lane's start-of-tick phases: price discovery (consuming the
    /// previous tick's order flow), liquidity recovery, then stop-order
    /// triggers against the new reference price. Returns the reports of any
    /// triggered stops so the caller can notify agents of their fills.
    pub(crate) fn begin_tick(
        &mut self,
        tick: Tick,
        timestamp: Timestamp,
    ) -> Result<Vec<ExecutionReport>> {
        self.ensure_live()?;

        let reference = self.price.step(&self.liquidity);
        self.book.set_last_price(reference);
        self.liquidity.decay_toward_base(1);

        let triggered = self.execution.check_triggers(reference);
        let mut reports = Vec::with_capacity(triggered.len());
        for order in triggered {
            let order_id = order.id;
            match self.submit(order, timestamp, tick) {
                Ok(report) => reports.push(report),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => debug!(%order_id, %err, "triggered stop not executable"),
            }
        }
        Ok(reports)
    }

    /// Route one order through execution and matching, then apply its
    /// market effects: analytics per trade, liquidity consumption, and
    /// signed order flow into the next price-discovery step.
    pub(crate) fn submit(
        &mut self,
        order: Order,
        timestamp: Timestamp,
        tick: Tick,
    ) -> Result<ExecutionReport> {
        self.ensure_live()?;

        let taker_side = order.side;
        // Mid quoted before the match, for effective-spread measurement.
        let mid = self.book.mid_price();

        let report = self
            .execution
            .submit(&mut self.book, &self.liquidity, order, timestamp, tick)?;

        if let Err(violation) = self.book.check_invariants() {
            self.halt(&violation);
            return Err(violation);
        }

        let executed: u64 = report.trades.iter().map(|t| t.quantity.raw()).sum();
        if executed > 0 {
            for trade in &report.trades {
                self.analytics
                    .record_trade(trade.price, trade.quantity, taker_side, mid);
            }
            self.liquidity.apply_consumption(Quantity(executed));
            self.price.record_flow(taker_side, Quantity(executed));

            self.recent_trades.extend(report.trades.iter().cloned());
            if self.recent_trades.len() > self.max_recent_trades {
                let excess = self.recent_trades.len() - self.max_recent_trades;
                self.recent_trades.drain(..excess);
            }
        }

        Ok(report)
    }

    pub(crate) fn cancel(&mut self, order_id: OrderId) -> Result<Order> {
        self.ensure_live()?;
        self.execution.cancel(&mut self.book, order_id)
    }

    /// End-of-tick: fold the tick's reference price into analytics, run the
    /// cadence-gated recompute, and publish fresh immutable views.
    pub(crate) fn finish_tick(&mut self, tick: Tick, timestamp: Timestamp) -> Result<()> {
        self.ensure_live()?;

        if let Err(violation) = self.book.check_invariants() {
            self.halt(&violation);
            return Err(violation);
        }

        self.analytics.record_price(self.price.price());
        let snapshot = self.book.snapshot(timestamp, tick, self.snapshot_depth);
        self.analytics.observe(tick, &snapshot);

        self.state = MarketState {
            symbol: self.symbol.clone(),
            last_price: self.price.price(),
            volatility: self.analytics.latest().realized_volatility.unwrap_or(0.0),
            momentum: self.price.momentum(),
            liquidity: self.liquidity.level(),
            timestamp,
            tick,
        };
        self.snapshot = snapshot;
        Ok(())
    }
}
