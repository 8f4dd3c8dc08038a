//! The tick orchestrator.
//!
//! [`MarketSim`] owns one lane per registered symbol plus the agent
//! population, and drives the per-tick sequence:
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 MarketSim.step()                 │
//! │                                                  │
//! │  1. Per lane: price discovery (consumes last     │
//! │     tick's order flow), liquidity recovery,      │
//! │     stop-order triggers                          │
//! │  2. Collect agent decisions from the published   │
//! │     views (order-preserving, optionally rayon)   │
//! │  3. Apply actions in ascending agent-id order:   │
//! │     cancellations first, then submissions        │
//! │  4. Notify both counterparties of every trade,   │
//! │     forward fills to subscribers                 │
//! │  5. Per lane: analytics recompute, publish       │
//! │     immutable snapshot + market state            │
//! │  6. Advance the clock                            │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Agents decide from borrowed read-only views and never touch live book
//! structures. Decision collection may run on rayon but preserves input
//! order, and actions are always applied sequentially in ascending
//! agent-id order, so a run is a pure function of configuration and seed.

use std::collections::{BTreeMap, HashMap};

use agents::{
    Agent, AgentAction, InformedTrader, InformedTraderConfig, MarketMaker, MarketMakerConfig,
    MomentumTrader, MomentumTraderConfig, NoiseTrader, NoiseTraderConfig, StrategyContext,
};
use analytics::MarketAnalytics;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use sim_core::{ExecutionReport, Result, SimError};
use tracing::{debug, info, warn};
use types::{
    AgentId, BookSnapshot, Cash, Fill, MarketState, Order, OrderId, OrderType, Price, Symbol,
    Tick, Timestamp, Trade,
};

use crate::config::SimConfig;
use crate::lane::SymbolLane;
use crate::parallel;

// =============================================================================
// Statistics & Summaries
// =============================================================================

/// Aggregate counters across the whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimStats {
    /// Ticks completed so far.
    pub tick: Tick,
    /// Orders accepted for processing (agent and external).
    pub total_orders: u64,
    /// Trades executed.
    pub total_trades: u64,
    /// Shares traded.
    pub total_volume: u64,
}

/// One agent's accounting at a point in time.
#[derive(Debug, Clone)]
pub struct AgentSummary {
    pub id: AgentId,
    pub name: String,
    pub symbol: Symbol,
    pub position: i64,
    pub cash: Cash,
    pub realized_pnl: Cash,
    /// Cash plus position marked at the symbol's last price.
    pub equity: Cash,
}

/// Borrowed per-symbol market view handed to agents during collection.
struct LaneView<'a> {
    snapshot: &'a BookSnapshot,
    state: &'a MarketState,
    trades: &'a [Trade],
    drift: f64,
}

// =============================================================================
// MarketSim
// =============================================================================

/// Multi-symbol, multi-agent market simulation.
pub struct MarketSim {
    config: SimConfig,
    /// BTreeMap so per-tick lane iteration has a stable order.
    lanes: BTreeMap<Symbol, SymbolLane>,
    agents: Vec<Mutex<Box<dyn Agent>>>,
    /// Symbol each agent trades, parallel to `agents`.
    agent_symbols: Vec<Symbol>,
    /// AgentId -> index into `agents`.
    agent_index: HashMap<AgentId, usize>,
    /// Agent indices in ascending id order; the stepping order.
    step_order: Vec<usize>,
    /// Symbol that owns each live (resting or parked) order id.
    order_routes: HashMap<OrderId, Symbol>,
    /// Subscriber to the fill stream, if any.
    fill_tx: Option<Sender<Fill>>,
    next_order_id: u64,
    next_agent_id: u64,
    tick: Tick,
    timestamp: Timestamp,
    stats: SimStats,
}

impl MarketSim {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            lanes: BTreeMap::new(),
            agents: Vec::new(),
            agent_symbols: Vec::new(),
            agent_index: HashMap::new(),
            step_order: Vec::new(),
            order_routes: HashMap::new(),
            fill_tx: None,
            next_order_id: 1,
            next_agent_id: 1,
            tick: 0,
            timestamp: 0,
            stats: SimStats::default(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.lanes.keys()
    }

    fn next_order_id(&mut self) -> OrderId {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        id
    }

    fn next_agent_id(&mut self) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        id
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new simulated instrument.
    pub fn add_symbol(&mut self, symbol: impl Into<Symbol>, initial_price: Price) -> Result<()> {
        let symbol = symbol.into();
        if self.lanes.contains_key(&symbol) {
            return Err(SimError::DuplicateSymbol(symbol));
        }
        let lane = SymbolLane::new(symbol.clone(), initial_price, &self.config);
        info!(%symbol, %initial_price, "symbol registered");
        self.lanes.insert(symbol, lane);
        Ok(())
    }

    /// Attach an agent to a registered symbol.
    pub fn add_agent(
        &mut self,
        symbol: impl Into<Symbol>,
        agent: Box<dyn Agent>,
    ) -> Result<AgentId> {
        let symbol = symbol.into();
        if !self.lanes.contains_key(&symbol) {
            return Err(SimError::UnknownSymbol(symbol));
        }

        let id = agent.id();
        let index = self.agents.len();
        self.agents.push(Mutex::new(agent));
        self.agent_symbols.push(symbol);
        self.agent_index.insert(id, index);

        // Stepping order is ascending agent id, independent of insertion.
        let mut order: Vec<(AgentId, usize)> = self
            .agent_index
            .iter()
            .map(|(&agent_id, &i)| (agent_id, i))
            .collect();
        order.sort_by_key(|&(agent_id, _)| agent_id);
        self.step_order = order.into_iter().map(|(_, i)| i).collect();

        Ok(id)
    }

    /// Spawn the configured agent population for one symbol, with ids and
    /// RNG seeds derived deterministically from the master seed.
    pub fn populate(&mut self, symbol: impl Into<Symbol>) -> Result<Vec<AgentId>> {
        let symbol = symbol.into();
        if !self.lanes.contains_key(&symbol) {
            return Err(SimError::UnknownSymbol(symbol));
        }

        let population = self.config.population.clone();
        let mut ids = Vec::with_capacity(population.total());

        for _ in 0..population.market_makers {
            let id = self.next_agent_id();
            let config = MarketMakerConfig {
                symbol: symbol.clone(),
                ..MarketMakerConfig::default()
            };
            ids.push(self.add_agent(symbol.clone(), Box::new(MarketMaker::new(id, config)))?);
        }
        for n in 0..population.noise_traders {
            let id = self.next_agent_id();
            let config = NoiseTraderConfig {
                symbol: symbol.clone(),
                ..NoiseTraderConfig::default()
            };
            let seed = self.config.sub_seed(&symbol, &format!("noise-{n}"));
            ids.push(self.add_agent(symbol.clone(), Box::new(NoiseTrader::new(id, config, seed)))?);
        }
        for n in 0..population.informed_traders {
            let id = self.next_agent_id();
            let config = InformedTraderConfig {
                symbol: symbol.clone(),
                ..InformedTraderConfig::default()
            };
            let seed = self.config.sub_seed(&symbol, &format!("informed-{n}"));
            ids.push(self.add_agent(
                symbol.clone(),
                Box::new(InformedTrader::new(id, config, seed)),
            )?);
        }
        for _ in 0..population.momentum_traders {
            let id = self.next_agent_id();
            let config = MomentumTraderConfig {
                symbol: symbol.clone(),
                ..MomentumTraderConfig::default()
            };
            ids.push(self.add_agent(symbol.clone(), Box::new(MomentumTrader::new(id, config)))?);
        }

        info!(%symbol, agents = ids.len(), "population spawned");
        Ok(ids)
    }

    // =========================================================================
    // External Order Interface
    // =========================================================================

    /// Submit an order from outside the agent population.
    ///
    /// The order executes immediately against its symbol's lane; external
    /// submissions are serialized by `&mut self`. Fails on unknown symbol
    /// or a malformed order.
    pub fn submit_order(&mut self, order: Order) -> Result<OrderId> {
        let report = self.route_order(order)?;
        let id = report.order_id();
        let mut trades = Vec::new();
        self.process_report(report, &mut trades);
        Ok(id)
    }

    /// Cancel a live order by id alone; the id is routed to its symbol's
    /// lane. Terminal and unknown orders report `OrderNotFound`.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<Order> {
        let Some(symbol) = self.order_routes.get(&order_id).cloned() else {
            return Err(SimError::OrderNotFound(order_id));
        };
        let lane = self
            .lanes
            .get_mut(&symbol)
            .ok_or(SimError::OrderNotFound(order_id))?;

        match lane.cancel(order_id) {
            Ok(order) => {
                self.order_routes.remove(&order_id);
                Ok(order)
            }
            Err(err) => {
                // A stale route means the order completed earlier.
                if matches!(err, SimError::OrderNotFound(_)) {
                    self.order_routes.remove(&order_id);
                }
                Err(err)
            }
        }
    }

    /// Subscribe to the fill stream. Fills are delivered in execution
    /// order; dropping the receiver unsubscribes.
    pub fn fill_events(&mut self) -> Receiver<Fill> {
        let (tx, rx) = unbounded();
        self.fill_tx = Some(tx);
        rx
    }

    // =========================================================================
    // Read-Only Queries
    // =========================================================================

    fn lane(&self, symbol: &str) -> Result<&SymbolLane> {
        self.lanes
            .get(symbol)
            .ok_or_else(|| SimError::UnknownSymbol(symbol.to_string()))
    }

    /// Book snapshot from the last completed tick, truncated to `depth`
    /// levels per side.
    pub fn get_order_book(&self, symbol: &str, depth: usize) -> Result<BookSnapshot> {
        let mut snapshot = self.lane(symbol)?.snapshot().clone();
        snapshot.bids.truncate(depth);
        snapshot.asks.truncate(depth);
        Ok(snapshot)
    }

    /// Market state from the last completed tick.
    pub fn get_market_state(&self, symbol: &str) -> Result<MarketState> {
        Ok(self.lane(symbol)?.market_state().clone())
    }

    /// Analytics from the last cadence-gated recompute.
    pub fn get_analytics(&self, symbol: &str) -> Result<MarketAnalytics> {
        Ok(self.lane(symbol)?.analytics().clone())
    }

    /// Accounting summary for every agent, in ascending id order.
    pub fn agent_summaries(&self) -> Vec<AgentSummary> {
        let raw = parallel::map_mutex_slice_ref(
            &self.agents,
            |agent| {
                (
                    agent.id(),
                    agent.name().to_string(),
                    agent.position(),
                    agent.cash(),
                    agent.realized_pnl(),
                )
            },
            self.config.force_sequential,
        );

        let mut summaries: Vec<AgentSummary> = raw
            .into_iter()
            .zip(&self.agent_symbols)
            .map(|((id, name, position, cash, realized_pnl), symbol)| {
                let last_price = self
                    .lanes
                    .get(symbol)
                    .map(|lane| lane.market_state().last_price)
                    .unwrap_or(Price::ZERO);
                let equity = cash + Cash::from_float(position as f64 * last_price.to_float());
                AgentSummary {
                    id,
                    name,
                    symbol: symbol.clone(),
                    position,
                    cash,
                    realized_pnl,
                    equity,
                }
            })
            .collect();
        summaries.sort_by_key(|s| s.id);
        summaries
    }

    // =========================================================================
    // Tick Loop
    // =========================================================================

    /// Advance the simulation by one tick. Returns the tick's trades.
    pub fn step(&mut self) -> Vec<Trade> {
        let (tick, timestamp) = (self.tick, self.timestamp);
        let mut tick_trades = Vec::new();

        // Phase 1: per-lane price discovery, liquidity recovery, stop
        // triggers. Halted lanes sit out but keep serving stale reads.
        let mut trigger_reports = Vec::new();
        for lane in self.lanes.values_mut() {
            if lane.is_halted() {
                continue;
            }
            match lane.begin_tick(tick, timestamp) {
                Ok(mut reports) => trigger_reports.append(&mut reports),
                Err(err) => warn!(%err, "lane failed at tick start"),
            }
        }
        for report in trigger_reports {
            self.process_report(report, &mut tick_trades);
        }

        // Phase 2: agent decisions against the published views.
        let actions = self.collect_agent_actions(tick, timestamp);

        // Phase 3: apply in ascending agent-id order, cancellations first.
        for (index, action) in actions {
            for order_id in action.cancellations {
                if let Err(err) = self.cancel_order(order_id) {
                    debug!(%order_id, %err, "agent cancellation skipped");
                }
            }
            for order in action.orders {
                match self.route_order(order) {
                    Ok(report) => {
                        self.notify_resting(index, &report);
                        self.process_report(report, &mut tick_trades);
                    }
                    Err(err) => debug!(%err, "agent order not accepted"),
                }
            }
        }

        // Phase 4: analytics recompute and snapshot publication.
        for lane in self.lanes.values_mut() {
            if lane.is_halted() {
                continue;
            }
            if let Err(err) = lane.finish_tick(tick, timestamp) {
                warn!(%err, "lane failed at tick end");
            }
        }

        self.tick += 1;
        self.timestamp += 1;
        self.stats.tick = self.tick;
        tick_trades
    }

    /// Run the simulation for a given number of ticks. Returns all trades.
    pub fn run(&mut self, ticks: u64) -> Vec<Trade> {
        (0..ticks).fold(Vec::new(), |mut all_trades, _| {
            all_trades.extend(self.step());
            all_trades
        })
    }

    /// Call `on_tick` on every agent with its symbol's published view.
    ///
    /// Collection preserves `step_order` regardless of execution mode, and
    /// each agent owns its RNG, so parallel and sequential collection
    /// produce identical decision sequences.
    fn collect_agent_actions(&self, tick: Tick, timestamp: Timestamp) -> Vec<(usize, AgentAction)> {
        let views: HashMap<&Symbol, LaneView<'_>> = self
            .lanes
            .iter()
            .map(|(symbol, lane)| {
                (
                    symbol,
                    LaneView {
                        snapshot: lane.snapshot(),
                        state: lane.market_state(),
                        trades: lane.recent_trades(),
                        drift: lane.drift_hint(),
                    },
                )
            })
            .collect();

        let agents = &self.agents;
        let symbols = &self.agent_symbols;
        let results = parallel::map_indices(
            &self.step_order,
            |index| {
                let view = &views[&symbols[index]];
                let ctx = StrategyContext::new(
                    tick,
                    timestamp,
                    view.snapshot,
                    view.state,
                    view.trades,
                    view.drift,
                );
                let mut agent = agents[index].lock();
                (index, agent.id(), agent.on_tick(&ctx))
            },
            self.config.force_sequential,
        );

        results
            .into_iter()
            .filter_map(|(index, agent_id, outcome)| match outcome {
                Ok(action) if action.is_empty() => None,
                Ok(action) => Some((index, action)),
                Err(err) => {
                    // A failed decision is isolated to this agent and tick.
                    warn!(%agent_id, %err, "agent decision failed");
                    None
                }
            })
            .collect()
    }

    /// Assign an id and timestamp, then run the order through its lane.
    fn route_order(&mut self, mut order: Order) -> Result<ExecutionReport> {
        if !self.lanes.contains_key(&order.symbol) {
            return Err(SimError::UnknownSymbol(order.symbol));
        }
        order.id = self.next_order_id();
        order.timestamp = self.timestamp;

        let (timestamp, tick) = (self.timestamp, self.tick);
        let Some(lane) = self.lanes.get_mut(&order.symbol) else {
            return Err(SimError::UnknownSymbol(order.symbol));
        };
        let report = lane.submit(order, timestamp, tick)?;
        self.stats.total_orders += 1;
        Ok(report)
    }

    /// Tell the owning agent its limit order now rests on the book.
    fn notify_resting(&self, owner_index: usize, report: &ExecutionReport) {
        let order = &report.order;
        let rests = matches!(order.order_type, OrderType::Limit { .. })
            && order.is_active()
            && !order.remaining_quantity().is_zero();
        if rests {
            self.agents[owner_index]
                .lock()
                .on_order_resting(order.id, order);
        }
    }

    /// Apply one execution report's side effects: order routing, the fill
    /// stream, counterparty notification, and run statistics.
    fn process_report(&mut self, report: ExecutionReport, tick_trades: &mut Vec<Trade>) {
        let order = &report.order;
        if order.is_active() && !order.remaining_quantity().is_zero() {
            self.order_routes.insert(order.id, order.symbol.clone());
        } else {
            self.order_routes.remove(&order.id);
        }

        let mut disconnected = false;
        if let Some(tx) = &self.fill_tx {
            for fill in &report.fills {
                if tx.send(fill.clone()).is_err() {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            self.fill_tx = None;
        }

        // Maker orders completed by these trades no longer need routes.
        let mut completed = Vec::new();
        if let Some(lane) = self.lanes.get(&order.symbol) {
            for trade in &report.trades {
                for order_id in [trade.buyer_order_id, trade.seller_order_id] {
                    if !lane.contains_order(order_id) {
                        completed.push(order_id);
                    }
                }
            }
        }
        for order_id in completed {
            self.order_routes.remove(&order_id);
        }

        for trade in &report.trades {
            self.stats.total_trades += 1;
            self.stats.total_volume += trade.quantity.raw();
            // One notification per counterparty; a self-trade notifies once
            // and the handler applies both legs.
            self.notify_fill(trade.buyer_id, trade);
            if trade.seller_id != trade.buyer_id {
                self.notify_fill(trade.seller_id, trade);
            }
        }
        tick_trades.extend(report.trades);
    }

    fn notify_fill(&self, agent_id: AgentId, trade: &Trade) {
        if let Some(&index) = self.agent_index.get(&agent_id) {
            self.agents[index].lock().on_fill(trade);
        }
    }
}
