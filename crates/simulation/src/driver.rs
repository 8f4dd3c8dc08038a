//! Threaded clock driver.
//!
//! [`SimDriver`] moves a [`MarketSim`] onto its own thread and steps it on
//! a fixed cadence. Callers interact through two paths:
//!
//! - mutations (order submission, cancellation, stop) travel over a
//!   command channel and are serialized with the tick loop, so they never
//!   race a match in progress;
//! - reads come from a shared view republished at the end of every
//!   completed tick, so readers never touch live structures and never
//!   block the clock.
//!
//! `stop()` is cooperative: the in-flight tick finishes, queued commands
//! are drained and answered, the final views are published, and the
//! simulation is handed back to the caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use analytics::MarketAnalytics;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use sim_core::{Result, SimError};
use tracing::info;
use types::{BookSnapshot, MarketState, Order, OrderId, Symbol};

use crate::runner::MarketSim;

/// Published per-symbol views from the last completed tick.
#[derive(Debug, Clone)]
pub struct MarketView {
    pub snapshot: BookSnapshot,
    pub state: MarketState,
    pub analytics: MarketAnalytics,
}

type SharedViews = Arc<RwLock<HashMap<Symbol, MarketView>>>;

enum Command {
    Submit(Order, Sender<Result<OrderId>>),
    Cancel(OrderId, Sender<Result<Order>>),
    Stop,
}

/// Handle to a simulation running on its own thread.
pub struct SimDriver {
    commands: Sender<Command>,
    views: SharedViews,
    handle: Option<JoinHandle<MarketSim>>,
}

impl SimDriver {
    /// Start stepping `sim` on a background thread at the tick interval
    /// from its configuration.
    pub fn start(sim: MarketSim) -> Self {
        let tick_interval = sim.config().tick_interval;
        let (commands, command_rx) = unbounded();
        let views: SharedViews = Arc::new(RwLock::new(HashMap::new()));
        let shared = Arc::clone(&views);

        let handle = thread::spawn(move || Self::run_loop(sim, command_rx, shared, tick_interval));
        Self {
            commands,
            views,
            handle: Some(handle),
        }
    }

    fn run_loop(
        mut sim: MarketSim,
        commands: Receiver<Command>,
        views: SharedViews,
        tick_interval: Duration,
    ) -> MarketSim {
        Self::publish(&sim, &views);
        let mut next_tick = Instant::now() + tick_interval;

        loop {
            // The deadline-based wait is the only suspension point: command
            // bursts delay each other, never the clock.
            match commands.recv_deadline(next_tick) {
                Ok(Command::Submit(order, reply)) => {
                    let _ = reply.send(sim.submit_order(order));
                }
                Ok(Command::Cancel(order_id, reply)) => {
                    let _ = reply.send(sim.cancel_order(order_id));
                }
                Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    sim.step();
                    Self::publish(&sim, &views);
                    next_tick += tick_interval;
                }
            }
        }

        // Drain commands that raced the stop, then publish one last time.
        while let Ok(command) = commands.try_recv() {
            match command {
                Command::Submit(order, reply) => {
                    let _ = reply.send(sim.submit_order(order));
                }
                Command::Cancel(order_id, reply) => {
                    let _ = reply.send(sim.cancel_order(order_id));
                }
                Command::Stop => {}
            }
        }
        Self::publish(&sim, &views);
        info!(tick = sim.tick(), "simulation stopped");
        sim
    }

    fn publish(sim: &MarketSim, views: &SharedViews) {
        let depth = sim.config().snapshot_depth;
        let fresh: HashMap<Symbol, MarketView> = sim
            .symbols()
            .filter_map(|symbol| {
                let snapshot = sim.get_order_book(symbol, depth).ok()?;
                let state = sim.get_market_state(symbol).ok()?;
                let analytics = sim.get_analytics(symbol).ok()?;
                Some((
                    symbol.clone(),
                    MarketView {
                        snapshot,
                        state,
                        analytics,
                    },
                ))
            })
            .collect();
        *views.write() = fresh;
    }

    /// Submit an order to the running simulation and wait for its id.
    pub fn submit_order(&self, order: Order) -> Result<OrderId> {
        let (reply, response) = bounded(1);
        self.commands
            .send(Command::Submit(order, reply))
            .map_err(|_| SimError::Shutdown)?;
        response.recv().map_err(|_| SimError::Shutdown)?
    }

    /// Cancel a live order in the running simulation.
    pub fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let (reply, response) = bounded(1);
        self.commands
            .send(Command::Cancel(order_id, reply))
            .map_err(|_| SimError::Shutdown)?;
        response.recv().map_err(|_| SimError::Shutdown)?
    }

    /// Book snapshot from the last completed tick.
    pub fn order_book(&self, symbol: &str) -> Result<BookSnapshot> {
        self.view_of(symbol, |view| view.snapshot.clone())
    }

    /// Market state from the last completed tick.
    pub fn market_state(&self, symbol: &str) -> Result<MarketState> {
        self.view_of(symbol, |view| view.state.clone())
    }

    /// Analytics from the last completed tick.
    pub fn analytics(&self, symbol: &str) -> Result<MarketAnalytics> {
        self.view_of(symbol, |view| view.analytics.clone())
    }

    fn view_of<T>(&self, symbol: &str, extract: impl Fn(&MarketView) -> T) -> Result<T> {
        self.views
            .read()
            .get(symbol)
            .map(extract)
            .ok_or_else(|| SimError::UnknownSymbol(symbol.to_string()))
    }

    /// Stop gracefully and hand the simulation back. Returns `None` only
    /// if the simulation thread panicked.
    pub fn stop(mut self) -> Option<MarketSim> {
        let _ = self.commands.send(Command::Stop);
        self.handle.take().and_then(|handle| handle.join().ok())
    }
}
