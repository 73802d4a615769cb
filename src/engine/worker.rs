//! Per-instrument worker
//!
//! Sole owner of one instrument's window. Ticks fold into the in-progress
//! bar; poll checks pull complete bars and, exactly once per new bar, run
//! the signal pipeline through to dispatch. Any failure inside a cycle is
//! logged and the worker waits for the next event.

use crate::config::InstrumentSettings;
use crate::decision::TradeDecision;
use crate::dispatch::{DispatchOutcome, OrderDispatcher};
use crate::feed::Tick;
use crate::instrument::Instrument;
use crate::signal::{evaluate, SignalLog};
use crate::window::{BarClock, RefreshOutcome, WindowStore};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Events a worker consumes
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Live quote for this worker's instrument
    Tick(Tick),
    /// Periodic prompt to pull complete bars and evaluate
    PollCheck,
}

/// Single-instrument pipeline worker
pub struct Worker {
    instrument: Instrument,
    settings: InstrumentSettings,
    store: WindowStore,
    clock: BarClock,
    dispatcher: Arc<OrderDispatcher>,
    signal_log: SignalLog,
    rx: mpsc::Receiver<WorkerEvent>,
}

impl Worker {
    pub fn new(
        instrument: Instrument,
        settings: InstrumentSettings,
        store: WindowStore,
        dispatcher: Arc<OrderDispatcher>,
        signal_log: SignalLog,
        rx: mpsc::Receiver<WorkerEvent>,
    ) -> Self {
        Self {
            instrument,
            settings,
            store,
            // Reseeded in run() once the store has its history
            clock: BarClock::default(),
            dispatcher,
            signal_log,
            rx,
        }
    }

    /// Consume events until every sender is gone
    pub async fn run(mut self) {
        self.store.initialize().await;

        // Seed the clock so cycles only run on bars newer than startup
        let seed = match self.store.last_complete_bar().await {
            Ok(venue_last) => venue_last.max(self.store.last_time()),
            Err(error) => {
                tracing::warn!(
                    symbol = %self.instrument.symbol,
                    %error,
                    "Could not fetch last complete bar; seeding clock from the window"
                );
                self.store.last_time()
            }
        };
        self.clock = BarClock::new(seed);
        tracing::info!(
            symbol = %self.instrument.symbol,
            bars = self.store.window().len(),
            "Worker started"
        );

        while let Some(event) = self.rx.recv().await {
            match event {
                WorkerEvent::Tick(tick) => self.on_tick(tick),
                WorkerEvent::PollCheck => self.on_poll_check().await,
            }
        }

        tracing::info!(symbol = %self.instrument.symbol, "Worker stopped");
    }

    fn on_tick(&mut self, tick: Tick) {
        let outcome = self.store.merge_tick(tick.time, tick.bid, tick.ask);
        tracing::trace!(symbol = %self.instrument.symbol, ?outcome, "Tick merged");
    }

    async fn on_poll_check(&mut self) {
        match self.store.refresh_from_poll().await {
            Ok(RefreshOutcome::Insufficient { have, need }) => {
                tracing::debug!(
                    symbol = %self.instrument.symbol,
                    have,
                    need,
                    "Skipping evaluation, window too shallow"
                );
            }
            Ok(_) => {
                metrics::gauge!("window_bars", "symbol" => self.instrument.symbol.clone())
                    .set(self.store.window().len() as f64);
                if let Some(last) = self.store.last_time() {
                    if self.clock.observe(last) {
                        self.run_cycle().await;
                    }
                }
            }
            Err(error) => {
                // The cycle boundary: a failed refresh never unwinds the
                // worker, the next poll retries
                tracing::error!(symbol = %self.instrument.symbol, %error, "Bar refresh failed");
                metrics::counter!("cycle_errors_total").increment(1);
            }
        }
    }

    async fn run_cycle(&mut self) {
        let started = std::time::Instant::now();
        self.evaluate_and_dispatch().await;
        metrics::histogram!("cycle_duration_seconds").record(started.elapsed().as_secs_f64());
    }

    async fn evaluate_and_dispatch(&mut self) {
        let Some(row) = evaluate(
            &self.instrument.symbol,
            self.store.window().bars(),
            &self.settings,
            self.instrument.display_precision,
        ) else {
            return;
        };

        tracing::info!(
            symbol = %row.symbol,
            time = %row.time,
            signal = %row.signal,
            rsi = ?row.rsi,
            spread = %row.spread,
            "Bar evaluated"
        );
        metrics::counter!("signals_evaluated_total").increment(1);

        let decision = TradeDecision::from_signal(&row);
        self.signal_log.push(row).await;

        if !decision.is_actionable() {
            return;
        }

        match self.dispatcher.dispatch(&decision, &self.instrument).await {
            Ok(DispatchOutcome::Placed(ticket)) => {
                tracing::info!(
                    symbol = %decision.symbol,
                    order_id = %ticket.order_id,
                    "Cycle placed order"
                );
            }
            Ok(outcome) => {
                tracing::info!(symbol = %decision.symbol, ?outcome, "Cycle skipped order");
            }
            Err(error) => {
                tracing::error!(symbol = %decision.symbol, %error, "Order dispatch failed");
                metrics::counter!("cycle_errors_total").increment(1);
            }
        }
    }
}
