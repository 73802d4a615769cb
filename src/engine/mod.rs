//! Engine wiring
//!
//! One feed task multiplexes ticks onto a channel; a router fans them out
//! to per-instrument workers; a poll task broadcasts new-bar checks on a
//! fixed cadence. Each worker owns its window outright, so nothing here
//! shares mutable state.

mod worker;

pub use worker::{Worker, WorkerEvent};

use crate::config::Config;
use crate::dispatch::OrderDispatcher;
use crate::feed::{Tick, TickFeed};
use crate::instrument::InstrumentRegistry;
use crate::signal::SignalLog;
use crate::venue::VenueApi;
use crate::window::WindowStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Queue depth per worker; ticks are droppable, poll checks are not
const WORKER_QUEUE: usize = 1024;

/// Top-level engine: owns the task fabric for one bot process
pub struct Engine {
    config: Config,
    registry: Arc<InstrumentRegistry>,
    venue: Arc<dyn VenueApi>,
    feed: Arc<dyn TickFeed>,
}

impl Engine {
    pub fn new(
        config: Config,
        registry: Arc<InstrumentRegistry>,
        venue: Arc<dyn VenueApi>,
        feed: Arc<dyn TickFeed>,
    ) -> Self {
        Self {
            config,
            registry,
            venue,
            feed,
        }
    }

    /// Run until ctrl-c
    pub async fn run(self) -> anyhow::Result<()> {
        let signal_log = SignalLog::new(
            self.config.data.signal_log_size,
            self.config.data.signal_log_path.clone(),
        );
        let dispatcher = Arc::new(OrderDispatcher::new(
            self.venue.clone(),
            self.config.risk.trade_risk,
        ));

        let granularity = self.config.feed.granularity;
        let mut worker_txs: HashMap<String, mpsc::Sender<WorkerEvent>> = HashMap::new();
        let mut worker_handles = Vec::new();

        for (symbol, settings) in &self.config.instruments {
            let Some(instrument) = self.registry.get(symbol) else {
                tracing::warn!(symbol, "Configured symbol missing from instrument registry, skipping");
                continue;
            };

            let (tx, rx) = mpsc::channel(WORKER_QUEUE);
            let store = WindowStore::new(
                self.venue.clone(),
                symbol.clone(),
                granularity,
                settings.min_window_rows(),
                &self.config.data.dir,
            );
            let worker = Worker::new(
                instrument.clone(),
                settings.clone(),
                store,
                dispatcher.clone(),
                signal_log.clone(),
                rx,
            );

            worker_txs.insert(symbol.clone(), tx);
            worker_handles.push(tokio::spawn(worker.run()));
        }

        if worker_txs.is_empty() {
            anyhow::bail!("no tradeable instruments configured");
        }

        let symbols: Vec<String> = worker_txs.keys().cloned().collect();
        tracing::info!(symbols = ?symbols, %granularity, "Engine starting");

        let ticks = self.feed.subscribe(&symbols).await?;
        let router = tokio::spawn(route_ticks(ticks, worker_txs.clone()));

        let poll_interval = Duration::from_secs(self.config.feed.poll_interval_secs);
        let poll_txs = worker_txs.clone();
        let poller = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                for tx in poll_txs.values() {
                    if tx.send(WorkerEvent::PollCheck).await.is_err() {
                        tracing::warn!("Worker gone, stopping poll broadcast");
                        return;
                    }
                }
            }
        });

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown signal received, stopping engine");

        // Stop producers first; workers drain their queues and exit when
        // the last sender drops
        router.abort();
        poller.abort();
        drop(worker_txs);

        for handle in worker_handles {
            let _ = handle.await;
        }

        tracing::info!("Engine stopped");
        Ok(())
    }
}

/// Fan the multiplexed tick stream out to per-instrument workers.
///
/// Each worker channel is single-consumer, so a tick sequence for one
/// symbol arrives in feed order. A full worker queue sheds ticks; the
/// poll path will reconverge the window.
async fn route_ticks(
    mut ticks: mpsc::Receiver<Tick>,
    worker_txs: HashMap<String, mpsc::Sender<WorkerEvent>>,
) {
    while let Some(tick) = ticks.recv().await {
        let Some(tx) = worker_txs.get(&tick.symbol) else {
            continue;
        };
        if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(WorkerEvent::Tick(tick)) {
            metrics::counter!("ticks_dropped_total").increment(1);
        }
    }
    tracing::info!("Tick feed ended");
}
