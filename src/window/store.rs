//! Per-instrument window store
//!
//! Owns the rolling window for one (instrument, granularity) pair, fills it
//! from the venue and checkpoints it to disk so restarts resume without a
//! full refetch. Exactly one engine worker holds each store; there is no
//! shared mutation.

use super::{Granularity, RollingWindow, TickMerge, MAX_WINDOW};
use crate::venue::{VenueApi, VenueError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of a poll-driven refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New bars were merged and the window is deep enough to evaluate
    Merged(usize),
    /// The venue had nothing newer than the window
    NoNewBars,
    /// The window is too shallow for indicators; skip this cycle
    Insufficient { have: usize, need: usize },
}

/// Rolling window plus its venue source and on-disk checkpoint
pub struct WindowStore {
    venue: Arc<dyn VenueApi>,
    symbol: String,
    granularity: Granularity,
    min_rows: usize,
    checkpoint: PathBuf,
    window: RollingWindow,
}

impl WindowStore {
    pub fn new(
        venue: Arc<dyn VenueApi>,
        symbol: impl Into<String>,
        granularity: Granularity,
        min_rows: usize,
        data_dir: impl AsRef<Path>,
    ) -> Self {
        let symbol = symbol.into();
        let checkpoint = data_dir
            .as_ref()
            .join(format!("{}_{}.json", symbol, granularity));
        Self {
            venue,
            symbol,
            granularity,
            min_rows,
            checkpoint,
            window: RollingWindow::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.window.last_time()
    }

    /// The venue's view of the newest complete bar for this series
    pub async fn last_complete_bar(&self) -> Result<Option<DateTime<Utc>>, VenueError> {
        self.venue
            .last_complete_bar(&self.symbol, self.granularity)
            .await
    }

    /// Restore from checkpoint if one exists, then top up from the venue.
    ///
    /// A venue failure here is not fatal: the worker starts with whatever
    /// history it has and the poll loop retries on its own cadence.
    pub async fn initialize(&mut self) {
        if let Some(window) = load_checkpoint(&self.checkpoint) {
            tracing::info!(
                symbol = %self.symbol,
                bars = window.len(),
                "Restored window from checkpoint"
            );
            self.window = window;
        }

        match self.refresh_from_poll().await {
            Ok(outcome) => tracing::info!(
                symbol = %self.symbol,
                bars = self.window.len(),
                ?outcome,
                "Initialized window"
            ),
            Err(error) => tracing::warn!(
                symbol = %self.symbol,
                %error,
                "Initial bar fetch failed; starting with checkpoint history only"
            ),
        }
    }

    /// Fetch complete bars newer than the window and merge them in
    pub async fn refresh_from_poll(&mut self) -> Result<RefreshOutcome, VenueError> {
        // Empty window: reach back one full window of bars at this
        // granularity
        let from = match self.window.last_time() {
            Some(last) => last + self.granularity.duration(),
            None => Utc::now() - self.granularity.duration() * MAX_WINDOW as i32,
        };

        let bars = self
            .venue
            .fetch_bars(&self.symbol, self.granularity, from, MAX_WINDOW as u32)
            .await?;

        let inserted = self.window.merge_bars(bars);
        if inserted > 0 {
            self.persist();
        }

        if self.window.len() < self.min_rows {
            tracing::debug!(
                symbol = %self.symbol,
                have = self.window.len(),
                need = self.min_rows,
                "Window below indicator depth"
            );
            return Ok(RefreshOutcome::Insufficient {
                have: self.window.len(),
                need: self.min_rows,
            });
        }

        if inserted == 0 {
            Ok(RefreshOutcome::NoNewBars)
        } else {
            Ok(RefreshOutcome::Merged(inserted))
        }
    }

    /// Fold a live tick into the window, bucketed to this store's granularity
    pub fn merge_tick(&mut self, time: DateTime<Utc>, bid: Decimal, ask: Decimal) -> TickMerge {
        let bucket = self.granularity.bucket(time);
        let outcome = self.window.merge_tick(bucket, bid, ask);
        if outcome == TickMerge::Appended {
            self.persist();
        }
        outcome
    }

    /// Whether the window is deep enough for the signal pipeline
    pub fn has_min_rows(&self) -> bool {
        self.window.len() >= self.min_rows
    }

    fn persist(&self) {
        if let Err(error) = write_checkpoint(&self.checkpoint, &self.window) {
            tracing::warn!(
                symbol = %self.symbol,
                path = %self.checkpoint.display(),
                %error,
                "Failed to write window checkpoint"
            );
        }
    }
}

/// Read a checkpoint; a missing or corrupt file yields None and the window
/// is rebuilt from the venue
fn load_checkpoint(path: &Path) -> Option<RollingWindow> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "Failed to read window checkpoint");
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(window) => Some(window),
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                %error,
                "Corrupt window checkpoint; refetching from venue"
            );
            None
        }
    }
}

fn write_checkpoint(path: &Path, window: &RollingWindow) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(window)?;
    std::fs::write(path, json)?;
    Ok(())
}
