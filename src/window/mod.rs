//! Rolling market-data windows
//!
//! Bounded, time-ordered, deduplicated OHLC bar history per instrument.
//! Merges poll-fetched bars and push-driven tick aggregation into one
//! consistent view.

mod clock;
mod store;

pub use clock::BarClock;
pub use store::{RefreshOutcome, WindowStore};

use chrono::{DateTime, Duration, DurationRound, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum bars retained per instrument window
pub const MAX_WINDOW: usize = 500;

/// Bar granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Granularity {
    #[default]
    M1,
    M5,
    M15,
    H1,
}

impl Granularity {
    /// Venue wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::M1 => "M1",
            Granularity::M5 => "M5",
            Granularity::M15 => "M15",
            Granularity::H1 => "H1",
        }
    }

    /// Duration of one bar
    pub fn duration(&self) -> Duration {
        match self {
            Granularity::M1 => Duration::minutes(1),
            Granularity::M5 => Duration::minutes(5),
            Granularity::M15 => Duration::minutes(15),
            Granularity::H1 => Duration::hours(1),
        }
    }

    /// Truncate a timestamp down to its bar bucket
    pub fn bucket(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        time.duration_trunc(self.duration())
            .expect("bar granularities divide evenly into days")
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One OHLC price record for a fixed time bucket
///
/// Mid values are always the arithmetic mean of the corresponding bid/ask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub bid_o: Decimal,
    pub bid_h: Decimal,
    pub bid_l: Decimal,
    pub bid_c: Decimal,
    pub ask_o: Decimal,
    pub ask_h: Decimal,
    pub ask_l: Decimal,
    pub ask_c: Decimal,
    pub mid_o: Decimal,
    pub mid_h: Decimal,
    pub mid_l: Decimal,
    pub mid_c: Decimal,
}

fn mid(bid: Decimal, ask: Decimal) -> Decimal {
    (bid + ask) / dec!(2)
}

impl Bar {
    /// Build a bar from separate bid and ask OHLC quotes, deriving mids
    pub fn from_quotes(
        time: DateTime<Utc>,
        bid: (Decimal, Decimal, Decimal, Decimal),
        ask: (Decimal, Decimal, Decimal, Decimal),
    ) -> Self {
        let (bid_o, bid_h, bid_l, bid_c) = bid;
        let (ask_o, ask_h, ask_l, ask_c) = ask;
        Self {
            time,
            bid_o,
            bid_h,
            bid_l,
            bid_c,
            ask_o,
            ask_h,
            ask_l,
            ask_c,
            mid_o: mid(bid_o, ask_o),
            mid_h: mid(bid_h, ask_h),
            mid_l: mid(bid_l, ask_l),
            mid_c: mid(bid_c, ask_c),
        }
    }

    /// Open a fresh bar from a single tick (o = h = l = c)
    pub fn open_from_tick(time: DateTime<Utc>, bid: Decimal, ask: Decimal) -> Self {
        Self::from_quotes(time, (bid, bid, bid, bid), (ask, ask, ask, ask))
    }

    /// Fold a tick into this bar: widen high/low, replace close
    pub fn apply_tick(&mut self, bid: Decimal, ask: Decimal) {
        let m = mid(bid, ask);
        self.bid_h = self.bid_h.max(bid);
        self.bid_l = self.bid_l.min(bid);
        self.bid_c = bid;
        self.ask_h = self.ask_h.max(ask);
        self.ask_l = self.ask_l.min(ask);
        self.ask_c = ask;
        self.mid_h = self.mid_h.max(m);
        self.mid_l = self.mid_l.min(m);
        self.mid_c = m;
    }

    /// Trailing spread of this bar
    pub fn spread(&self) -> Decimal {
        self.ask_c - self.bid_c
    }
}

/// Result of merging one tick into a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMerge {
    /// Tick landed in the in-progress bar
    Updated,
    /// Tick opened a new bar
    Appended,
    /// Tick was older than the last bar and was dropped
    Ignored,
}

/// Bounded, time-ordered, deduplicated sequence of bars for one instrument
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollingWindow {
    bars: Vec<Bar>,
}

impl RollingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a window from a batch of bars, deduplicating by timestamp
    /// (first occurrence wins) and keeping the most recent MAX_WINDOW
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        let mut window = Self::new();
        window.merge_bars(bars);
        window
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Timestamp of the most recent bar
    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.time)
    }

    /// Timestamp-deduplicating union merge; the existing bar wins on a
    /// duplicate so poll- and push-delivered bars converge to one record.
    /// Returns the number of newly inserted bars.
    pub fn merge_bars(&mut self, incoming: Vec<Bar>) -> usize {
        let mut by_time: BTreeMap<DateTime<Utc>, Bar> =
            self.bars.drain(..).map(|b| (b.time, b)).collect();

        let mut inserted = 0;
        for bar in incoming {
            by_time.entry(bar.time).or_insert_with(|| {
                inserted += 1;
                bar
            });
        }

        self.bars = by_time.into_values().collect();
        self.truncate();
        inserted
    }

    /// Merge one tick, bucketed to `time`, per OHLC aggregation semantics
    pub fn merge_tick(
        &mut self,
        time: DateTime<Utc>,
        bid: Decimal,
        ask: Decimal,
    ) -> TickMerge {
        let outcome = match self.last_time() {
            Some(last) if time == last => {
                self.bars
                    .last_mut()
                    .expect("last_time implies non-empty")
                    .apply_tick(bid, ask);
                TickMerge::Updated
            }
            Some(last) if time < last => TickMerge::Ignored,
            _ => {
                self.bars.push(Bar::open_from_tick(time, bid, ask));
                TickMerge::Appended
            }
        };
        self.truncate();
        outcome
    }

    fn truncate(&mut self) {
        if self.bars.len() > MAX_WINDOW {
            let excess = self.bars.len() - MAX_WINDOW;
            self.bars.drain(..excess);
        }
    }
}
