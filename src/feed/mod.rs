//! Live price feed
//!
//! Push-driven bid/ask ticks for all configured instruments, multiplexed
//! onto one channel.

mod stream;

pub use stream::VenueStream;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::mpsc;

/// One top-of-book quote update
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Venue symbol (e.g., "XAUUSD")
    pub symbol: String,
    /// Venue timestamp of the quote
    pub time: DateTime<Utc>,
    /// Best bid price
    pub bid: Decimal,
    /// Best ask price
    pub ask: Decimal,
}

/// Trait for live tick sources
#[async_trait]
pub trait TickFeed: Send + Sync {
    /// Subscribe to ticks for the given symbols
    async fn subscribe(&self, symbols: &[String]) -> anyhow::Result<mpsc::Receiver<Tick>>;
}
