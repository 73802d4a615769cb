//! Venue REST access
//!
//! Order placement, open-position queries and bar history behind the
//! `VenueApi` trait so the pipeline can run against an in-memory venue in
//! tests.

mod rest;

pub use rest::RestVenue;

use crate::window::{Bar, Granularity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Errors from venue requests
#[derive(Debug, thiserror::Error)]
pub enum VenueError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("venue returned status {status}: {body}")]
    BadStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed venue response: {0}")]
    MalformedResponse(String),
}

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Venue wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open position reported by the venue
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub id: String,
    pub symbol: String,
    pub side: Side,
    pub size: Decimal,
}

/// A market order with protective stop-loss and take-profit prices
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub size: Decimal,
    pub side: Side,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

/// Acknowledgement of a placed order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTicket {
    pub order_id: String,
}

/// Venue operations the pipeline depends on
#[async_trait]
pub trait VenueApi: Send + Sync {
    /// Fetch up to `count` complete bars starting at `from` (inclusive)
    async fn fetch_bars(
        &self,
        symbol: &str,
        granularity: Granularity,
        from: DateTime<Utc>,
        count: u32,
    ) -> Result<Vec<Bar>, VenueError>;

    /// Timestamp of the most recent complete bar, if the venue has any
    async fn last_complete_bar(
        &self,
        symbol: &str,
        granularity: Granularity,
    ) -> Result<Option<DateTime<Utc>>, VenueError>;

    /// All currently open positions on the account
    async fn open_positions(&self) -> Result<Vec<OpenPosition>, VenueError>;

    /// Place a market order; succeeds only when the venue acknowledges
    /// with an order id
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderTicket, VenueError>;

    /// Close an open position by id
    async fn close_position(&self, id: &str) -> Result<(), VenueError>;

    /// Per-symbol pip monetary values in account currency
    async fn pip_values(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Decimal>, VenueError>;
}
