//! REST client for the venue's margin-trading API
//!
//! Bar history comes as separate bid and ask series that are joined on
//! timestamp; mids are derived locally. Every request is retried a fixed
//! number of times with a flat delay before an error is surfaced.

use super::{OpenPosition, OrderRequest, OrderTicket, Side, VenueApi, VenueError};
use crate::config::VenueConfig;
use crate::window::{Bar, Granularity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Pip price values per symbol, in account currency per unit
///
/// The venue has no pip-value endpoint; this mirrors the account currency
/// table the venue publishes in its docs.
const PIP_VALUES: &[(&str, &str)] = &[
    ("XAUUSD", "0.01"),
    ("EURUSD", "0.0001"),
    ("GBPUSD", "0.0001"),
    ("USDJPY", "0.01"),
];

/// REST implementation of [`VenueApi`]
pub struct RestVenue {
    base_url: String,
    client: Client,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl RestVenue {
    pub fn new(config: &VenueConfig) -> Result<Self, VenueError> {
        let mut headers = HeaderMap::new();
        let auth = format!(
            "Basic {}:{}:{}",
            config.api_id, config.api_key, config.api_secret
        );
        let mut auth_value = HeaderValue::from_str(&auth)
            .map_err(|e| VenueError::MalformedResponse(format!("bad credentials: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Issue a request, retrying transport and status failures with a
    /// flat delay between attempts
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, VenueError> {
        for attempt in 1..self.retry_attempts {
            match self.send_once(method.clone(), path, query, body).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    tracing::warn!(%path, attempt, %error, "Venue request failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
        self.send_once(method, path, query, body).await
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, VenueError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.client.request(method, &url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VenueError::BadStatus { status, body });
        }

        let value = response.json().await?;
        Ok(value)
    }

    /// Fetch one side's bar series. Negative counts page backwards from
    /// the timestamp, positive counts forwards.
    async fn fetch_series(
        &self,
        symbol: &str,
        granularity: Granularity,
        timestamp_ms: i64,
        count: i64,
    ) -> Result<(BarsResponse, BarsResponse), VenueError> {
        let query = [
            ("timestamp", timestamp_ms.to_string()),
            ("count", count.to_string()),
        ];
        let base = format!("quotehistory/{}/{}/bars", symbol, granularity.as_str());

        let bid = self
            .request_json(Method::GET, &format!("{base}/bid"), &query, None)
            .await?;
        let ask = self
            .request_json(Method::GET, &format!("{base}/ask"), &query, None)
            .await?;

        let bid: BarsResponse = serde_json::from_value(bid)
            .map_err(|e| VenueError::MalformedResponse(format!("bid bars: {e}")))?;
        let ask: BarsResponse = serde_json::from_value(ask)
            .map_err(|e| VenueError::MalformedResponse(format!("ask bars: {e}")))?;
        Ok((bid, ask))
    }
}

#[async_trait]
impl VenueApi for RestVenue {
    async fn fetch_bars(
        &self,
        symbol: &str,
        granularity: Granularity,
        from: DateTime<Utc>,
        count: u32,
    ) -> Result<Vec<Bar>, VenueError> {
        let (bid, ask) = self
            .fetch_series(symbol, granularity, from.timestamp_millis(), count as i64)
            .await?;
        let bars = merge_quote_series(bid, ask);
        tracing::debug!(symbol, %granularity, bars = bars.len(), "Fetched bar history");
        Ok(bars)
    }

    async fn last_complete_bar(
        &self,
        symbol: &str,
        granularity: Granularity,
    ) -> Result<Option<DateTime<Utc>>, VenueError> {
        // A short backwards page from now; only the newest joined row matters
        let (bid, ask) = self
            .fetch_series(symbol, granularity, Utc::now().timestamp_millis(), -10)
            .await?;
        Ok(merge_quote_series(bid, ask).last().map(|b| b.time))
    }

    async fn open_positions(&self) -> Result<Vec<OpenPosition>, VenueError> {
        let value = self.request_json(Method::GET, "trade", &[], None).await?;
        parse_positions(&value)
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderTicket, VenueError> {
        let body = serde_json::json!({
            "Type": "Market",
            "Symbol": request.symbol,
            "Amount": request.size,
            "Side": request.side.as_str(),
            "StopLoss": request.stop_loss,
            "TakeProfit": request.take_profit,
        });

        let value = self
            .request_json(Method::POST, "trade", &[], Some(&body))
            .await?;
        let ticket = parse_order_ticket(&value)?;
        tracing::info!(
            symbol = %request.symbol,
            side = %request.side,
            size = %request.size,
            order_id = %ticket.order_id,
            "Order acknowledged"
        );
        Ok(ticket)
    }

    async fn close_position(&self, id: &str) -> Result<(), VenueError> {
        let value = self
            .request_json(Method::DELETE, &format!("trade/{id}"), &[], None)
            .await?;
        check_close_status(&value)
    }

    async fn pip_values(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Decimal>, VenueError> {
        let table: HashMap<&str, Decimal> = PIP_VALUES
            .iter()
            .map(|(symbol, value)| (*symbol, value.parse().expect("static table parses")))
            .collect();

        let mut result = HashMap::new();
        for symbol in symbols {
            match table.get(symbol.as_str()) {
                Some(value) => {
                    result.insert(symbol.clone(), *value);
                }
                None => tracing::warn!(symbol, "No pip value known for symbol"),
            }
        }
        Ok(result)
    }
}

/// One side's bar history response
#[derive(Debug, Deserialize)]
struct BarsResponse {
    #[serde(rename = "Bars", default)]
    bars: Vec<WireBar>,
}

/// Raw bar record from the venue
#[derive(Debug, Deserialize)]
struct WireBar {
    #[serde(rename = "Timestamp")]
    timestamp: i64,
    #[serde(rename = "Open")]
    open: Decimal,
    #[serde(rename = "High")]
    high: Decimal,
    #[serde(rename = "Low")]
    low: Decimal,
    #[serde(rename = "Close")]
    close: Decimal,
}

/// Inner-join bid and ask series on timestamp, deriving mids
///
/// Rows present on only one side are dropped; a bar needs both quotes.
fn merge_quote_series(bid: BarsResponse, ask: BarsResponse) -> Vec<Bar> {
    let asks: BTreeMap<i64, WireBar> = ask.bars.into_iter().map(|b| (b.timestamp, b)).collect();

    let mut joined: BTreeMap<i64, Bar> = BTreeMap::new();
    for bid_bar in bid.bars {
        let Some(ask_bar) = asks.get(&bid_bar.timestamp) else {
            continue;
        };
        let Some(time) = DateTime::from_timestamp_millis(bid_bar.timestamp) else {
            continue;
        };
        joined.insert(
            bid_bar.timestamp,
            Bar::from_quotes(
                time,
                (bid_bar.open, bid_bar.high, bid_bar.low, bid_bar.close),
                (ask_bar.open, ask_bar.high, ask_bar.low, ask_bar.close),
            ),
        );
    }
    joined.into_values().collect()
}

/// An order is placed only if the venue acknowledged with an id
fn parse_order_ticket(value: &serde_json::Value) -> Result<OrderTicket, VenueError> {
    let id = value
        .get("Id")
        .map(|id| match id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .filter(|id| !id.is_empty() && id != "null");

    match id {
        Some(order_id) => Ok(OrderTicket { order_id }),
        None => Err(VenueError::MalformedResponse(format!(
            "trade response has no Id: {value}"
        ))),
    }
}

/// Open trades arrive either as `{"Trades": [...]}` or as a bare list
fn parse_positions(value: &serde_json::Value) -> Result<Vec<OpenPosition>, VenueError> {
    let trades = match value {
        serde_json::Value::Array(items) => items.as_slice(),
        serde_json::Value::Object(map) => match map.get("Trades") {
            Some(serde_json::Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => {
            return Err(VenueError::MalformedResponse(format!(
                "unexpected open trades shape: {value}"
            )))
        }
    };

    let mut positions = Vec::new();
    for trade in trades {
        let wire: WirePosition = serde_json::from_value(trade.clone())
            .map_err(|e| VenueError::MalformedResponse(format!("open trade: {e}")))?;
        let side = match wire.side.as_str() {
            "Buy" => Side::Buy,
            "Sell" => Side::Sell,
            other => {
                return Err(VenueError::MalformedResponse(format!(
                    "unknown trade side: {other}"
                )))
            }
        };
        let id = match &wire.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        positions.push(OpenPosition {
            id,
            symbol: wire.symbol,
            side,
            size: wire.amount,
        });
    }
    Ok(positions)
}

#[derive(Debug, Deserialize)]
struct WirePosition {
    #[serde(rename = "Id")]
    id: serde_json::Value,
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Side")]
    side: String,
    #[serde(rename = "Amount")]
    amount: Decimal,
}

fn check_close_status(value: &serde_json::Value) -> Result<(), VenueError> {
    match value.get("status").and_then(|s| s.as_str()) {
        Some("success") => Ok(()),
        _ => Err(VenueError::MalformedResponse(format!(
            "close not confirmed: {value}"
        ))),
    }
}
