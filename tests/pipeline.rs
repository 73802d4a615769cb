//! End-to-end pipeline tests
//!
//! Drive a deep candle window through signal evaluation, decision building,
//! risk sizing and dispatch against a mock venue, exercising the same path a
//! worker runs on each new bar.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fxbot::config::InstrumentSettings;
use fxbot::decision::TradeDecision;
use fxbot::dispatch::{DispatchOutcome, OrderDispatcher};
use fxbot::instrument::Instrument;
use fxbot::signal::{evaluate, Signal};
use fxbot::venue::{
    OpenPosition, OrderRequest, OrderTicket, Side, VenueApi, VenueError,
};
use fxbot::window::{Bar, Granularity};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const DEPTH: i64 = 300;

/// Venue that accepts every order and quotes XAUUSD pips
struct AcceptingVenue {
    positions: Vec<OpenPosition>,
    placed: Mutex<Vec<OrderRequest>>,
}

impl AcceptingVenue {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            positions: Vec::new(),
            placed: Mutex::new(Vec::new()),
        })
    }

    fn with_open_position(symbol: &str) -> Arc<Self> {
        Arc::new(Self {
            positions: vec![OpenPosition {
                id: "9".to_string(),
                symbol: symbol.to_string(),
                side: Side::Sell,
                size: dec!(3),
            }],
            placed: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl VenueApi for AcceptingVenue {
    async fn fetch_bars(
        &self,
        _symbol: &str,
        _granularity: Granularity,
        _from: DateTime<Utc>,
        _count: u32,
    ) -> Result<Vec<Bar>, VenueError> {
        Ok(Vec::new())
    }

    async fn last_complete_bar(
        &self,
        _symbol: &str,
        _granularity: Granularity,
    ) -> Result<Option<DateTime<Utc>>, VenueError> {
        Ok(None)
    }

    async fn open_positions(&self) -> Result<Vec<OpenPosition>, VenueError> {
        Ok(self.positions.clone())
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderTicket, VenueError> {
        self.placed.lock().unwrap().push(request.clone());
        Ok(OrderTicket {
            order_id: "e2e-1".to_string(),
        })
    }

    async fn close_position(&self, _id: &str) -> Result<(), VenueError> {
        Ok(())
    }

    async fn pip_values(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Decimal>, VenueError> {
        Ok(symbols.iter().map(|s| (s.clone(), dec!(0.01))).collect())
    }
}

fn xauusd() -> Instrument {
    Instrument {
        symbol: "XAUUSD".to_string(),
        display_precision: 2,
        pip_location: dec!(0.01),
        size_step: dec!(1),
        min_size: dec!(1),
        max_size: dec!(100),
    }
}

fn settings() -> InstrumentSettings {
    InstrumentSettings {
        min_stop_distance: dec!(2.0),
        ..Default::default()
    }
}

/// Monotonically falling closes, one bar per minute, constant 0.2 spread
fn falling_window() -> Vec<Bar> {
    let start = Utc::now() - Duration::minutes(DEPTH);
    (0..DEPTH)
        .map(|i| {
            let close = dec!(2400) - Decimal::from(i);
            Bar::from_quotes(
                start + Duration::minutes(i),
                (close - dec!(0.1), close, close - dec!(0.6), close - dec!(0.1)),
                (close + dec!(0.1), close + dec!(0.2), close - dec!(0.4), close + dec!(0.1)),
            )
        })
        .collect()
}

fn rising_window() -> Vec<Bar> {
    let start = Utc::now() - Duration::minutes(DEPTH);
    (0..DEPTH)
        .map(|i| {
            let close = dec!(2100) + Decimal::from(i);
            Bar::from_quotes(
                start + Duration::minutes(i),
                (close - dec!(0.1), close, close - dec!(0.6), close - dec!(0.1)),
                (close + dec!(0.1), close + dec!(0.2), close - dec!(0.4), close + dec!(0.1)),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_falling_market_buys_end_to_end() {
    let bars = falling_window();
    let row = evaluate("XAUUSD", &bars, &settings(), 2).expect("deep window evaluates");

    assert_eq!(row.signal, Signal::Buy);
    assert!(row.rsi.unwrap() < dec!(30));
    assert!(row.sl < row.mid_c, "stop below entry for a buy");
    assert!(row.tp > row.mid_c, "target above entry for a buy");
    assert!(row.loss > Decimal::ZERO);

    let decision = TradeDecision::from_signal(&row);
    assert!(decision.is_actionable());
    // The sizer and the log see display-precision values only
    assert_eq!(decision.gain, decision.gain.round_dp(2));
    assert_eq!(decision.loss, decision.loss.round_dp(2));

    let venue = AcceptingVenue::new();
    let dispatcher = OrderDispatcher::new(venue.clone(), dec!(0.05));
    let outcome = dispatcher.dispatch(&decision, &xauusd()).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Placed(_)));

    let placed = venue.placed.lock().unwrap();
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].symbol, "XAUUSD");
    assert_eq!(placed[0].side, Side::Buy);
    assert_eq!(placed[0].stop_loss, row.sl);
    assert_eq!(placed[0].take_profit, row.tp);
    assert!(placed[0].size >= dec!(1));
    assert!(placed[0].size <= dec!(100));
}

#[tokio::test]
async fn test_rising_market_sells_end_to_end() {
    let bars = rising_window();
    let row = evaluate("XAUUSD", &bars, &settings(), 2).expect("deep window evaluates");

    assert_eq!(row.signal, Signal::Sell);
    assert!(row.rsi.unwrap() > dec!(70));
    assert!(row.sl > row.mid_c, "stop above entry for a sell");
    assert!(row.tp < row.mid_c, "target below entry for a sell");

    let venue = AcceptingVenue::new();
    let dispatcher = OrderDispatcher::new(venue.clone(), dec!(0.05));
    let outcome = dispatcher
        .dispatch(&TradeDecision::from_signal(&row), &xauusd())
        .await
        .unwrap();
    assert!(matches!(outcome, DispatchOutcome::Placed(_)));
    assert_eq!(venue.placed.lock().unwrap()[0].side, Side::Sell);
}

#[tokio::test]
async fn test_open_position_blocks_second_order() {
    let bars = falling_window();
    let row = evaluate("XAUUSD", &bars, &settings(), 2).unwrap();
    let decision = TradeDecision::from_signal(&row);

    let venue = AcceptingVenue::with_open_position("XAUUSD");
    let dispatcher = OrderDispatcher::new(venue.clone(), dec!(0.05));
    let outcome = dispatcher.dispatch(&decision, &xauusd()).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::SkippedOpenPosition);
    assert!(venue.placed.lock().unwrap().is_empty());
}

#[test]
fn test_shallow_window_never_evaluates() {
    let bars: Vec<Bar> = falling_window().into_iter().take(100).collect();
    assert!(evaluate("XAUUSD", &bars, &settings(), 2).is_none());
}

#[test]
fn test_wide_spread_neutralizes_signal() {
    let tight = InstrumentSettings {
        max_spread: dec!(0.1),
        ..settings()
    };
    let row = evaluate("XAUUSD", &falling_window(), &tight, 2).unwrap();
    assert_eq!(row.signal, Signal::None);
    assert!(!TradeDecision::from_signal(&row).is_actionable());
}
