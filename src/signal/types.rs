//! Signal types

use crate::indicators::PatternFlags;
use crate::venue::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trade direction verdict for one evaluated bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    None,
}

impl Signal {
    /// Order side for an actionable signal
    pub fn side(&self) -> Option<Side> {
        match self {
            Signal::Buy => Some(Side::Buy),
            Signal::Sell => Some(Side::Sell),
            Signal::None => None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, Signal::None)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::None => "NONE",
        };
        f.write_str(s)
    }
}

/// One evaluated bar: verdict plus everything needed to act on it or
/// audit it later
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRow {
    /// Unique row identifier
    pub id: Uuid,
    pub symbol: String,
    /// Bar timestamp the row was evaluated on
    pub time: DateTime<Utc>,
    pub signal: Signal,
    pub mid_c: Decimal,
    pub mid_o: Decimal,
    /// Trailing spread (ask close minus bid close)
    pub spread: Decimal,
    /// Stop-loss price, zero when no signal
    pub sl: Decimal,
    /// Take-profit price, zero when no signal
    pub tp: Decimal,
    /// Distance from close to the Bollinger mean
    pub gain: Decimal,
    /// Distance from close to the stop-loss
    pub loss: Decimal,
    /// Trailing RSI; absent when the window was flat
    pub rsi: Option<Decimal>,
    /// 200-bar EMA of mid closes
    pub ema: Option<Decimal>,
    /// Pattern catalogue hits on the evaluated bar
    pub patterns: PatternFlags,
}
