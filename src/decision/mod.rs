//! Trade decision record
//!
//! The slice of a signal row that the execution side acts on.

use crate::signal::{Signal, SignalRow};
use rust_decimal::Decimal;

/// Verdict plus protective levels for one instrument at one bar
#[derive(Debug, Clone, PartialEq)]
pub struct TradeDecision {
    pub symbol: String,
    pub signal: Signal,
    pub sl: Decimal,
    pub tp: Decimal,
    pub gain: Decimal,
    pub loss: Decimal,
}

impl TradeDecision {
    pub fn new(
        symbol: impl Into<String>,
        signal: Signal,
        sl: Decimal,
        tp: Decimal,
        gain: Decimal,
        loss: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            signal,
            sl,
            tp,
            gain,
            loss,
        }
    }

    pub fn from_signal(row: &SignalRow) -> Self {
        Self {
            symbol: row.symbol.clone(),
            signal: row.signal,
            sl: row.sl,
            tp: row.tp,
            gain: row.gain,
            loss: row.loss,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.signal.is_actionable()
    }
}

impl Default for TradeDecision {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            signal: Signal::None,
            sl: Decimal::ZERO,
            tp: Decimal::ZERO,
            gain: Decimal::ZERO,
            loss: Decimal::ZERO,
        }
    }
}

impl std::fmt::Display for TradeDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} gain:{} sl:{} tp:{}",
            self.symbol, self.signal, self.gain, self.sl, self.tp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::PatternFlags;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_from_signal_carries_levels() {
        let row = SignalRow {
            id: Uuid::new_v4(),
            symbol: "XAUUSD".to_string(),
            time: Utc::now(),
            signal: Signal::Buy,
            mid_c: dec!(2000),
            mid_o: dec!(1999),
            spread: dec!(0.3),
            sl: dec!(1998),
            tp: dec!(2006),
            gain: dec!(6),
            loss: dec!(2),
            rsi: Some(dec!(25)),
            ema: None,
            patterns: PatternFlags::default(),
        };

        let decision = TradeDecision::from_signal(&row);
        assert_eq!(decision.symbol, "XAUUSD");
        assert_eq!(decision.signal, Signal::Buy);
        assert_eq!(decision.sl, dec!(1998));
        assert_eq!(decision.tp, dec!(2006));
        assert!(decision.is_actionable());
    }

    #[test]
    fn test_default_is_neutral() {
        let decision = TradeDecision::default();
        assert_eq!(decision.signal, Signal::None);
        assert!(!decision.is_actionable());
        assert_eq!(decision.sl, Decimal::ZERO);
    }
}
