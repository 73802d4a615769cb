//! Signal evaluation over a rolling window

use super::types::{Signal, SignalRow};
use crate::config::InstrumentSettings;
use crate::indicators::{bollinger, ema, pattern_flags, rsi};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

const RSI_OVERSOLD: Decimal = dec!(30);
const RSI_OVERBOUGHT: Decimal = dec!(70);
/// Long trend EMA, observability only
const EMA_SPAN: usize = 200;
/// Extra depth on top of the longest indicator lookback
const MARGIN_ROWS: usize = 50;

/// Evaluate the most recent complete bar of a window into a signal row.
///
/// Returns `None` when the window is too shallow to trust the indicators;
/// a well-formed row with `Signal::None` in every other non-actionable
/// case. The same window always evaluates to the same verdict.
pub fn evaluate(
    symbol: &str,
    bars: &[crate::window::Bar],
    settings: &InstrumentSettings,
    display_precision: u32,
) -> Option<SignalRow> {
    let required = settings.min_window_rows() + MARGIN_ROWS;
    if bars.len() < required {
        tracing::debug!(
            symbol,
            have = bars.len(),
            need = required,
            "Window too shallow for signal evaluation"
        );
        return None;
    }

    let last = bars.last().expect("window depth checked above");
    let spread = last.spread();

    let bands = bollinger(bars, settings.ma_period, settings.std_mult)?;
    let momentum = rsi(bars, settings.momentum_period);
    let trend = ema(bars, EMA_SPAN);
    let patterns = pattern_flags(bars).unwrap_or_default();

    // RSI extremes, gated by a tradeable spread. An undefined RSI on a
    // flat window never signals.
    let signal = match momentum {
        Some(value) if spread <= settings.max_spread => {
            if value < RSI_OVERSOLD {
                Signal::Buy
            } else if value > RSI_OVERBOUGHT {
                Signal::Sell
            } else {
                Signal::None
            }
        }
        _ => Signal::None,
    };

    let gain = (last.mid_c - bands.ma).abs();
    let stop_distance = (gain / settings.risk_reward).max(settings.min_stop_distance);
    let profit_distance = gain.max(settings.min_stop_distance);

    let (sl, tp) = match signal {
        Signal::Buy => (
            (last.mid_c - stop_distance).round_dp(display_precision),
            (last.mid_c + profit_distance).round_dp(display_precision),
        ),
        Signal::Sell => (
            (last.mid_c + stop_distance).round_dp(display_precision),
            (last.mid_c - profit_distance).round_dp(display_precision),
        ),
        Signal::None => (Decimal::ZERO, Decimal::ZERO),
    };

    let loss = if signal.is_actionable() {
        (last.mid_c - sl).abs()
    } else {
        Decimal::ZERO
    };

    if signal.is_actionable() && gain < settings.min_gain {
        tracing::debug!(symbol, %gain, min_gain = %settings.min_gain, "Signal with marginal gain");
    }

    // Every derived decision value leaves here at display precision
    Some(SignalRow {
        id: Uuid::new_v4(),
        symbol: symbol.to_string(),
        time: last.time,
        signal,
        mid_c: last.mid_c,
        mid_o: last.mid_o,
        spread,
        sl,
        tp,
        gain: gain.round_dp(display_precision),
        loss: loss.round_dp(display_precision),
        rsi: momentum,
        ema: trend,
        patterns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::testutil::{flat_bar, trending_bar};
    use crate::window::Bar;
    use chrono::{Duration, TimeZone, Utc};

    const DEPTH: i64 = 260;

    fn settings() -> InstrumentSettings {
        InstrumentSettings {
            min_stop_distance: dec!(2.0),
            ..Default::default()
        }
    }

    fn falling_window() -> Vec<Bar> {
        (0..DEPTH)
            .map(|i| trending_bar(i, dec!(2400) - Decimal::from(i)))
            .collect()
    }

    fn rising_window() -> Vec<Bar> {
        (0..DEPTH)
            .map(|i| trending_bar(i, dec!(2000) + Decimal::from(i)))
            .collect()
    }

    #[test]
    fn test_shallow_window_yields_nothing() {
        let bars: Vec<Bar> = (0..100).map(|i| trending_bar(i, dec!(2000))).collect();
        assert!(evaluate("XAUUSD", &bars, &settings(), 2).is_none());
    }

    #[test]
    fn test_oversold_buy_signal() {
        let bars = falling_window();
        let row = evaluate("XAUUSD", &bars, &settings(), 2).unwrap();

        assert_eq!(row.signal, Signal::Buy);
        assert!(row.rsi.unwrap() < RSI_OVERSOLD);
        assert!(row.sl < row.mid_c);
        assert!(row.tp > row.mid_c);
        assert_eq!(row.loss, (row.mid_c - row.sl).abs());
        // Stop distance never collapses below the configured floor
        assert!(row.mid_c - row.sl >= settings().min_stop_distance);
        assert_eq!(row.symbol, "XAUUSD");
    }

    #[test]
    fn test_overbought_sell_signal() {
        let bars = rising_window();
        let row = evaluate("XAUUSD", &bars, &settings(), 2).unwrap();

        assert_eq!(row.signal, Signal::Sell);
        assert!(row.rsi.unwrap() > RSI_OVERBOUGHT);
        assert!(row.sl > row.mid_c);
        assert!(row.tp < row.mid_c);
        assert!(row.sl - row.mid_c >= settings().min_stop_distance);
    }

    #[test]
    fn test_wide_spread_blocks_signal() {
        // Same falling shape but a 2.0 spread against max_spread 1.0
        let bars: Vec<Bar> = (0..DEPTH)
            .map(|i| {
                let close = dec!(2400) - Decimal::from(i);
                let time =
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(i);
                let open = close - dec!(0.3);
                Bar::from_quotes(
                    time,
                    (open - dec!(1), close - dec!(0.5), open - dec!(1.5), close - dec!(1)),
                    (open + dec!(1), close + dec!(1.5), open - dec!(0.5), close + dec!(1)),
                )
            })
            .collect();

        let row = evaluate("XAUUSD", &bars, &settings(), 2).unwrap();
        assert_eq!(row.spread, dec!(2));
        assert_eq!(row.signal, Signal::None);
        assert_eq!(row.sl, Decimal::ZERO);
        assert_eq!(row.tp, Decimal::ZERO);
    }

    #[test]
    fn test_flat_window_never_signals() {
        let bars: Vec<Bar> = (0..DEPTH).map(|i| flat_bar(i, dec!(2000))).collect();
        let row = evaluate("XAUUSD", &bars, &settings(), 2).unwrap();

        assert_eq!(row.rsi, None);
        assert_eq!(row.signal, Signal::None);
    }

    #[test]
    fn test_levels_rounded_to_display_precision() {
        let bars = falling_window();
        let row = evaluate("XAUUSD", &bars, &settings(), 2).unwrap();
        assert_eq!(row.sl, row.sl.round_dp(2));
        assert_eq!(row.tp, row.tp.round_dp(2));
        // The Bollinger mean carries full precision; gain and loss must not
        assert_eq!(row.gain, row.gain.round_dp(2));
        assert_eq!(row.loss, row.loss.round_dp(2));
        assert!(row.gain > Decimal::ZERO);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let bars = falling_window();
        let first = evaluate("XAUUSD", &bars, &settings(), 2).unwrap();
        let second = evaluate("XAUUSD", &bars, &settings(), 2).unwrap();

        assert_eq!(first.signal, second.signal);
        assert_eq!(first.sl, second.sl);
        assert_eq!(first.tp, second.tp);
        assert_eq!(first.gain, second.gain);
        assert_eq!(first.rsi, second.rsi);
    }
}
