//! Candlestick pattern detection
//!
//! Trailing-bar classification over mid prices. All body and shadow
//! measures are percentages of the bar's full range; a zero-range bar is
//! guarded with an epsilon so nothing divides by zero.

use crate::window::Bar;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const HANGING_MAN_BODY: Decimal = dec!(15.0);
const HANGING_MAN_HEIGHT: Decimal = dec!(75.0);
const SHOOTING_STAR_HEIGHT: Decimal = dec!(25.0);
const SPINNING_TOP_MIN: Decimal = dec!(40.0);
const SPINNING_TOP_MAX: Decimal = dec!(60.0);
const MARUBOZU: Decimal = dec!(98.0);
const ENGULFING_FACTOR: Decimal = dec!(1.1);
const MORNING_STAR_PREV2_BODY: Decimal = dec!(90.0);
const MORNING_STAR_PREV_BODY: Decimal = dec!(10.0);
const TWEEZER_BODY: Decimal = dec!(15.0);
const TWEEZER_HL: Decimal = dec!(0.01);
const TWEEZER_TOP_BODY: Decimal = dec!(40.0);
const TWEEZER_BOTTOM_BODY: Decimal = dec!(60.0);
/// Shadow must be twice the body for a pin bar
const PIN_BAR_SHADOW_RATIO: Decimal = dec!(2.0);

const RANGE_EPSILON: Decimal = dec!(0.000000001);

/// Pattern hits on the most recent bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PatternFlags {
    pub hanging_man: bool,
    pub shooting_star: bool,
    pub spinning_top: bool,
    pub marubozu: bool,
    pub engulfing: bool,
    pub tweezer_top: bool,
    pub tweezer_bottom: bool,
    pub morning_star: bool,
    pub evening_star: bool,
    pub piercing_line: bool,
    pub pin_bar: bool,
    pub three_white_soldiers: bool,
}

impl PatternFlags {
    /// Names of the patterns that fired
    pub fn active(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut push = |hit: bool, name: &'static str| {
            if hit {
                names.push(name);
            }
        };
        push(self.hanging_man, "hanging_man");
        push(self.shooting_star, "shooting_star");
        push(self.spinning_top, "spinning_top");
        push(self.marubozu, "marubozu");
        push(self.engulfing, "engulfing");
        push(self.tweezer_top, "tweezer_top");
        push(self.tweezer_bottom, "tweezer_bottom");
        push(self.morning_star, "morning_star");
        push(self.evening_star, "evening_star");
        push(self.piercing_line, "piercing_line");
        push(self.pin_bar, "pin_bar");
        push(self.three_white_soldiers, "three_white_soldiers");
        names
    }
}

/// Per-bar measures the pattern rules compare
struct CandleProps {
    direction: i8,
    body_size: Decimal,
    body_perc: Decimal,
    body_lower: Decimal,
    body_upper: Decimal,
    body_bottom_perc: Decimal,
    body_top_perc: Decimal,
    mid_point: Decimal,
    open: Decimal,
    close: Decimal,
    high: Decimal,
    low: Decimal,
}

impl CandleProps {
    fn from_bar(bar: &Bar) -> Self {
        let delta = bar.mid_c - bar.mid_o;
        let direction = if delta >= Decimal::ZERO { 1 } else { -1 };
        let body_size = delta.abs();
        let full_range = bar.mid_h - bar.mid_l;
        let safe_range = if full_range.is_zero() {
            RANGE_EPSILON
        } else {
            full_range
        };

        let body_lower = bar.mid_c.min(bar.mid_o);
        let body_upper = bar.mid_c.max(bar.mid_o);

        Self {
            direction,
            body_size,
            body_perc: body_size / safe_range * dec!(100),
            body_lower,
            body_upper,
            body_bottom_perc: (body_lower - bar.mid_l) / safe_range * dec!(100),
            body_top_perc: dec!(100) - (bar.mid_h - body_upper) / safe_range * dec!(100),
            mid_point: full_range / dec!(2) + bar.mid_l,
            open: bar.mid_o,
            close: bar.mid_c,
            high: bar.mid_h,
            low: bar.mid_l,
        }
    }
}

/// Percentage change from prev to cur; undefined when prev is zero
fn pct_change(prev: Decimal, cur: Decimal) -> Option<Decimal> {
    if prev.is_zero() {
        None
    } else {
        Some((cur - prev) / prev * dec!(100))
    }
}

fn within(change: Option<Decimal>, limit: Decimal) -> bool {
    matches!(change, Some(c) if c.abs() < limit)
}

fn star(cur: &CandleProps, prev: &CandleProps, prev2: &CandleProps, direction: i8) -> bool {
    prev2.body_perc > MORNING_STAR_PREV2_BODY
        && prev.body_perc < MORNING_STAR_PREV_BODY
        && cur.direction == direction
        && prev2.direction != direction
        && ((direction == 1 && cur.close > prev2.mid_point)
            || (direction == -1 && cur.close < prev2.mid_point))
}

/// Classify the most recent bar against the full pattern catalogue.
/// Needs three bars of context; shallower windows report no patterns.
pub fn pattern_flags(bars: &[Bar]) -> Option<PatternFlags> {
    if bars.len() < 3 {
        return None;
    }

    let cur = CandleProps::from_bar(&bars[bars.len() - 1]);
    let prev = CandleProps::from_bar(&bars[bars.len() - 2]);
    let prev2 = CandleProps::from_bar(&bars[bars.len() - 3]);

    let body_size_change = pct_change(prev.body_size, cur.body_size);
    let low_change = pct_change(prev.low, cur.low);
    let high_change = pct_change(prev.high, cur.high);

    let tweezer_shape = within(body_size_change, TWEEZER_BODY)
        && cur.direction != prev.direction
        && within(low_change, TWEEZER_HL)
        && within(high_change, TWEEZER_HL);

    let upper_shadow = cur.high - cur.body_upper;
    let lower_shadow = cur.body_lower - cur.low;
    let bullish_pin = lower_shadow > PIN_BAR_SHADOW_RATIO * cur.body_size
        && upper_shadow < cur.body_size;
    let bearish_pin = upper_shadow > PIN_BAR_SHADOW_RATIO * cur.body_size
        && lower_shadow < cur.body_size;

    Some(PatternFlags {
        hanging_man: cur.body_bottom_perc > HANGING_MAN_HEIGHT && cur.body_perc < HANGING_MAN_BODY,
        shooting_star: cur.body_top_perc < SHOOTING_STAR_HEIGHT
            && cur.body_perc < HANGING_MAN_BODY,
        spinning_top: cur.body_bottom_perc > SPINNING_TOP_MIN
            && cur.body_bottom_perc < SPINNING_TOP_MAX
            && cur.body_perc < HANGING_MAN_BODY,
        marubozu: cur.body_perc > MARUBOZU,
        engulfing: cur.direction != prev.direction
            && cur.body_size > prev.body_size * ENGULFING_FACTOR,
        tweezer_top: tweezer_shape && cur.direction == -1 && cur.body_top_perc < TWEEZER_TOP_BODY,
        tweezer_bottom: tweezer_shape
            && cur.direction == 1
            && cur.body_bottom_perc > TWEEZER_BOTTOM_BODY,
        morning_star: star(&cur, &prev, &prev2, 1),
        evening_star: star(&cur, &prev, &prev2, -1),
        piercing_line: prev.direction == -1
            && cur.direction == 1
            && cur.open < prev.close
            && cur.close > prev.mid_point,
        pin_bar: bullish_pin || bearish_pin,
        three_white_soldiers: prev2.direction == 1
            && prev.direction == 1
            && cur.direction == 1
            && prev.open > prev2.close
            && cur.open > prev.close,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ohlc(minute: i64, o: Decimal, h: Decimal, l: Decimal, c: Decimal) -> Bar {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute);
        Bar::from_quotes(time, (o, h, l, c), (o, h, l, c))
    }

    // Unremarkable down-then-up filler that trips none of the single-bar rules
    fn filler(minute: i64) -> Bar {
        ohlc(minute, dec!(50), dec!(80), dec!(20), dec!(40))
    }

    #[test]
    fn test_needs_three_bars() {
        assert!(pattern_flags(&[filler(0), filler(1)]).is_none());
    }

    #[test]
    fn test_marubozu() {
        let bars = vec![filler(0), filler(1), ohlc(2, dec!(1), dec!(2), dec!(1), dec!(2))];
        let flags = pattern_flags(&bars).unwrap();
        assert!(flags.marubozu);
        assert!(!flags.hanging_man);
    }

    #[test]
    fn test_hanging_man() {
        // Tiny body at the top of a long range
        let bars = vec![
            filler(0),
            filler(1),
            ohlc(2, dec!(90), dec!(100), dec!(0), dec!(95)),
        ];
        let flags = pattern_flags(&bars).unwrap();
        assert!(flags.hanging_man);
        assert!(!flags.shooting_star);
    }

    #[test]
    fn test_shooting_star() {
        // Tiny body at the bottom of a long range
        let bars = vec![
            filler(0),
            filler(1),
            ohlc(2, dec!(5), dec!(100), dec!(0), dec!(10)),
        ];
        let flags = pattern_flags(&bars).unwrap();
        assert!(flags.shooting_star);
        assert!(!flags.hanging_man);
    }

    #[test]
    fn test_spinning_top() {
        let bars = vec![
            filler(0),
            filler(1),
            ohlc(2, dec!(45), dec!(100), dec!(0), dec!(50)),
        ];
        let flags = pattern_flags(&bars).unwrap();
        assert!(flags.spinning_top);
    }

    #[test]
    fn test_engulfing() {
        let bars = vec![
            filler(0),
            ohlc(1, dec!(10), dec!(10.2), dec!(8.8), dec!(9)),
            ohlc(2, dec!(9), dec!(11.2), dec!(8.9), dec!(11)),
        ];
        let flags = pattern_flags(&bars).unwrap();
        assert!(flags.engulfing);
    }

    #[test]
    fn test_bullish_pin_bar() {
        // Long lower shadow, small upper shadow
        let bars = vec![
            filler(0),
            filler(1),
            ohlc(2, dec!(9.8), dec!(10.1), dec!(9), dec!(10)),
        ];
        let flags = pattern_flags(&bars).unwrap();
        assert!(flags.pin_bar);
    }

    #[test]
    fn test_three_white_soldiers() {
        let bars = vec![
            ohlc(0, dec!(1), dec!(2.1), dec!(0.9), dec!(2)),
            ohlc(1, dec!(2.5), dec!(3.6), dec!(2.4), dec!(3.5)),
            ohlc(2, dec!(3.6), dec!(4.6), dec!(3.5), dec!(4.5)),
        ];
        let flags = pattern_flags(&bars).unwrap();
        assert!(flags.three_white_soldiers);
    }

    #[test]
    fn test_piercing_line() {
        let bars = vec![
            filler(0),
            ohlc(1, dec!(10), dec!(10.1), dec!(7.9), dec!(8)),
            ohlc(2, dec!(7.5), dec!(9.6), dec!(7.4), dec!(9.5)),
        ];
        let flags = pattern_flags(&bars).unwrap();
        assert!(flags.piercing_line);
    }

    #[test]
    fn test_zero_range_bar_is_safe() {
        let bars = vec![
            filler(0),
            filler(1),
            ohlc(2, dec!(10), dec!(10), dec!(10), dec!(10)),
        ];
        let flags = pattern_flags(&bars).unwrap();
        assert!(!flags.marubozu);
        assert!(!flags.hanging_man);
        assert!(!flags.pin_bar);
    }

    #[test]
    fn test_active_names() {
        let bars = vec![filler(0), filler(1), ohlc(2, dec!(1), dec!(2), dec!(1), dec!(2))];
        let flags = pattern_flags(&bars).unwrap();
        assert_eq!(flags.active(), vec!["marubozu"]);
    }
}
