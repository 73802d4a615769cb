//! Exponential moving average

use crate::window::Bar;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Trailing span-form EMA of mid closes with adjusted weights, so early
/// values are means of what exists rather than seeded from the first close.
/// Requires at least `span` bars.
pub fn ema(bars: &[Bar], span: usize) -> Option<Decimal> {
    if span == 0 || bars.len() < span {
        return None;
    }

    let alpha = dec!(2) / Decimal::from(span + 1);
    let decay = Decimal::ONE - alpha;

    // Adjusted form: numerator and denominator decay together
    let mut numerator = Decimal::ZERO;
    let mut denominator = Decimal::ZERO;
    for bar in bars {
        numerator = bar.mid_c + decay * numerator;
        denominator = Decimal::ONE + decay * denominator;
    }

    Some(numerator / denominator)
}
