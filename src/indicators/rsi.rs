//! Relative Strength Index

use crate::window::Bar;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Trailing RSI over mid closes, using simple rolling means of gains and
/// losses across the last `period` close-to-close moves.
///
/// A window with no movement at all has no defined RSI and yields `None`.
/// No losses with gains present saturates at 100; no gains with losses
/// present saturates at 0.
pub fn rsi(bars: &[Bar], period: usize) -> Option<Decimal> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }

    let closes: Vec<Decimal> = bars[bars.len() - period - 1..]
        .iter()
        .map(|b| b.mid_c)
        .collect();

    let mut gain_sum = Decimal::ZERO;
    let mut loss_sum = Decimal::ZERO;
    for pair in closes.windows(2) {
        let diff = pair[1] - pair[0];
        if diff > Decimal::ZERO {
            gain_sum += diff;
        } else {
            loss_sum -= diff;
        }
    }

    let n = Decimal::from(period);
    let avg_gain = gain_sum / n;
    let avg_loss = loss_sum / n;

    if avg_loss.is_zero() {
        if avg_gain.is_zero() {
            // Perfectly flat window: 0/0, undefined
            return None;
        }
        return Some(dec!(100));
    }

    let rs = avg_gain / avg_loss;
    Some(dec!(100) - dec!(100) / (Decimal::ONE + rs))
}
