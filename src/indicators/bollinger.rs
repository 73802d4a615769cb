//! Bollinger bands over typical price

use crate::window::Bar;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

/// Trailing Bollinger band values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bollinger {
    /// Rolling mean of typical price
    pub ma: Decimal,
    pub upper: Decimal,
    pub lower: Decimal,
}

fn typical_price(bar: &Bar) -> Decimal {
    (bar.mid_c + bar.mid_h + bar.mid_l) / dec!(3)
}

/// Trailing Bollinger bands: mean of typical price over the last `period`
/// bars, banded at `std_mult` sample standard deviations.
pub fn bollinger(bars: &[Bar], period: usize, std_mult: Decimal) -> Option<Bollinger> {
    if period < 2 || bars.len() < period {
        return None;
    }

    let window = &bars[bars.len() - period..];
    let prices: Vec<Decimal> = window.iter().map(typical_price).collect();
    let n = Decimal::from(period);

    let mean = prices.iter().sum::<Decimal>() / n;
    let sum_sq: Decimal = prices.iter().map(|p| (p - mean) * (p - mean)).sum();
    // Sample standard deviation (n - 1 denominator)
    let variance = sum_sq / (n - Decimal::ONE);
    let stddev = variance.sqrt()?;

    Some(Bollinger {
        ma: mean,
        upper: mean + stddev * std_mult,
        lower: mean - stddev * std_mult,
    })
}
