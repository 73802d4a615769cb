//! Risk-budget position sizing
//!
//! Sizes an order so that the stop-loss being hit costs roughly the
//! configured monetary risk. Sizing degrades to zero instead of erroring:
//! a missing pip value or bad instrument metadata must never take the
//! worker down mid-cycle.

use crate::instrument::Instrument;
use crate::venue::VenueApi;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Notional units per one ratio point
const BASE: Decimal = dec!(10000);
/// Smallest order the platform accepts
const PLATFORM_MINIMUM: Decimal = dec!(1);

/// Pure sizing calculation.
///
/// `loss` is the per-unit price distance to the stop-loss, `trade_risk`
/// the monetary budget, `pip_value` the account-currency value of one pip.
/// Returns zero when any input makes the size undefined.
pub fn compute_size(
    instrument: &Instrument,
    loss: Decimal,
    trade_risk: Decimal,
    pip_value: Decimal,
) -> Decimal {
    if instrument.pip_location <= Decimal::ZERO {
        tracing::error!(
            symbol = %instrument.symbol,
            pip_location = %instrument.pip_location,
            "Invalid pip location, sizing to zero"
        );
        return Decimal::ZERO;
    }

    let num_pips = loss / instrument.pip_location;
    if num_pips <= Decimal::ZERO {
        tracing::warn!(symbol = %instrument.symbol, %loss, "Non-positive pip distance, sizing to zero");
        return Decimal::ZERO;
    }

    if pip_value <= Decimal::ZERO {
        tracing::warn!(symbol = %instrument.symbol, "Non-positive pip value, sizing to zero");
        return Decimal::ZERO;
    }

    let per_pip_loss = trade_risk / num_pips;
    let ratio = per_pip_loss / pip_value;
    let raw = BASE * ratio;

    // Quantize down to the instrument's size step, then clamp
    let mut size = (raw / instrument.size_step).floor() * instrument.size_step;
    if size < instrument.min_size {
        tracing::debug!(symbol = %instrument.symbol, %size, min = %instrument.min_size, "Promoting size to instrument minimum");
        size = instrument.min_size;
    } else if size > instrument.max_size {
        tracing::debug!(symbol = %instrument.symbol, %size, max = %instrument.max_size, "Capping size at instrument maximum");
        size = instrument.max_size;
    }

    if size < PLATFORM_MINIMUM {
        return PLATFORM_MINIMUM;
    }
    size
}

/// Venue-backed sizer: fetches the pip value and applies [`compute_size`]
pub struct RiskSizer {
    venue: Arc<dyn VenueApi>,
    trade_risk: Decimal,
}

impl RiskSizer {
    pub fn new(venue: Arc<dyn VenueApi>, trade_risk: Decimal) -> Self {
        Self { venue, trade_risk }
    }

    /// Size an order for the given stop distance. A pip-value lookup
    /// failure yields zero, which the dispatcher treats as "do not trade".
    pub async fn size_order(&self, instrument: &Instrument, loss: Decimal) -> Decimal {
        let pip_values = match self
            .venue
            .pip_values(std::slice::from_ref(&instrument.symbol))
            .await
        {
            Ok(values) => values,
            Err(error) => {
                tracing::error!(symbol = %instrument.symbol, %error, "Pip value fetch failed, sizing to zero");
                return Decimal::ZERO;
            }
        };

        let Some(pip_value) = pip_values.get(&instrument.symbol).copied() else {
            tracing::error!(symbol = %instrument.symbol, "No pip value for symbol, sizing to zero");
            return Decimal::ZERO;
        };

        compute_size(instrument, loss, self.trade_risk, pip_value)
    }
}
