//! Order dispatch
//!
//! Takes an actionable trade decision through the venue-side checks:
//! refuse to stack positions on a symbol, refuse a zero size, then submit
//! and require an acknowledged order id.

use crate::decision::TradeDecision;
use crate::instrument::Instrument;
use crate::risk::RiskSizer;
use crate::venue::{OrderRequest, OrderTicket, VenueApi, VenueError};
use rust_decimal::Decimal;
use std::sync::Arc;

/// What became of a dispatched decision
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Order acknowledged by the venue
    Placed(OrderTicket),
    /// The decision carried no actionable signal
    SkippedNoSignal,
    /// A position is already open for this symbol
    SkippedOpenPosition,
    /// Sizing degraded to zero; nothing to submit
    SkippedZeroSize,
}

/// Venue-facing order dispatcher shared by all workers
pub struct OrderDispatcher {
    venue: Arc<dyn VenueApi>,
    sizer: RiskSizer,
}

impl OrderDispatcher {
    pub fn new(venue: Arc<dyn VenueApi>, trade_risk: Decimal) -> Self {
        let sizer = RiskSizer::new(venue.clone(), trade_risk);
        Self { venue, sizer }
    }

    /// Dispatch one decision. Venue failures surface as errors; the
    /// skip cases are ordinary outcomes.
    pub async fn dispatch(
        &self,
        decision: &TradeDecision,
        instrument: &Instrument,
    ) -> Result<DispatchOutcome, VenueError> {
        let Some(side) = decision.signal.side() else {
            return Ok(DispatchOutcome::SkippedNoSignal);
        };

        // Open positions are fetched per dispatch, never cached
        let open = self.venue.open_positions().await?;
        if open.iter().any(|p| p.symbol == decision.symbol) {
            tracing::info!(symbol = %decision.symbol, "Position already open, skipping signal");
            metrics::counter!("orders_skipped_total", "reason" => "open_position").increment(1);
            return Ok(DispatchOutcome::SkippedOpenPosition);
        }

        let size = self.sizer.size_order(instrument, decision.loss).await;
        if size.is_zero() {
            tracing::warn!(symbol = %decision.symbol, "Sized to zero, skipping signal");
            metrics::counter!("orders_skipped_total", "reason" => "zero_size").increment(1);
            return Ok(DispatchOutcome::SkippedZeroSize);
        }

        let request = OrderRequest {
            symbol: decision.symbol.clone(),
            size,
            side,
            stop_loss: decision.sl,
            take_profit: decision.tp,
        };

        let ticket = self.venue.place_order(&request).await?;
        tracing::info!(
            symbol = %decision.symbol,
            side = %side,
            %size,
            order_id = %ticket.order_id,
            "Order placed"
        );
        metrics::counter!("orders_placed_total").increment(1);
        Ok(DispatchOutcome::Placed(ticket))
    }

    /// Close an open position by id
    pub async fn close(&self, position_id: &str) -> Result<(), VenueError> {
        self.venue.close_position(position_id).await?;
        tracing::info!(position_id, "Position closed");
        Ok(())
    }
}
