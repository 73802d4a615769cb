//! Signal generation
//!
//! Evaluates one instrument's window into a signal row: RSI extremes gated
//! by spread, Bollinger-derived stop-loss and take-profit levels, and the
//! pattern catalogue for observability.

mod log;
mod pipeline;
mod types;

pub use log::SignalLog;
pub use pipeline::evaluate;
pub use types::{Signal, SignalRow};
