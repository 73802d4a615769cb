//! Technical indicators
//!
//! Pure trailing-value functions over a bar slice. Each returns `None`
//! when the window is too shallow or the value is undefined; callers treat
//! that as "no signal", never as an error.

mod bollinger;
mod ema;
mod patterns;
mod rsi;

pub use bollinger::{bollinger, Bollinger};
pub use ema::ema;
pub use patterns::{pattern_flags, PatternFlags};
pub use rsi::rsi;
