//! # fxbot
//!
//! Forex trading bot for a TickTrader-style venue. A WebSocket feed folds
//! live quotes into per-instrument rolling candle windows, a REST poller
//! keeps those windows converged with the venue's history, and each new
//! complete bar runs once through the signal pipeline: Bollinger bands and
//! RSI produce a signal, candlestick patterns annotate it, and actionable
//! signals become risk-sized market orders with stop-loss and take-profit.
//!
//! ## Architecture
//!
//! - [`feed`]: WebSocket tick stream with HMAC login
//! - [`venue`]: REST client for bars, orders and positions
//! - [`window`]: rolling bar windows, checkpointing, new-bar clock
//! - [`indicators`]: Bollinger, RSI, EMA, candlestick patterns
//! - [`signal`]: per-bar evaluation pipeline and the signal log
//! - [`risk`] / [`dispatch`]: position sizing and order placement
//! - [`engine`]: per-instrument workers and the task fabric

pub mod cli;
pub mod config;
pub mod decision;
pub mod dispatch;
pub mod engine;
pub mod feed;
pub mod indicators;
pub mod instrument;
pub mod risk;
pub mod signal;
pub mod telemetry;
pub mod venue;
pub mod window;
pub mod ws;
