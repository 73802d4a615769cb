//! Reconnecting WebSocket transport
//!
//! The feed layer drives a single bidirectional connection: frames out for
//! login and subscription, events in for ticks and connection lifecycle.

mod client;

pub use client::WsClient;

use std::time::Duration;

/// WebSocket connection configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Maximum reconnection attempts before giving up (0 = infinite)
    pub max_reconnect_attempts: u32,
    /// Initial delay before the first reconnection attempt
    pub initial_reconnect_delay: Duration,
    /// Cap on the exponential backoff delay
    pub max_reconnect_delay: Duration,
    /// Interval for outbound ping frames
    pub ping_interval: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 0,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl WsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set maximum reconnection attempts (0 = infinite)
    pub fn max_reconnects(mut self, n: u32) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    /// Set initial reconnection delay
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_reconnect_delay = d;
        self
    }

    /// Set maximum reconnection delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_reconnect_delay = d;
        self
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }
}

/// Events delivered to the connection consumer
#[derive(Debug, Clone)]
pub enum WsEvent {
    /// Text frame from the server
    Text(String),
    /// A (re)connection was established; session state must be rebuilt
    Connected,
    /// The connection is gone and will not be retried
    Disconnected,
    /// Reconnecting after a failure
    Reconnecting { attempt: u32 },
}

/// WebSocket transport errors
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("maximum reconnection attempts exceeded")]
    MaxReconnectsExceeded,
    #[error("send failed: {0}")]
    SendFailed(String),
}
