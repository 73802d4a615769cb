//! Bidirectional WebSocket client with automatic reconnection

use super::{WsConfig, WsError, WsEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Reconnecting WebSocket client
///
/// Each (re)connection emits `Connected` so the consumer can replay its
/// login and subscription frames; session state never survives a drop.
pub struct WsClient {
    config: WsConfig,
}

/// How one connection ended
enum StreamEnd {
    /// Our side is gone (event receiver or frame sender dropped); stop
    ConsumerGone,
    /// The server closed the connection; reconnect
    ServerClosed,
}

impl WsClient {
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Spawn the connection task, returning the event receiver and a
    /// sender for outbound text frames
    pub fn connect(&self) -> (mpsc::Receiver<WsEvent>, mpsc::Sender<String>) {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (frame_tx, frame_rx) = mpsc::channel(256);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::run_connection_loop(config, event_tx, frame_rx).await {
                tracing::error!(error = %e, "WebSocket connection loop failed");
            }
        });

        (event_rx, frame_tx)
    }

    /// Reconnect with exponential backoff until the consumer goes away or
    /// the attempt limit is hit
    async fn run_connection_loop(
        config: WsConfig,
        event_tx: mpsc::Sender<WsEvent>,
        mut frame_rx: mpsc::Receiver<String>,
    ) -> Result<(), WsError> {
        let mut reconnect_attempts = 0;
        let mut reconnect_delay = config.initial_reconnect_delay;

        loop {
            match Self::connect_and_stream(&config, &event_tx, &mut frame_rx).await {
                Ok(StreamEnd::ConsumerGone) => {
                    tracing::info!("Consumer gone, closing WebSocket");
                    return Ok(());
                }
                Ok(StreamEnd::ServerClosed) => {
                    // A clean server close is still a transient outage; the
                    // completed session resets the backoff
                    reconnect_attempts = 0;
                    reconnect_delay = config.initial_reconnect_delay;
                    tracing::info!("Server closed the connection, reconnecting");
                }
                Err(e) => {
                    reconnect_attempts += 1;
                    tracing::warn!(
                        error = %e,
                        attempt = reconnect_attempts,
                        "WebSocket connection error, reconnecting"
                    );

                    if config.max_reconnect_attempts > 0
                        && reconnect_attempts >= config.max_reconnect_attempts
                    {
                        tracing::error!("Max reconnection attempts reached");
                        let _ = event_tx.send(WsEvent::Disconnected).await;
                        return Err(WsError::MaxReconnectsExceeded);
                    }
                }
            }

            if event_tx.is_closed() {
                tracing::info!("Receiver dropped, stopping reconnection");
                return Ok(());
            }

            let _ = event_tx
                .send(WsEvent::Reconnecting {
                    attempt: reconnect_attempts.max(1),
                })
                .await;

            sleep(reconnect_delay).await;
            reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
        }
    }

    /// Drive one connection until it drops
    async fn connect_and_stream(
        config: &WsConfig,
        event_tx: &mpsc::Sender<WsEvent>,
        frame_rx: &mut mpsc::Receiver<String>,
    ) -> Result<StreamEnd, WsError> {
        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async(&config.url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        tracing::info!("WebSocket connected");

        if event_tx.send(WsEvent::Connected).await.is_err() {
            return Ok(StreamEnd::ConsumerGone);
        }

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut awaiting_pong = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if event_tx.send(WsEvent::Text(text)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(StreamEnd::ConsumerGone);
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            awaiting_pong = false;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Received close frame");
                            return Ok(StreamEnd::ServerClosed);
                        }
                        Some(Err(e)) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => {
                            return Err(WsError::ConnectionFailed("stream ended unexpectedly".into()));
                        }
                        _ => {}
                    }
                }

                frame = frame_rx.recv() => {
                    match frame {
                        Some(text) => {
                            write.send(Message::Text(text)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        None => {
                            // Producer side shut down; close cleanly
                            let _ = write.send(Message::Close(None)).await;
                            return Ok(StreamEnd::ConsumerGone);
                        }
                    }
                }

                _ = ping_interval.tick() => {
                    // An unanswered ping from the previous interval means
                    // the connection is dead
                    if awaiting_pong {
                        return Err(WsError::ConnectionFailed("pong timeout".into()));
                    }
                    write.send(Message::Ping(vec![])).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    awaiting_pong = true;
                }
            }
        }
    }
}
