//! Venue WebSocket tick feed
//!
//! Session protocol: send an HMAC-signed Login frame, wait for the Login
//! acknowledgement, then FeedSubscribe for every configured symbol. FeedTick
//! frames carry top-of-book quotes. Reconnects restart the whole handshake.

use super::{Tick, TickFeed};
use crate::config::FeedConfig;
use crate::ws::{WsClient, WsConfig, WsEvent};
use async_trait::async_trait;
use base64::Engine;
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use tokio::sync::mpsc;

type HmacSha256 = Hmac<Sha256>;

/// Credentials for the feed session
#[derive(Clone)]
struct FeedCredentials {
    web_id: String,
    web_key: String,
    web_secret: String,
}

/// Sign `timestamp + web_id + web_key` with the secret, base64-encoded
fn feed_signature(credentials: &FeedCredentials, timestamp: &str) -> String {
    let payload = format!("{}{}{}", timestamp, credentials.web_id, credentials.web_key);
    let mut mac = HmacSha256::new_from_slice(credentials.web_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

fn login_frame(credentials: &FeedCredentials, session_id: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let signature = feed_signature(credentials, &timestamp.to_string());
    serde_json::json!({
        "Id": session_id,
        "Request": "Login",
        "Params": {
            "AuthType": "HMAC",
            "WebApiId": credentials.web_id,
            "WebApiKey": credentials.web_key,
            "Timestamp": timestamp,
            "Signature": signature,
            "DeviceId": "fxbot",
            "AppSessionId": session_id,
        }
    })
    .to_string()
}

fn subscribe_frame(symbols: &[String], session_id: &str) -> String {
    let subscriptions: Vec<serde_json::Value> = symbols
        .iter()
        .map(|symbol| serde_json::json!({"Symbol": symbol, "BookDepth": 1}))
        .collect();
    serde_json::json!({
        "Id": session_id,
        "Request": "FeedSubscribe",
        "Params": {"Subscribe": subscriptions}
    })
    .to_string()
}

/// Envelope common to every server frame
#[derive(Debug, Deserialize)]
struct FeedFrame {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Result")]
    result: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FeedTickResult {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Timestamp")]
    timestamp: i64,
    #[serde(rename = "BestBid")]
    best_bid: QuoteLevel,
    #[serde(rename = "BestAsk")]
    best_ask: QuoteLevel,
}

#[derive(Debug, Deserialize)]
struct QuoteLevel {
    #[serde(rename = "Price")]
    price: Decimal,
}

/// What a server frame means for the session
#[derive(Debug, PartialEq)]
enum FrameAction {
    /// Login accepted; subscribe now
    LoginOk,
    /// Login rejected; drop the connection
    LoginFailed,
    /// Quote update
    Tick(Tick),
    /// Heartbeats, subscription acks and anything else
    Ignore,
}

fn classify_frame(text: &str) -> FrameAction {
    let frame: FeedFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(_) => return FrameAction::Ignore,
    };

    match frame.response.as_str() {
        "Login" => {
            let ok = frame
                .result
                .as_ref()
                .and_then(|r| r.get("Info"))
                .and_then(|i| i.as_str())
                == Some("ok");
            if ok {
                FrameAction::LoginOk
            } else {
                FrameAction::LoginFailed
            }
        }
        "FeedTick" => {
            let Some(result) = frame.result else {
                return FrameAction::Ignore;
            };
            match serde_json::from_value::<FeedTickResult>(result) {
                Ok(tick) => {
                    let Some(time) = Utc.timestamp_millis_opt(tick.timestamp).single() else {
                        return FrameAction::Ignore;
                    };
                    FrameAction::Tick(Tick {
                        symbol: tick.symbol,
                        time,
                        bid: tick.best_bid.price,
                        ask: tick.best_ask.price,
                    })
                }
                Err(error) => {
                    tracing::debug!(%error, "Unparseable FeedTick frame");
                    FrameAction::Ignore
                }
            }
        }
        _ => FrameAction::Ignore,
    }
}

/// WebSocket tick feed against the venue's feed endpoint
pub struct VenueStream {
    ws_url: String,
    credentials: FeedCredentials,
}

impl VenueStream {
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            ws_url: config.ws_url.clone(),
            credentials: FeedCredentials {
                web_id: config.web_id.clone(),
                web_key: config.web_key.clone(),
                web_secret: config.web_secret.clone(),
            },
        }
    }

    async fn run_session_loop(
        mut ws_rx: mpsc::Receiver<WsEvent>,
        frame_tx: mpsc::Sender<String>,
        tick_tx: mpsc::Sender<Tick>,
        credentials: FeedCredentials,
        symbols: Vec<String>,
    ) {
        let session_id = uuid::Uuid::new_v4().to_string();

        while let Some(event) = ws_rx.recv().await {
            match event {
                WsEvent::Connected => {
                    tracing::info!("Feed connected, logging in");
                    if frame_tx
                        .send(login_frame(&credentials, &session_id))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                WsEvent::Text(text) => match classify_frame(&text) {
                    FrameAction::LoginOk => {
                        tracing::info!(symbols = ?symbols, "Feed login ok, subscribing");
                        if frame_tx
                            .send(subscribe_frame(&symbols, &session_id))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    FrameAction::LoginFailed => {
                        tracing::error!("Feed login rejected; check feed credentials");
                        break;
                    }
                    FrameAction::Tick(tick) => {
                        metrics::counter!("feed_ticks_total").increment(1);
                        if tick_tx.send(tick).await.is_err() {
                            tracing::debug!("Tick receiver dropped, stopping feed");
                            break;
                        }
                    }
                    FrameAction::Ignore => {}
                },
                WsEvent::Reconnecting { attempt } => {
                    tracing::warn!(attempt, "Feed reconnecting");
                }
                WsEvent::Disconnected => {
                    tracing::warn!("Feed disconnected");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl TickFeed for VenueStream {
    async fn subscribe(&self, symbols: &[String]) -> anyhow::Result<mpsc::Receiver<Tick>> {
        let (tick_tx, tick_rx) = mpsc::channel(1024);

        tracing::info!(url = %self.ws_url, symbols = ?symbols, "Subscribing to venue feed");

        let client = WsClient::new(WsConfig::new(&self.ws_url));
        let (ws_rx, frame_tx) = client.connect();

        let credentials = self.credentials.clone();
        let symbols = symbols.to_vec();
        tokio::spawn(async move {
            Self::run_session_loop(ws_rx, frame_tx, tick_tx, credentials, symbols).await;
        });

        Ok(tick_rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn credentials() -> FeedCredentials {
        FeedCredentials {
            web_id: "web-id".to_string(),
            web_key: "web-key".to_string(),
            web_secret: "web-secret".to_string(),
        }
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = feed_signature(&credentials(), "1704067200000");
        let b = feed_signature(&credentials(), "1704067200000");
        assert_eq!(a, b);
        // Base64 of a 32-byte digest
        assert_eq!(a.len(), 44);
    }

    #[test]
    fn test_signature_varies_with_timestamp() {
        let a = feed_signature(&credentials(), "1704067200000");
        let b = feed_signature(&credentials(), "1704067200001");
        assert_ne!(a, b);
    }

    #[test]
    fn test_login_frame_shape() {
        let frame = login_frame(&credentials(), "session-1");
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["Request"], "Login");
        assert_eq!(value["Params"]["AuthType"], "HMAC");
        assert_eq!(value["Params"]["WebApiId"], "web-id");
        assert!(value["Params"]["Signature"].as_str().unwrap().len() > 0);
    }

    #[test]
    fn test_subscribe_frame_shape() {
        let frame = subscribe_frame(&["XAUUSD".to_string(), "EURUSD".to_string()], "session-1");
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["Request"], "FeedSubscribe");
        let subs = value["Params"]["Subscribe"].as_array().unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0]["Symbol"], "XAUUSD");
        assert_eq!(subs[0]["BookDepth"], 1);
    }

    #[test]
    fn test_classify_login_ok() {
        let text = r#"{"Response": "Login", "Result": {"Info": "ok"}}"#;
        assert_eq!(classify_frame(text), FrameAction::LoginOk);
    }

    #[test]
    fn test_classify_login_rejected() {
        let text = r#"{"Response": "Login", "Result": {"Info": "bad signature"}}"#;
        assert_eq!(classify_frame(text), FrameAction::LoginFailed);
        let text = r#"{"Response": "Login"}"#;
        assert_eq!(classify_frame(text), FrameAction::LoginFailed);
    }

    #[test]
    fn test_classify_feed_tick() {
        let text = r#"{
            "Response": "FeedTick",
            "Result": {
                "Symbol": "XAUUSD",
                "Timestamp": 1704067200123,
                "BestBid": {"Price": 2050.10, "Volume": 1000},
                "BestAsk": {"Price": 2050.45, "Volume": 1500}
            }
        }"#;
        match classify_frame(text) {
            FrameAction::Tick(tick) => {
                assert_eq!(tick.symbol, "XAUUSD");
                assert_eq!(tick.bid, dec!(2050.10));
                assert_eq!(tick.ask, dec!(2050.45));
                assert_eq!(tick.time.timestamp_millis(), 1704067200123);
            }
            other => panic!("expected tick, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_ignores_unknown_and_invalid() {
        assert_eq!(
            classify_frame(r#"{"Response": "FeedSubscribe", "Result": {}}"#),
            FrameAction::Ignore
        );
        assert_eq!(classify_frame("not json"), FrameAction::Ignore);
        assert_eq!(
            classify_frame(r#"{"Response": "FeedTick", "Result": {"Symbol": "X"}}"#),
            FrameAction::Ignore
        );
    }

    #[tokio::test]
    async fn test_session_loop_handshake_and_ticks() {
        let (ws_tx, ws_rx) = mpsc::channel(16);
        let (frame_tx, mut frame_rx) = mpsc::channel(16);
        let (tick_tx, mut tick_rx) = mpsc::channel(16);

        let handle = tokio::spawn(VenueStream::run_session_loop(
            ws_rx,
            frame_tx,
            tick_tx,
            credentials(),
            vec!["XAUUSD".to_string()],
        ));

        // Connection up: the loop must send a login frame
        ws_tx.send(WsEvent::Connected).await.unwrap();
        let login: serde_json::Value =
            serde_json::from_str(&frame_rx.recv().await.unwrap()).unwrap();
        assert_eq!(login["Request"], "Login");

        // Ack the login: the loop must subscribe
        ws_tx
            .send(WsEvent::Text(
                r#"{"Response": "Login", "Result": {"Info": "ok"}}"#.to_string(),
            ))
            .await
            .unwrap();
        let subscribe: serde_json::Value =
            serde_json::from_str(&frame_rx.recv().await.unwrap()).unwrap();
        assert_eq!(subscribe["Request"], "FeedSubscribe");

        // A tick flows through
        ws_tx
            .send(WsEvent::Text(
                r#"{"Response": "FeedTick", "Result": {"Symbol": "XAUUSD", "Timestamp": 1704067200123, "BestBid": {"Price": 2050.1}, "BestAsk": {"Price": 2050.4}}}"#
                    .to_string(),
            ))
            .await
            .unwrap();
        let tick = tick_rx.recv().await.unwrap();
        assert_eq!(tick.symbol, "XAUUSD");
        assert_eq!(tick.bid, dec!(2050.1));

        ws_tx.send(WsEvent::Disconnected).await.unwrap();
        handle.await.unwrap();
    }
}
