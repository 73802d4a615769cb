//! Bounded log of recent signal rows

use super::types::SignalRow;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared ring of the most recent signal rows across all instruments,
/// optionally mirrored to a JSON file for external inspection.
#[derive(Clone)]
pub struct SignalLog {
    inner: Arc<RwLock<VecDeque<SignalRow>>>,
    capacity: usize,
    dump_path: Option<PathBuf>,
}

impl SignalLog {
    pub fn new(capacity: usize, dump_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            dump_path,
        }
    }

    /// Record a row, evicting the oldest when full
    pub async fn push(&self, row: SignalRow) {
        let snapshot = {
            let mut rows = self.inner.write().await;
            if rows.len() == self.capacity {
                rows.pop_front();
            }
            rows.push_back(row);
            self.dump_path
                .as_ref()
                .map(|_| rows.iter().cloned().collect::<Vec<_>>())
        };

        if let (Some(path), Some(rows)) = (self.dump_path.as_ref(), snapshot) {
            match serde_json::to_string_pretty(&rows) {
                Ok(json) => {
                    if let Err(error) = tokio::fs::write(path, json).await {
                        tracing::warn!(path = %path.display(), %error, "Failed to dump signal log");
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "Failed to serialize signal log");
                }
            }
        }
    }

    /// Most recent rows, oldest first
    pub async fn recent(&self) -> Vec<SignalRow> {
        self.inner.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::PatternFlags;
    use crate::signal::Signal;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn row(minute: i64) -> SignalRow {
        SignalRow {
            id: Uuid::new_v4(),
            symbol: "XAUUSD".to_string(),
            time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
            signal: Signal::None,
            mid_c: dec!(2000),
            mid_o: dec!(1999),
            spread: dec!(0.3),
            sl: Decimal::ZERO,
            tp: Decimal::ZERO,
            gain: dec!(1.5),
            loss: Decimal::ZERO,
            rsi: Some(dec!(55)),
            ema: Some(dec!(1990)),
            patterns: PatternFlags::default(),
        }
    }

    #[tokio::test]
    async fn test_log_keeps_only_newest() {
        let log = SignalLog::new(3, None);
        for minute in 0..5 {
            log.push(row(minute)).await;
        }

        let rows = log.recent().await;
        assert_eq!(rows.len(), 3);
        let minutes: Vec<i64> = rows
            .iter()
            .map(|r| (r.time.timestamp() % 3600) / 60)
            .collect();
        assert_eq!(minutes, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_log_dumps_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.json");
        let log = SignalLog::new(10, Some(path.clone()));

        log.push(row(0)).await;
        log.push(row(1)).await;

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let rows: Vec<SignalRow> = serde_json::from_str(&content).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "XAUUSD");
    }

    #[tokio::test]
    async fn test_log_empty() {
        let log = SignalLog::new(5, None);
        assert!(log.is_empty().await);
        assert_eq!(log.len().await, 0);
    }
}
