//! Per-instrument new-bar readiness tracking

use chrono::{DateTime, Utc};

/// Tracks the last complete bar timestamp seen for an instrument and
/// reports readiness exactly once per strictly newer observation.
///
/// This is the sole trigger for a poll-driven pipeline run: ties and
/// regressions never signal ready.
#[derive(Debug, Clone, Default)]
pub struct BarClock {
    last_time: Option<DateTime<Utc>>,
}

impl BarClock {
    /// Seed the clock with the feed's last complete bar at startup
    pub fn new(last_time: Option<DateTime<Utc>>) -> Self {
        Self { last_time }
    }

    /// Observe the feed's current last-complete-bar timestamp.
    ///
    /// Returns true and advances exactly once per distinct increase;
    /// repeats and decreases return false.
    pub fn observe(&mut self, current: DateTime<Utc>) -> bool {
        match self.last_time {
            Some(last) if current <= last => false,
            _ => {
                self.last_time = Some(current);
                true
            }
        }
    }

    /// Last observed complete-bar timestamp
    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.last_time
    }
}
