//! Manually advanced clock

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use reeltime_core::Clock;

/// Clock that only moves when a test advances it.
///
/// Starts at a fixed instant so `at(secs)` can express scenario offsets.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: DateTime<Utc>,
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        let origin = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Self { origin, now: Arc::new(Mutex::new(origin)) }
    }

    /// Instant `secs` seconds after the clock's origin
    pub fn at(&self, secs: i64) -> DateTime<Utc> {
        self.origin + Duration::seconds(secs)
    }

    /// Jump to `secs` seconds after the origin
    pub fn set(&self, secs: i64) {
        *self.now.lock() = self.at(secs);
    }

    pub fn advance(&self, secs: i64) {
        *self.now.lock() += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
