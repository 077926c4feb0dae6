//! System clock adapter.

use chrono::Utc;

use crate::application::ports::Clock;

/// [`Clock`] backed by the host's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
