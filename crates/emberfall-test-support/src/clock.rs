//! Pinned time for tests.

use chrono::{DateTime, Utc};
use emberfall_core::clock::Clock;

/// A `Clock` frozen at the instant it was built with. Diary and scene
/// timestamps under test compare exactly against it.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
