//! System clock adapter

use chrono::{DateTime, Utc};
use sea_application::ports::Clock;

/// Wall-clock time for token expiry and idle tracking.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_match_timestamp() {
        let clock = SystemClock::new();
        let before = Utc::now().timestamp_millis();
        let now = clock.now_millis();
        assert!(now >= before);
        assert!(now - before < 1_000);
    }
}
