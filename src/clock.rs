//! Clock pair used for timestamp reconciliation
//!
//! The scanner process stamps each line with its wall clock in epoch
//! milliseconds. To re-express that send time in the local monotonic
//! clock's domain, decoding needs a simultaneous reading of both
//! clocks, taken at the moment the line is handled.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// One simultaneous reading of the wall clock and the monotonic clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockPair {
    /// Wall-clock time in epoch milliseconds
    pub system_ms: i64,
    /// Monotonic clock in seconds since an arbitrary origin
    pub monotonic_s: f64,
}

/// Monotonic clock anchored at construction time
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose monotonic origin is "now"
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Read both clocks at once
    pub fn now(&self) -> ClockPair {
        let system_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        ClockPair {
            system_ms,
            monotonic_s: self.origin.elapsed().as_secs_f64(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_advances() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = clock.now();
        assert!(b.monotonic_s > a.monotonic_s);
        assert!(b.system_ms >= a.system_ms);
    }
}
