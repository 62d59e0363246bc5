use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic millisecond source used for action cooldowns.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        self.origin
            .elapsed()
            .as_millis()
            .min(u64::MAX as u128) as u64
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    pub fn advance(&self, millis: u64) -> u64 {
        let previous = self.now.fetch_add(millis, Ordering::SeqCst);
        previous.saturating_add(millis)
    }

    pub fn advance_duration(&self, duration: Duration) -> u64 {
        self.advance(duration.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_millis(), 100);
        assert_eq!(clock.advance(50), 150);
        assert_eq!(clock.advance_duration(Duration::from_secs(1)), 1150);
        clock.set(7);
        assert_eq!(clock.now_millis(), 7);
    }

    #[test]
    fn monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::new();
        let first = clock.now_millis();
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.now_millis() >= first);
        assert!(clock.elapsed() >= Duration::from_millis(2));
    }
}
