//! Trait abstraction for the monotonic time source to enable testing

use std::time::Instant;

/// Read-only provider of elapsed milliseconds since some fixed origin.
///
/// The decoder only ever reads the clock; it never sleeps or schedules.
/// The origin is arbitrary as long as the reading never goes backwards.
pub trait MonotonicClock {
    /// Milliseconds elapsed since the clock's origin
    fn now_ms(&self) -> u64;
}

/// Production clock backed by `std::time::Instant`, measuring from the
/// moment it was created.
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock clock for testing with manually advanced time
    #[derive(Clone)]
    pub struct MockClock {
        now_ms: Arc<Mutex<u64>>,
    }

    impl MockClock {
        pub fn new(start_ms: u64) -> Self {
            Self {
                now_ms: Arc::new(Mutex::new(start_ms)),
            }
        }

        pub fn advance(&self, delta_ms: u64) {
            *self.now_ms.lock().unwrap() += delta_ms;
        }

        pub fn set(&self, now_ms: u64) {
            *self.now_ms.lock().unwrap() = now_ms;
        }
    }

    impl MonotonicClock for MockClock {
        fn now_ms(&self) -> u64 {
            *self.now_ms.lock().unwrap()
        }
    }
}
