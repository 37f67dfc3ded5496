use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One-shot completion signal.
///
/// Fires at most once. Waiting after it fired returns immediately, so a
/// waiter that arrives late never misses the signal.
#[derive(Debug, Default)]
pub struct CompletionLatch {
    fired: Mutex<bool>,
    cond: Condvar,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the latch and wake all waiters. Later calls are no-ops.
    pub fn fire(&self) {
        let mut fired = self.lock();
        if !*fired {
            *fired = true;
            self.cond.notify_all();
        }
    }

    pub fn is_fired(&self) -> bool {
        *self.lock()
    }

    /// Block until the latch fires or `timeout` elapses. Returns whether it fired.
    pub fn wait(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (fired, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
        *fired
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    use super::*;

    #[test]
    fn wait_times_out_when_not_fired() {
        let latch = CompletionLatch::new();
        let started = Instant::now();
        assert!(!latch.wait(Duration::from_millis(20)));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn zero_timeout_does_not_block() {
        let latch = CompletionLatch::new();
        assert!(!latch.wait(Duration::ZERO));
    }

    #[test]
    fn wait_after_fire_returns_immediately() {
        let latch = CompletionLatch::new();
        latch.fire();
        assert!(latch.wait(Duration::ZERO));
        assert!(latch.is_fired());
    }

    #[test]
    fn fire_wakes_waiters() {
        let latch = Arc::new(CompletionLatch::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let latch = Arc::clone(&latch);
                thread::spawn(move || latch.wait(Duration::from_secs(5)))
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        latch.fire();
        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }

    #[test]
    fn double_fire_is_harmless() {
        let latch = CompletionLatch::new();
        latch.fire();
        latch.fire();
        assert!(latch.is_fired());
    }
}
