use crossbeam_utils::Backoff;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// An atomic integer cell with wait/notify support.
///
/// The value itself lives in an `AtomicUsize`, so loads, stores and
/// read-modify-write operations are lock-free and take caller-supplied
/// orderings. Blocking is layered on top: a waiter first spins with an
/// adaptive [`Backoff`] (Crossbeam's spin → yield progression), then parks
/// on a condvar. Notifiers take the park lock before signalling, so a waiter
/// that re-checked the value just before parking cannot miss its wakeup.
///
/// The predicate wait is therefore not strictly wait-free: a parked waiter
/// depends on a notification (or timeout) to re-examine the value. All
/// non-waiting operations are lock-free.
pub struct WaitCell {
    value: AtomicUsize,
    lock: Mutex<()>,
    cond: Condvar,
}

impl WaitCell {
    /// Creates a cell holding `value`.
    pub fn new(value: usize) -> Self {
        Self {
            value: AtomicUsize::new(value),
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    #[inline]
    pub fn load(&self, order: Ordering) -> usize {
        self.value.load(order)
    }

    #[inline]
    pub fn store(&self, value: usize, order: Ordering) {
        self.value.store(value, order);
    }

    #[inline]
    pub fn compare_exchange(
        &self,
        current: usize,
        new: usize,
        success: Ordering,
        failure: Ordering,
    ) -> Result<usize, usize> {
        self.value.compare_exchange(current, new, success, failure)
    }

    #[inline]
    pub fn compare_exchange_weak(
        &self,
        current: usize,
        new: usize,
        success: Ordering,
        failure: Ordering,
    ) -> Result<usize, usize> {
        self.value.compare_exchange_weak(current, new, success, failure)
    }

    /// Adds `delta`, returning the previous value.
    #[inline]
    pub fn fetch_add(&self, delta: usize, order: Ordering) -> usize {
        self.value.fetch_add(delta, order)
    }

    /// Subtracts `delta`, returning the previous value.
    #[inline]
    pub fn fetch_sub(&self, delta: usize, order: Ordering) -> usize {
        self.value.fetch_sub(delta, order)
    }

    /// Blocks while the value equals `old`.
    ///
    /// Returns immediately if the value already differs. The load uses
    /// `order`.
    pub fn wait(&self, old: usize, order: Ordering) {
        self.wait_until(order, |v| v != old);
    }

    /// Blocks while the value equals `old`, for at most `timeout`.
    ///
    /// Returns `true` if the value was observed to differ from `old` within
    /// the timeout, `false` otherwise.
    pub fn wait_timeout(&self, old: usize, timeout: Duration, order: Ordering) -> bool {
        self.wait_until_timeout(timeout, order, |v| v != old)
    }

    /// Blocks until `pred(value)` holds. The loads use `order`.
    pub fn wait_until<P: Fn(usize) -> bool>(&self, order: Ordering, pred: P) {
        // Fast path: spin a little before paying for the park lock.
        let backoff = Backoff::new();
        while !backoff.is_completed() {
            if pred(self.value.load(order)) {
                return;
            }
            backoff.snooze();
        }

        let mut guard = self.lock_guard();
        while !pred(self.value.load(order)) {
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until `pred(value)` holds or `timeout` elapses.
    ///
    /// Returns `true` iff the predicate held when the wait ended.
    pub fn wait_until_timeout<P: Fn(usize) -> bool>(
        &self,
        timeout: Duration,
        order: Ordering,
        pred: P,
    ) -> bool {
        let deadline = Instant::now() + timeout;

        let backoff = Backoff::new();
        while !backoff.is_completed() {
            if pred(self.value.load(order)) {
                return true;
            }
            backoff.snooze();
        }

        let mut guard = self.lock_guard();
        loop {
            if pred(self.value.load(order)) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, timed_out) = match self.cond.wait_timeout(guard, deadline - now) {
                Ok((g, t)) => (g, t.timed_out()),
                Err(poisoned) => {
                    let (g, t) = poisoned.into_inner();
                    (g, t.timed_out())
                }
            };
            guard = next;
            if timed_out {
                return pred(self.value.load(order));
            }
        }
    }

    /// Wakes one parked waiter.
    ///
    /// Taking the park lock first closes the race with a waiter that has
    /// checked the value but not yet parked.
    pub fn notify_one(&self) {
        drop(self.lock_guard());
        self.cond.notify_one();
    }

    /// Wakes all parked waiters.
    pub fn notify_all(&self) {
        drop(self.lock_guard());
        self.cond.notify_all();
    }

    fn lock_guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
