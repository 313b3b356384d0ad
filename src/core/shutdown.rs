//! Cooperative shutdown signal shared by the tick and every channel thread

use log::warn;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Process-wide stop flag
///
/// Clones share the same flag. Background loops poll [`is_triggered`] once per
/// iteration; blocking socket calls are unblocked separately by closing the
/// sockets.
///
/// [`is_triggered`]: ShutdownSignal::is_triggered
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns false if it was already requested.
    pub fn trigger(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    /// Check if shutdown has been requested
    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Join a worker thread, giving up after `timeout`
///
/// Returns true if the thread finished in time. A thread still running at the
/// deadline is left detached; it exits on its own once its blocking call
/// returns and it sees the shutdown signal.
pub fn join_bounded(handle: JoinHandle<()>, timeout: Duration) -> bool {
    let name = handle.thread().name().unwrap_or("unnamed").to_string();
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            warn!("Thread {} did not stop within {:?}, detaching", name, timeout);
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    if handle.join().is_err() {
        warn!("Thread {} panicked", name);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let signal = ShutdownSignal::new();
        let other = signal.clone();
        assert!(!other.is_triggered());
        assert!(signal.trigger());
        assert!(other.is_triggered());
        assert!(!other.trigger());
    }

    #[test]
    fn test_join_bounded_finished_thread() {
        let handle = thread::spawn(|| {});
        assert!(join_bounded(handle, Duration::from_secs(1)));
    }

    #[test]
    fn test_join_bounded_gives_up() {
        let signal = ShutdownSignal::new();
        let worker_signal = signal.clone();
        let handle = thread::spawn(move || {
            while !worker_signal.is_triggered() {
                thread::sleep(Duration::from_millis(5));
            }
        });
        assert!(!join_bounded(handle, Duration::from_millis(30)));
        signal.trigger();
    }
}
