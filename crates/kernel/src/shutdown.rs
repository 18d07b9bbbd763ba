use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const POLL_STEP: Duration = Duration::from_millis(10);

/// Joins a worker thread within `timeout`. A thread that does not stop in
/// time is abandoned and logged, never force-killed; callers only do this
/// when process teardown follows immediately.
pub fn join_with_timeout(handle: JoinHandle<()>, label: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            tracing::warn!(event = "worker_thread_abandoned", label);
            return false;
        }
        std::thread::sleep(POLL_STEP);
    }

    if handle.join().is_err() {
        tracing::error!(event = "worker_thread_panicked", label);
    }
    true
}
