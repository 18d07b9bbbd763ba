use arsenal_core::events::{EventSink, LauncherEvent};
use arsenal_kernel::join_with_timeout;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessesToUpdate, System};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const POLL_SLEEP_STEP: Duration = Duration::from_millis(100);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(1000);

/// Watches launched tool processes and reports through the event sink when
/// one disappears from the process table. Best effort only: a pid the
/// process table cannot answer for is treated as gone.
pub struct ProcessMonitor {
    tracked: Arc<Mutex<HashMap<String, u32>>>,
    running: Arc<AtomicBool>,
    sampler_started: AtomicBool,
    poll_interval: Duration,
    sink: EventSink,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProcessMonitor {
    pub fn new(sink: EventSink) -> Self {
        Self::with_poll_interval(sink, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(sink: EventSink, poll_interval: Duration) -> Self {
        Self {
            tracked: Arc::new(Mutex::new(HashMap::new())),
            running: Arc::new(AtomicBool::new(false)),
            sampler_started: AtomicBool::new(false),
            poll_interval: poll_interval.max(POLL_SLEEP_STEP),
            sink,
            handle: Mutex::new(None),
        }
    }

    pub fn track(&self, name: impl Into<String>, pid: u32) {
        let name = name.into();
        tracing::debug!(event = "process_tracked", tool = name, pid);
        lock_unpoisoned(&self.tracked).insert(name, pid);
    }

    pub fn untrack(&self, name: &str) {
        lock_unpoisoned(&self.tracked).remove(name);
    }

    pub fn tracked(&self) -> Vec<(String, u32)> {
        lock_unpoisoned(&self.tracked)
            .iter()
            .map(|(name, pid)| (name.clone(), *pid))
            .collect()
    }

    /// Starts the sampler thread. Idempotent; only the first call spawns.
    pub fn start(&self) -> bool {
        if self.sampler_started.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.running.store(true, Ordering::Release);

        let tracked = Arc::clone(&self.tracked);
        let running = Arc::clone(&self.running);
        let sink = Arc::clone(&self.sink);
        let poll_interval = self.poll_interval;
        let spawned = thread::Builder::new()
            .name("process-monitor".to_string())
            .spawn(move || {
                let mut system = System::new();
                while running.load(Ordering::Acquire) {
                    sweep_dead_processes(&mut system, &tracked, &sink);

                    // Sleep in small steps so shutdown is not held for a
                    // full poll interval.
                    let deadline = Instant::now() + poll_interval;
                    while running.load(Ordering::Acquire) && Instant::now() < deadline {
                        thread::sleep(POLL_SLEEP_STEP);
                    }
                }
            })
            .ok();

        match spawned {
            Some(handle) => {
                *lock_unpoisoned(&self.handle) = Some(handle);
                true
            }
            None => {
                tracing::error!(event = "monitor_thread_spawn_failed");
                self.sampler_started.store(false, Ordering::Release);
                self.running.store(false, Ordering::Release);
                false
            }
        }
    }

    /// Stops the sampler and joins it with a bounded timeout.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = lock_unpoisoned(&self.handle).take() {
            join_with_timeout(handle, "process-monitor", SHUTDOWN_TIMEOUT);
        }
    }
}

impl Drop for ProcessMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One poll pass: refresh the tracked pids, emit `ProcessExited` for every
/// pid no longer alive and drop it from the map.
fn sweep_dead_processes(
    system: &mut System,
    tracked: &Mutex<HashMap<String, u32>>,
    sink: &EventSink,
) {
    let watched: Vec<(String, u32)> = lock_unpoisoned(tracked)
        .iter()
        .map(|(name, pid)| (name.clone(), *pid))
        .collect();
    if watched.is_empty() {
        return;
    }

    let pids: Vec<Pid> = watched.iter().map(|(_, pid)| Pid::from_u32(*pid)).collect();
    system.refresh_processes(ProcessesToUpdate::Some(&pids), true);

    for (name, pid) in watched {
        if system.process(Pid::from_u32(pid)).is_some() {
            continue;
        }
        lock_unpoisoned(tracked).remove(&name);
        tracing::info!(event = "process_exited", tool = name, pid);
        sink(LauncherEvent::ProcessExited { name, pid });
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
#[path = "../tests/monitor/monitor_tests.rs"]
mod tests;
