use crate::shutdown::join_with_timeout;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

enum Message<T> {
    Arm(T),
    Flush,
    Quit,
}

/// Coalesces bursts of values into one callback invocation: each `schedule`
/// replaces the pending value and re-arms the quiet window; the callback
/// fires with the latest value once the window elapses without new input.
pub struct Debouncer<T> {
    sender: Sender<Message<T>>,
    handle: Option<JoinHandle<()>>,
    label: &'static str,
}

impl<T> Debouncer<T>
where
    T: Send + 'static,
{
    pub fn spawn(
        label: &'static str,
        window: Duration,
        action: Arc<dyn Fn(T) + Send + Sync>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<Message<T>>();
        let handle = thread::Builder::new()
            .name(format!("debounce-{label}"))
            .spawn(move || {
                let mut pending: Option<T> = None;
                loop {
                    let message = if pending.is_some() {
                        match receiver.recv_timeout(window) {
                            Ok(message) => message,
                            Err(RecvTimeoutError::Timeout) => {
                                if let Some(value) = pending.take() {
                                    action(value);
                                }
                                continue;
                            }
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    } else {
                        match receiver.recv() {
                            Ok(message) => message,
                            Err(_) => break,
                        }
                    };

                    match message {
                        Message::Arm(value) => pending = Some(value),
                        Message::Flush => {
                            if let Some(value) = pending.take() {
                                action(value);
                            }
                        }
                        Message::Quit => {
                            if let Some(value) = pending.take() {
                                action(value);
                            }
                            break;
                        }
                    }
                }
            })
            .ok();

        if handle.is_none() {
            tracing::error!(event = "debounce_thread_spawn_failed", label);
        }

        Self {
            sender,
            handle,
            label,
        }
    }

    /// Replaces any pending value and restarts the quiet window.
    pub fn schedule(&self, value: T) {
        if self.sender.send(Message::Arm(value)).is_err() {
            tracing::warn!(event = "debounce_schedule_after_stop", label = self.label);
        }
    }

    /// Fires the pending value immediately, if any.
    pub fn flush(&self) {
        let _ = self.sender.send(Message::Flush);
    }

    /// Flushes pending work and joins the worker within `timeout`.
    pub fn shutdown(mut self, timeout: Duration) {
        let _ = self.sender.send(Message::Quit);
        if let Some(handle) = self.handle.take() {
            join_with_timeout(handle, self.label, timeout);
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let _ = self.sender.send(Message::Quit);
        if let Some(handle) = self.handle.take() {
            join_with_timeout(handle, self.label, Duration::from_millis(1000));
        }
    }
}

#[cfg(test)]
#[path = "../tests/kernel/debounce_tests.rs"]
mod tests;
