use crate::depcheck::{DependencyProbe, StderrProbe};
use crate::dispatch::{SystemOpener, TargetOpener, dispatch};
use crate::installer::PipInstaller;
use crate::search::SearchWorker;
use arsenal_core::events::{EventSink, LauncherEvent};
use arsenal_core::models::{InstallTarget, LaunchOutcome, ToolRecord};
use arsenal_kernel::join_with_timeout;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(1000);

struct LaunchRequest {
    record: ToolRecord,
    dependency_check: bool,
}

enum Message {
    Launch(LaunchRequest),
    Quit,
}

/// Facade over the worker threads: launch, debounced search and pip
/// install. All results come back through the event sink; the interaction
/// thread applies them to store state.
pub struct LauncherService {
    launch_sender: Sender<Message>,
    launch_handle: Option<JoinHandle<()>>,
    search: SearchWorker,
    installer: PipInstaller,
}

impl LauncherService {
    pub fn spawn(sink: EventSink) -> Self {
        Self::with_parts(sink, Arc::new(StderrProbe), Arc::new(SystemOpener))
    }

    pub fn with_probe(sink: EventSink, probe: Arc<dyn DependencyProbe>) -> Self {
        Self::with_parts(sink, probe, Arc::new(SystemOpener))
    }

    pub fn with_parts(
        sink: EventSink,
        probe: Arc<dyn DependencyProbe>,
        opener: Arc<dyn TargetOpener>,
    ) -> Self {
        let (launch_sender, receiver) = mpsc::channel::<Message>();
        let launch_sink = Arc::clone(&sink);
        let launch_handle = thread::Builder::new()
            .name("launch".to_string())
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    match message {
                        Message::Launch(request) => {
                            handle_launch(&request, probe.as_ref(), opener.as_ref(), &launch_sink)
                        }
                        Message::Quit => break,
                    }
                }
            })
            .ok();

        if launch_handle.is_none() {
            tracing::error!(event = "launch_thread_spawn_failed");
        }

        Self {
            launch_sender,
            launch_handle,
            search: SearchWorker::spawn(Arc::clone(&sink)),
            installer: PipInstaller::spawn(sink),
        }
    }

    /// Queues a launch with dependency pre-flight enabled.
    pub fn launch(&self, record: ToolRecord) {
        self.send_launch(record, true);
    }

    /// Queues a launch skipping the dependency probe; used to re-trigger the
    /// original launch after a successful install.
    pub fn launch_without_check(&self, record: ToolRecord) {
        self.send_launch(record, false);
    }

    fn send_launch(&self, record: ToolRecord, dependency_check: bool) {
        let request = LaunchRequest {
            record,
            dependency_check,
        };
        if self.launch_sender.send(Message::Launch(request)).is_err() {
            tracing::warn!(event = "launch_after_stop");
        }
    }

    /// Debounced search over a snapshot of the registry.
    pub fn request_search(&self, query: impl Into<String>, records: Vec<ToolRecord>) {
        self.search.request(query, records);
    }

    pub fn install(&self, record: &ToolRecord, target: InstallTarget) {
        self.installer.install(record, target);
    }

    /// Stops every worker, joining each with a bounded timeout.
    pub fn shutdown(mut self) {
        let _ = self.launch_sender.send(Message::Quit);
        if let Some(handle) = self.launch_handle.take() {
            join_with_timeout(handle, "launch", SHUTDOWN_TIMEOUT);
        }
        self.search.shutdown();
        self.installer.shutdown();
    }
}

fn handle_launch(
    request: &LaunchRequest,
    probe: &dyn DependencyProbe,
    opener: &dyn TargetOpener,
    sink: &EventSink,
) {
    let record = &request.record;
    match dispatch(record, request.dependency_check, probe, opener) {
        Ok(LaunchOutcome::Spawned { pid }) => sink(LauncherEvent::Launched {
            tool_id: record.id.clone(),
            pid: Some(pid),
        }),
        Ok(LaunchOutcome::Opened) => sink(LauncherEvent::Launched {
            tool_id: record.id.clone(),
            pid: None,
        }),
        Ok(LaunchOutcome::InstallRequired { target }) => sink(LauncherEvent::InstallRequired {
            record: record.clone(),
            target,
        }),
        Err(error) => {
            tracing::warn!(
                event = "launch_failed",
                tool = record.name,
                error = error.to_string()
            );
            sink(LauncherEvent::LaunchFailed {
                tool_id: record.id.clone(),
                error,
            });
        }
    }
}

#[cfg(test)]
#[path = "../tests/launcher/service_tests.rs"]
mod tests;
