use arsenal_core::events::{EventSink, LauncherEvent};
use arsenal_core::models::{InstallTarget, ToolRecord};
use arsenal_kernel::join_with_timeout;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const OUTPUT_TAIL_LINES: usize = 20;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(1000);

struct InstallJob {
    tool_id: String,
    tool_name: String,
    target: InstallTarget,
}

enum Message {
    Install(InstallJob),
    Quit,
}

/// Runs pip installs on a dedicated worker thread, streaming output
/// line-by-line through the event sink. One install at a time; queued jobs
/// wait their turn.
pub struct PipInstaller {
    sender: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl PipInstaller {
    pub fn spawn(sink: EventSink) -> Self {
        let (sender, receiver) = mpsc::channel::<Message>();
        let handle = thread::Builder::new()
            .name("pip-install".to_string())
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    match message {
                        Message::Install(job) => run_install(&job, &sink),
                        Message::Quit => break,
                    }
                }
            })
            .ok();

        if handle.is_none() {
            tracing::error!(event = "install_thread_spawn_failed");
        }
        Self { sender, handle }
    }

    pub fn install(&self, record: &ToolRecord, target: InstallTarget) {
        let job = InstallJob {
            tool_id: record.id.clone(),
            tool_name: record.name.clone(),
            target,
        };
        if self.sender.send(Message::Install(job)).is_err() {
            tracing::warn!(event = "install_after_stop", tool = record.name);
        }
    }

    pub fn shutdown(mut self) {
        let _ = self.sender.send(Message::Quit);
        if let Some(handle) = self.handle.take() {
            join_with_timeout(handle, "pip-install", SHUTDOWN_TIMEOUT);
        }
    }
}

impl Drop for PipInstaller {
    fn drop(&mut self) {
        let _ = self.sender.send(Message::Quit);
        if let Some(handle) = self.handle.take() {
            join_with_timeout(handle, "pip-install", SHUTDOWN_TIMEOUT);
        }
    }
}

fn run_install(job: &InstallJob, sink: &EventSink) {
    tracing::info!(
        event = "install_started",
        tool = job.tool_name,
        target = format!("{:?}", job.target)
    );

    if let InstallTarget::Requirements { .. } = &job.target {
        // Outdated pip frequently fails requirement resolution; the upgrade
        // itself failing is not fatal.
        match run_pip(job, &["install", "--upgrade", "pip"], sink) {
            Ok(true) => {}
            Ok(false) => tracing::warn!(event = "pip_self_upgrade_failed", tool = job.tool_name),
            Err(detail) => {
                tracing::warn!(event = "pip_self_upgrade_failed", tool = job.tool_name, detail)
            }
        }
    }

    let result = match &job.target {
        InstallTarget::Requirements { path } => {
            run_pip(job, &["install", "-r", path.as_str()], sink)
        }
        InstallTarget::Module { name } => run_pip(job, &["install", name.as_str()], sink),
    };

    let (ok, detail) = match result {
        Ok(ok) => (ok, if ok { "安装完成".to_string() } else { "安装失败".to_string() }),
        Err(detail) => (false, detail),
    };
    tracing::info!(event = "install_finished", tool = job.tool_name, ok);
    sink(LauncherEvent::InstallFinished {
        tool_id: job.tool_id.clone(),
        ok,
        detail,
    });
}

/// Runs `python -m pip <args>`, streaming every output line as an
/// `InstallProgress` event. Returns whether pip exited successfully; on
/// failure the error string carries the output tail.
fn run_pip(job: &InstallJob, pip_args: &[&str], sink: &EventSink) -> Result<bool, String> {
    let mut child = Command::new("python")
        .arg("-m")
        .arg("pip")
        .args(pip_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| format!("无法启动 pip: {error}"))?;

    let tail = Arc::new(Mutex::new(VecDeque::<String>::new()));

    let stderr_reader = child.stderr.take().map(|pipe| {
        let sink = Arc::clone(sink);
        let tail = Arc::clone(&tail);
        let tool_id = job.tool_id.clone();
        thread::spawn(move || stream_lines(pipe, &tool_id, &sink, &tail))
    });
    if let Some(pipe) = child.stdout.take() {
        stream_lines(pipe, &job.tool_id, sink, &tail);
    }
    if let Some(reader) = stderr_reader {
        let _ = reader.join();
    }

    let status = child
        .wait()
        .map_err(|error| format!("等待 pip 退出失败: {error}"))?;
    if status.success() {
        Ok(true)
    } else {
        let tail = tail.lock().map(|lines| {
            lines.iter().cloned().collect::<Vec<_>>().join("\n")
        });
        match tail {
            Ok(tail) if !tail.is_empty() => Err(tail),
            _ => Ok(false),
        }
    }
}

fn stream_lines(
    pipe: impl Read,
    tool_id: &str,
    sink: &EventSink,
    tail: &Mutex<VecDeque<String>>,
) {
    for line in BufReader::new(pipe).lines() {
        let Ok(line) = line else { break };
        if let Ok(mut tail) = tail.lock() {
            if tail.len() == OUTPUT_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.clone());
        }
        sink(LauncherEvent::InstallProgress {
            tool_id: tool_id.to_string(),
            line,
        });
    }
}

#[cfg(test)]
#[path = "../tests/launcher/installer_tests.rs"]
mod tests;
