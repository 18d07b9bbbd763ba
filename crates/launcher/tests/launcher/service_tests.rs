use super::*;

use arsenal_core::models::ToolKind;
use std::sync::Mutex;
use std::sync::mpsc as channel;
use std::time::Instant;

struct FixedProbe(Option<InstallTarget>);

impl DependencyProbe for FixedProbe {
    fn check(&self, _record: &ToolRecord) -> arsenal_core::AppResult<Option<InstallTarget>> {
        Ok(self.0.clone())
    }
}

struct RecordingOpener(Mutex<Vec<String>>);

impl TargetOpener for RecordingOpener {
    fn open(&self, target: &str) -> arsenal_core::AppResult<()> {
        self.0.lock().expect("targets lock").push(target.to_string());
        Ok(())
    }
}

fn event_channel() -> (EventSink, channel::Receiver<LauncherEvent>) {
    let (sender, receiver) = channel::channel::<LauncherEvent>();
    let sink: EventSink = Arc::new(move |event| {
        let _ = sender.send(event);
    });
    (sink, receiver)
}

fn recv(receiver: &channel::Receiver<LauncherEvent>) -> LauncherEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    receiver
        .recv_timeout(deadline.saturating_duration_since(Instant::now()))
        .expect("launcher event")
}

#[test]
fn should_surface_install_required_instead_of_spawning() {
    let (sink, receiver) = event_channel();
    let target = InstallTarget::Module {
        name: "requests".to_string(),
    };
    let service = LauncherService::with_probe(sink, Arc::new(FixedProbe(Some(target.clone()))));

    let tool = ToolRecord::new("Scanner", "/opt/scanner.py", "漏洞扫描", ToolKind::Python);
    service.launch(tool.clone());

    match recv(&receiver) {
        LauncherEvent::InstallRequired {
            record,
            target: reported,
        } => {
            assert_eq!(record.id, tool.id);
            assert_eq!(reported, target);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    service.shutdown();
}

#[test]
fn should_emit_launch_failed_for_placeholder() {
    let (sink, receiver) = event_channel();
    let service = LauncherService::with_probe(sink, Arc::new(FixedProbe(None)));

    let tool = ToolRecord::new("分组占位", "", "信息收集", ToolKind::Placeholder);
    service.launch(tool.clone());

    match recv(&receiver) {
        LauncherEvent::LaunchFailed { tool_id, error } => {
            assert_eq!(tool_id, tool.id);
            assert_eq!(error.code, "placeholder_not_launchable");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    service.shutdown();
}

#[test]
fn should_emit_launch_failed_when_the_program_is_missing() {
    let (sink, receiver) = event_channel();
    let service = LauncherService::with_probe(sink, Arc::new(FixedProbe(None)));

    let ghost = std::env::temp_dir().join(format!("arsenal-ghost-{}.exe", uuid::Uuid::new_v4()));
    let tool = ToolRecord::new("Ghost", ghost.to_string_lossy().to_string(), "信息收集", ToolKind::Exe);
    service.launch(tool.clone());

    match recv(&receiver) {
        LauncherEvent::LaunchFailed { tool_id, error } => {
            assert_eq!(tool_id, tool.id);
            assert_eq!(error.code, "launch_spawn_failed");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    service.shutdown();
}

#[test]
fn should_report_url_hand_off_without_a_pid() {
    let (sink, receiver) = event_channel();
    let opener = Arc::new(RecordingOpener(Mutex::new(Vec::new())));
    let service = LauncherService::with_parts(
        sink,
        Arc::new(FixedProbe(None)),
        Arc::clone(&opener) as Arc<dyn TargetOpener>,
    );

    let tool = ToolRecord::new(
        "CyberChef",
        "https://gchq.github.io/CyberChef/",
        "编码与解码",
        ToolKind::Url,
    );
    service.launch(tool.clone());

    match recv(&receiver) {
        LauncherEvent::Launched { tool_id, pid } => {
            assert_eq!(tool_id, tool.id);
            assert_eq!(pid, None);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(
        opener.0.lock().expect("targets lock").clone(),
        vec!["https://gchq.github.io/CyberChef/".to_string()]
    );
    service.shutdown();
}

#[test]
fn should_skip_the_probe_when_rechecking_is_disabled() {
    let (sink, receiver) = event_channel();
    // A probe that would always demand an install must not be consulted.
    let target = InstallTarget::Module {
        name: "requests".to_string(),
    };
    let service = LauncherService::with_probe(sink, Arc::new(FixedProbe(Some(target))));

    let ghost = std::env::temp_dir().join(format!("arsenal-ghost-{}.py", uuid::Uuid::new_v4()));
    let tool = ToolRecord::new("Scanner", ghost.to_string_lossy().to_string(), "漏洞扫描", ToolKind::Python);
    service.launch_without_check(tool.clone());

    match recv(&receiver) {
        // python itself may be absent; either way the probe was skipped and
        // a real spawn was attempted.
        LauncherEvent::Launched { tool_id, pid } => {
            assert_eq!(tool_id, tool.id);
            assert!(pid.is_some());
        }
        LauncherEvent::LaunchFailed { tool_id, .. } => assert_eq!(tool_id, tool.id),
        other => panic!("unexpected event: {other:?}"),
    }
    service.shutdown();
}
