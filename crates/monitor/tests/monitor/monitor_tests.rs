use super::*;

use std::sync::mpsc as channel;

fn event_channel() -> (EventSink, channel::Receiver<LauncherEvent>) {
    let (sender, receiver) = channel::channel::<LauncherEvent>();
    let sink: EventSink = Arc::new(move |event| {
        let _ = sender.send(event);
    });
    (sink, receiver)
}

#[test]
fn should_track_and_untrack_by_name() {
    let (sink, _receiver) = event_channel();
    let monitor = ProcessMonitor::new(sink);

    monitor.track("Nmap", 4242);
    monitor.track("Burp", 4343);
    monitor.untrack("Nmap");

    assert_eq!(monitor.tracked(), vec![("Burp".to_string(), 4343)]);
}

#[test]
fn should_replace_pid_when_the_same_tool_relaunches() {
    let (sink, _receiver) = event_channel();
    let monitor = ProcessMonitor::new(sink);

    monitor.track("Nmap", 100);
    monitor.track("Nmap", 200);

    assert_eq!(monitor.tracked(), vec![("Nmap".to_string(), 200)]);
}

#[test]
fn should_start_the_sampler_only_once() {
    let (sink, _receiver) = event_channel();
    let monitor = ProcessMonitor::with_poll_interval(sink, Duration::from_millis(100));

    assert!(monitor.start());
    assert!(!monitor.start());
    monitor.stop();
}

#[test]
fn should_emit_process_exited_for_a_dead_pid() {
    let (sink, receiver) = event_channel();
    let monitor = ProcessMonitor::with_poll_interval(sink, Duration::from_millis(100));

    // A short-lived child gives a real pid that is guaranteed dead once
    // waited on.
    let mut child = if cfg!(windows) {
        std::process::Command::new("cmd").args(["/C", "exit"]).spawn()
    } else {
        std::process::Command::new("true").spawn()
    }
    .expect("spawn short-lived child");
    let pid = child.id();
    let _ = child.wait();

    monitor.track("ghost", pid);
    monitor.start();

    let event = receiver
        .recv_timeout(Duration::from_secs(10))
        .expect("exit event");
    match event {
        LauncherEvent::ProcessExited { name, pid: reported } => {
            assert_eq!(name, "ghost");
            assert_eq!(reported, pid);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(monitor.tracked().is_empty());
    monitor.stop();
}

#[test]
fn should_keep_tracking_a_live_process() {
    let (sink, receiver) = event_channel();
    let monitor = ProcessMonitor::with_poll_interval(sink, Duration::from_millis(100));

    let own_pid = std::process::id();
    monitor.track("self", own_pid);
    monitor.start();

    assert!(
        receiver.recv_timeout(Duration::from_millis(500)).is_err(),
        "live process must not be reported as exited"
    );
    assert_eq!(monitor.tracked(), vec![("self".to_string(), own_pid)]);
    monitor.stop();
}
