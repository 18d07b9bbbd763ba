use crate::models::{InstallTarget, ToolRecord};
use arsenal_protocol::AppError;
use std::sync::Arc;

/// Everything a worker reports back to the interaction thread. Workers never
/// touch presentation state; the owner applies these sequentially.
#[derive(Debug, Clone)]
pub enum LauncherEvent {
    Launched {
        tool_id: String,
        pid: Option<u32>,
    },
    LaunchFailed {
        tool_id: String,
        error: AppError,
    },
    InstallRequired {
        record: ToolRecord,
        target: InstallTarget,
    },
    InstallProgress {
        tool_id: String,
        line: String,
    },
    InstallFinished {
        tool_id: String,
        ok: bool,
        detail: String,
    },
    SearchFinished {
        query: String,
        hits: Vec<SearchHit>,
    },
    ProcessExited {
        name: String,
        pid: u32,
    },
}

/// One scored search result. `score` is zero when the query was empty and
/// the whole collection was returned unscored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub record: ToolRecord,
    pub score: i64,
}

pub type EventSink = Arc<dyn Fn(LauncherEvent) + Send + Sync>;

/// Sink that drops every event. Useful for tests and detached workers.
pub fn noop_sink() -> EventSink {
    Arc::new(|_event| {})
}
