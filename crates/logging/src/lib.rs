use arsenal_core::{AppResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder as RollingBuilder, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_KEEP_DAYS: u64 = 7;
const LOG_FILE_PREFIX: &str = "arsenal";
const LOG_LEVEL_ENV: &str = "ARSENAL_LOG_LEVEL";

#[derive(Debug, Clone)]
pub struct LoggingGuard {
    log_dir: PathBuf,
    level: String,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn level(&self) -> &str {
        &self.level
    }
}

// The non-blocking writer stops flushing once its guard drops; parked here
// for the life of the process.
fn worker_guard_slot() -> &'static Mutex<Option<WorkerGuard>> {
    static SLOT: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();
    SLOT.get_or_init(|| Mutex::new(None))
}

pub fn resolve_log_level() -> String {
    let env_level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .map(|value| value.to_ascii_lowercase());
    if let Some(level) = env_level
        && matches!(
            level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        )
    {
        return level;
    }

    if cfg!(debug_assertions) {
        "debug".to_string()
    } else {
        "info".to_string()
    }
}

// Best-effort sweep: entries that cannot be inspected or removed are
// skipped, only an unreadable directory aborts the cleanup.
fn cleanup_expired_logs_with_duration(
    log_dir: &Path,
    keep_duration: Duration,
    now: SystemTime,
) -> AppResult<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(log_dir)
        .with_code("log_dir_unreadable", "读取日志目录失败")
        .with_ctx("log_dir", log_dir.display().to_string())?;

    let mut removed = 0usize;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(modified_at) = entry.metadata().and_then(|meta| meta.modified()) else {
            continue;
        };
        if now.duration_since(modified_at).unwrap_or_default() <= keep_duration {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(error) => tracing::warn!(
                event = "log_file_remove_failed",
                log_path = path.display().to_string(),
                error = error.to_string()
            ),
        }
    }

    Ok(removed)
}

pub fn cleanup_expired_logs(log_dir: &Path, keep_days: u64) -> AppResult<()> {
    let keep_duration = Duration::from_secs(keep_days.saturating_mul(24 * 60 * 60));
    let _ = cleanup_expired_logs_with_duration(log_dir, keep_duration, SystemTime::now())?;
    Ok(())
}

/// Sets up the global subscriber: a daily-rolling plain-text file under
/// `<data_dir>/logs/` plus a console echo in debug builds. Safe to call
/// more than once; only the first call installs the subscriber.
pub fn init_logging(data_dir: &Path) -> AppResult<LoggingGuard> {
    let log_dir = data_dir.join("logs");
    fs::create_dir_all(&log_dir)
        .with_code("log_dir_create_failed", "创建日志目录失败")
        .with_ctx("log_dir", log_dir.display().to_string())?;
    cleanup_expired_logs(&log_dir, DEFAULT_KEEP_DAYS)?;

    let file_appender = RollingBuilder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&log_dir)
        .with_code("log_appender_build_failed", "创建日志写入器失败")
        .with_ctx("log_dir", log_dir.display().to_string())?;
    let (file_writer, worker_guard) = tracing_appender::non_blocking(file_appender);

    if let Ok(mut slot) = worker_guard_slot().lock() {
        *slot = Some(worker_guard);
    }

    let level = resolve_log_level();
    if !tracing::dispatcher::has_been_set() {
        let env_filter = EnvFilter::new(level.clone());
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_writer)
            .with_target(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer);
        #[cfg(debug_assertions)]
        let subscriber = subscriber.with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_target(true),
        );

        subscriber
            .try_init()
            .with_code("log_subscriber_init_failed", "初始化日志订阅器失败")
            .with_ctx("log_level", level.clone())?;
    }

    Ok(LoggingGuard { log_dir, level })
}

#[cfg(test)]
#[path = "../tests/logging/logging_tests.rs"]
mod tests;
