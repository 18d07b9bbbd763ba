use crate::mirror::SettingsMirror;
use crate::state::ConfigState;
use crate::store::{StorePaths, save_state};
use arsenal_core::AppError;
use arsenal_kernel::Debouncer;
use std::sync::Arc;
use std::time::Duration;

pub const SAVE_COALESCE_WINDOW: Duration = Duration::from_millis(500);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(1000);

pub type SaveFailureCallback = Arc<dyn Fn(AppError) + Send + Sync>;

/// Coalesces bursts of state mutations into a single disk write. Each
/// `request_save` takes a snapshot; only the latest snapshot within the
/// quiet window reaches disk.
pub struct SaveCoalescer {
    debouncer: Debouncer<ConfigState>,
}

impl SaveCoalescer {
    pub fn spawn(paths: StorePaths, on_failure: Option<SaveFailureCallback>) -> Self {
        let mirror = SettingsMirror::new(paths.settings_path.clone());
        let action: Arc<dyn Fn(ConfigState) + Send + Sync> = Arc::new(move |state| {
            match save_state(&paths, &mirror, &state) {
                Ok(()) => {
                    tracing::debug!(event = "config_saved", tools = state.tools.len());
                }
                Err(error) => {
                    tracing::error!(event = "config_save_failed", error = error.to_string());
                    if let Some(callback) = &on_failure {
                        callback(error);
                    }
                }
            }
        });
        Self {
            debouncer: Debouncer::spawn("config-save", SAVE_COALESCE_WINDOW, action),
        }
    }

    pub fn request_save(&self, snapshot: ConfigState) {
        self.debouncer.schedule(snapshot);
    }

    /// Writes any pending snapshot immediately.
    pub fn flush(&self) {
        self.debouncer.flush();
    }

    /// Flushes pending work and joins the writer thread.
    pub fn shutdown(self) {
        self.debouncer.shutdown(SHUTDOWN_TIMEOUT);
    }
}

#[cfg(test)]
#[path = "../tests/store/persistence_tests.rs"]
mod tests;
