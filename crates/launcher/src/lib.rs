pub mod depcheck;
pub mod dispatch;
pub mod installer;
pub mod search;
pub mod service;

pub use depcheck::{DependencyProbe, StderrProbe};
pub use dispatch::{CommandSpec, SystemOpener, TargetOpener, build_command, dispatch};
pub use installer::PipInstaller;
pub use search::{SEARCH_DEBOUNCE_WINDOW, SearchWorker, search_tools};
pub use service::LauncherService;
