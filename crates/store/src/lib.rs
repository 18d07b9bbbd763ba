mod mirror;
mod persistence;
mod state;
mod store;

pub use mirror::SettingsMirror;
pub use persistence::{SAVE_COALESCE_WINDOW, SaveCoalescer, SaveFailureCallback};
pub use state::{
    ConfigState, RECENT_TOOLS_LIMIT, SEARCH_HISTORY_LIMIT, default_categories,
};
pub use store::{ConfigStore, StorePaths};
