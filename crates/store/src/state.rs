use arsenal_core::models::ToolRecord;
use serde::{Deserialize, Serialize};

pub const RECENT_TOOLS_LIMIT: usize = 20;
pub const SEARCH_HISTORY_LIMIT: usize = 10;

pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_VIEW_MODE: &str = "list";

pub fn default_categories() -> Vec<String> {
    [
        "信息收集",
        "漏洞扫描",
        "漏洞利用",
        "后渗透",
        "流量与代理",
        "编码与解码",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_view_mode() -> String {
    DEFAULT_VIEW_MODE.to_string()
}

fn default_true() -> bool {
    true
}

/// The full persisted application state. Tool order is insertion order and
/// is meaningful for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigState {
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tools: Vec<ToolRecord>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_view_mode")]
    pub view_mode: String,
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default)]
    pub recent_tools: Vec<String>,
    #[serde(default = "default_true")]
    pub show_status_bar: bool,
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    #[serde(default)]
    pub search_history: Vec<String>,
}

impl Default for ConfigState {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            tools: Vec::new(),
            theme: default_theme(),
            view_mode: default_view_mode(),
            favorites: Vec::new(),
            recent_tools: Vec::new(),
            show_status_bar: true,
            auto_refresh: true,
            search_history: Vec::new(),
        }
    }
}

/// Removes any existing occurrence, inserts at the front, truncates to the
/// bound. Latest occurrence always wins the front position.
pub(crate) fn push_bounded_front(list: &mut Vec<String>, entry: &str, bound: usize) {
    list.retain(|existing| existing != entry);
    list.insert(0, entry.to_string());
    list.truncate(bound);
}
