use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TOOL_COLOR: &str = "#000000";

/// Closed set of launch behaviors. Unknown tags in persisted data fall back
/// to `Exe`, the generic-executable behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Exe,
    Java8,
    Java11,
    Java8Gui,
    Java11Gui,
    Python,
    Powershell,
    Batch,
    Url,
    Folder,
    Placeholder,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exe => "exe",
            Self::Java8 => "java8",
            Self::Java11 => "java11",
            Self::Java8Gui => "java8_gui",
            Self::Java11Gui => "java11_gui",
            Self::Python => "python",
            Self::Powershell => "powershell",
            Self::Batch => "batch",
            Self::Url => "url",
            Self::Folder => "folder",
            Self::Placeholder => "placeholder",
        }
    }

    /// Parses a persisted tag. Anything unrecognized degrades to `Exe`
    /// instead of failing the whole config load.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "java8" => Self::Java8,
            "java11" => Self::Java11,
            "java8_gui" => Self::Java8Gui,
            "java11_gui" => Self::Java11Gui,
            "python" => Self::Python,
            "powershell" => Self::Powershell,
            "batch" => Self::Batch,
            "url" => Self::Url,
            "folder" => Self::Folder,
            "placeholder" => Self::Placeholder,
            _ => Self::Exe,
        }
    }

    pub fn is_java(&self) -> bool {
        matches!(
            self,
            Self::Java8 | Self::Java11 | Self::Java8Gui | Self::Java11Gui
        )
    }
}

impl Default for ToolKind {
    fn default() -> Self {
        Self::Exe
    }
}

impl<'de> Deserialize<'de> for ToolKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

fn generate_record_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_color() -> String {
    DEFAULT_TOOL_COLOR.to_string()
}

/// One registered launchable entry. Field names match the historical
/// on-disk JSON; `sub_category` is accepted as a legacy alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Generated at creation; all store mutations address records by id.
    #[serde(default = "generate_record_id")]
    pub id: String,
    pub name: String,
    pub path: String,
    pub category: String,
    #[serde(default, alias = "sub_category")]
    pub subcategory: String,
    #[serde(rename = "tool_type", default)]
    pub kind: ToolKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_path: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub launch_count: u32,
    #[serde(default)]
    pub last_launch: Option<String>,
    #[serde(default)]
    pub args: String,
}

impl ToolRecord {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        category: impl Into<String>,
        kind: ToolKind,
    ) -> Self {
        Self {
            id: generate_record_id(),
            name: name.into(),
            path: path.into(),
            category: category.into(),
            subcategory: String::new(),
            kind,
            description: String::new(),
            icon_path: None,
            color: default_color(),
            launch_count: 0,
            last_launch: None,
            args: String::new(),
        }
    }

    /// Records a successful launch: bumps the counter by exactly one and
    /// stamps the ISO-8601 launch time.
    pub fn record_launch(&mut self) {
        self.launch_count = self.launch_count.saturating_add(1);
        self.last_launch = Some(Local::now().to_rfc3339_opts(SecondsFormat::Secs, false));
    }

    /// Raw `args` split on whitespace. No quoting or escaping rules; quoted
    /// arguments containing spaces will be split apart.
    pub fn split_args(&self) -> Vec<String> {
        self.args.split_whitespace().map(str::to_string).collect()
    }
}

/// What to install before a Python tool can run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "target")]
pub enum InstallTarget {
    /// A sibling `requirements.txt` discovered next to the script.
    Requirements { path: String },
    /// A single module name parsed from a `ModuleNotFoundError`.
    Module { name: String },
}

/// Terminal result of one dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// A real child process was spawned.
    Spawned { pid: u32 },
    /// Fire-and-forget OS hand-off (url/folder); no process id exists.
    Opened,
    /// Dependencies must be installed first; nothing was spawned.
    InstallRequired { target: InstallTarget },
}

#[cfg(test)]
#[path = "../tests/core/models_tests.rs"]
mod tests;
