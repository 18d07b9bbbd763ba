use crate::mirror::SettingsMirror;
use crate::state::{
    ConfigState, RECENT_TOOLS_LIMIT, SEARCH_HISTORY_LIMIT, default_categories, push_bounded_front,
};
use arsenal_core::models::ToolRecord;
use arsenal_core::{AppError, AppResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const SETTINGS_FILE_NAME: &str = "settings.json";

const KEY_CATEGORIES: &str = "categories";
const KEY_TOOLS: &str = "tools";
const KEY_THEME: &str = "theme";
const KEY_VIEW_MODE: &str = "view_mode";
const KEY_FAVORITES: &str = "favorites";
const KEY_RECENT_TOOLS: &str = "recent_tools";
const KEY_SHOW_STATUS_BAR: &str = "show_status_bar";
const KEY_AUTO_REFRESH: &str = "auto_refresh";
const KEY_SEARCH_HISTORY: &str = "search_history";

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub config_path: PathBuf,
    pub settings_path: PathBuf,
}

impl StorePaths {
    pub fn under(data_dir: &Path) -> Self {
        Self {
            config_path: data_dir.join(CONFIG_FILE_NAME),
            settings_path: data_dir.join(SETTINGS_FILE_NAME),
        }
    }
}

/// Sole owner of the registered-tool collection. Mutated only on the
/// interaction thread; workers receive cloned snapshots.
#[derive(Debug)]
pub struct ConfigStore {
    paths: StorePaths,
    mirror: SettingsMirror,
    state: ConfigState,
}

impl ConfigStore {
    /// Loads state, preferring the JSON config file. Any read or parse
    /// failure degrades to per-key reads from the settings mirror with
    /// hardcoded defaults; this never fails.
    pub fn load(paths: StorePaths) -> Self {
        let mirror = SettingsMirror::new(paths.settings_path.clone());
        let state = match Self::load_primary(&paths.config_path) {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(
                    event = "config_primary_load_failed_mirror_fallback",
                    path = paths.config_path.to_string_lossy().to_string(),
                    error = error.to_string()
                );
                Self::load_from_mirror(&mirror)
            }
        };

        tracing::info!(
            event = "config_loaded",
            categories = state.categories.len(),
            tools = state.tools.len()
        );
        Self {
            paths,
            mirror,
            state,
        }
    }

    fn load_primary(config_path: &Path) -> AppResult<ConfigState> {
        let raw = fs::read_to_string(config_path)
            .with_code("config_read_failed", "读取配置文件失败")
            .with_ctx("path", config_path.to_string_lossy().to_string())?;
        serde_json::from_str(&raw)
            .with_code("config_parse_failed", "解析配置文件失败")
            .with_ctx("path", config_path.to_string_lossy().to_string())
    }

    fn load_from_mirror(mirror: &SettingsMirror) -> ConfigState {
        let defaults = ConfigState::default();
        ConfigState {
            categories: mirror.get(KEY_CATEGORIES).unwrap_or(default_categories()),
            tools: mirror.get(KEY_TOOLS).unwrap_or_default(),
            theme: mirror.get(KEY_THEME).unwrap_or(defaults.theme),
            view_mode: mirror.get(KEY_VIEW_MODE).unwrap_or(defaults.view_mode),
            favorites: mirror.get(KEY_FAVORITES).unwrap_or_default(),
            recent_tools: mirror.get(KEY_RECENT_TOOLS).unwrap_or_default(),
            show_status_bar: mirror.get(KEY_SHOW_STATUS_BAR).unwrap_or(true),
            auto_refresh: mirror.get(KEY_AUTO_REFRESH).unwrap_or(true),
            search_history: mirror.get(KEY_SEARCH_HISTORY).unwrap_or_default(),
        }
    }

    /// Writes the full state to the settings mirror (best effort) and then
    /// the JSON file (atomic, temp file + rename). A JSON write failure is
    /// returned to the caller; in-memory state is never rolled back.
    pub fn save(&self) -> AppResult<()> {
        save_state(&self.paths, &self.mirror, &self.state)
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn state(&self) -> &ConfigState {
        &self.state
    }

    /// Cloned snapshot for worker threads and coalesced persistence.
    pub fn snapshot(&self) -> ConfigState {
        self.state.clone()
    }

    pub fn tools(&self) -> &[ToolRecord] {
        &self.state.tools
    }

    pub fn find_tool(&self, id: &str) -> Option<&ToolRecord> {
        self.state.tools.iter().find(|record| record.id == id)
    }

    pub fn find_tool_mut(&mut self, id: &str) -> Option<&mut ToolRecord> {
        self.state.tools.iter_mut().find(|record| record.id == id)
    }

    pub fn add_tool(&mut self, record: ToolRecord) {
        self.state.tools.push(record);
    }

    /// Overwrites user-editable fields; id and launch counters survive.
    pub fn update_tool(&mut self, id: &str, updated: ToolRecord) -> AppResult<()> {
        let record = self
            .find_tool_mut(id)
            .ok_or_else(|| AppError::new("tool_not_found", "工具不存在").with_context("id", id))?;

        record.name = updated.name;
        record.path = updated.path;
        record.category = updated.category;
        record.subcategory = updated.subcategory;
        record.kind = updated.kind;
        record.description = updated.description;
        record.icon_path = updated.icon_path;
        record.color = updated.color;
        record.args = updated.args;
        Ok(())
    }

    pub fn remove_tool(&mut self, id: &str) -> AppResult<ToolRecord> {
        let position = self
            .state
            .tools
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| AppError::new("tool_not_found", "工具不存在").with_context("id", id))?;
        Ok(self.state.tools.remove(position))
    }

    pub fn add_category(&mut self, name: &str) -> AppResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::new("category_name_empty", "分类名称不能为空"));
        }
        if self.state.categories.iter().any(|existing| existing == name) {
            return Err(
                AppError::new("category_exists", "分类已存在").with_context("category", name)
            );
        }
        self.state.categories.push(name.to_string());
        Ok(())
    }

    /// Renames a category; records inside it follow.
    pub fn rename_category(&mut self, from: &str, to: &str) -> AppResult<()> {
        let to = to.trim();
        if to.is_empty() {
            return Err(AppError::new("category_name_empty", "分类名称不能为空"));
        }

        let slot = self
            .state
            .categories
            .iter_mut()
            .find(|existing| existing.as_str() == from)
            .ok_or_else(|| {
                AppError::new("category_not_found", "分类不存在").with_context("category", from)
            })?;
        *slot = to.to_string();

        for record in &mut self.state.tools {
            if record.category == from {
                record.category = to.to_string();
            }
        }
        Ok(())
    }

    /// Removes a category and drops every record registered under it.
    pub fn remove_category(&mut self, name: &str) -> AppResult<usize> {
        let before = self.state.categories.len();
        self.state.categories.retain(|existing| existing != name);
        if self.state.categories.len() == before {
            return Err(
                AppError::new("category_not_found", "分类不存在").with_context("category", name)
            );
        }

        let tools_before = self.state.tools.len();
        self.state.tools.retain(|record| record.category != name);
        Ok(tools_before - self.state.tools.len())
    }

    pub fn add_to_recent(&mut self, name: &str) {
        push_bounded_front(&mut self.state.recent_tools, name, RECENT_TOOLS_LIMIT);
    }

    pub fn add_search_history(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        push_bounded_front(&mut self.state.search_history, text, SEARCH_HISTORY_LIMIT);
    }

    pub fn add_to_favorites(&mut self, name: &str) {
        if !self.state.favorites.iter().any(|existing| existing == name) {
            self.state.favorites.push(name.to_string());
        }
    }

    pub fn remove_from_favorites(&mut self, name: &str) {
        self.state.favorites.retain(|existing| existing != name);
    }

    pub fn set_theme(&mut self, theme: &str) {
        self.state.theme = theme.to_string();
    }
}

/// Mirror first (best effort, logged), then the JSON file atomically.
pub(crate) fn save_state(
    paths: &StorePaths,
    mirror: &SettingsMirror,
    state: &ConfigState,
) -> AppResult<()> {
    if let Err(error) = write_settings_mirror(mirror, state) {
        tracing::warn!(
            event = "settings_mirror_write_failed",
            error = error.to_string()
        );
    }
    write_config_file(&paths.config_path, state)
}

fn write_settings_mirror(mirror: &SettingsMirror, state: &ConfigState) -> AppResult<()> {
    let entries = [
        (KEY_CATEGORIES, SettingsMirror::encode(&state.categories)?),
        (KEY_TOOLS, SettingsMirror::encode(&state.tools)?),
        (KEY_THEME, SettingsMirror::encode(&state.theme)?),
        (KEY_VIEW_MODE, SettingsMirror::encode(&state.view_mode)?),
        (KEY_FAVORITES, SettingsMirror::encode(&state.favorites)?),
        (
            KEY_RECENT_TOOLS,
            SettingsMirror::encode(&state.recent_tools)?,
        ),
        (
            KEY_SHOW_STATUS_BAR,
            SettingsMirror::encode(&state.show_status_bar)?,
        ),
        (
            KEY_AUTO_REFRESH,
            SettingsMirror::encode(&state.auto_refresh)?,
        ),
        (
            KEY_SEARCH_HISTORY,
            SettingsMirror::encode(&state.search_history)?,
        ),
    ];
    mirror.set_batch(&entries)
}

/// Atomic full-state write: serialize, write a sibling temp file, rename
/// over the target.
fn write_config_file(path: &Path, state: &ConfigState) -> AppResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| AppError::new("config_path_invalid", "配置文件路径无效"))?;
    fs::create_dir_all(parent)
        .with_code("config_dir_create_failed", "创建配置目录失败")
        .with_ctx("path", parent.to_string_lossy().to_string())?;

    let serialized = serde_json::to_string_pretty(state)
        .with_code("config_serialize_failed", "序列化配置失败")?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, serialized)
        .with_code("config_write_failed", "写入配置文件失败")
        .with_ctx("path", temp_path.to_string_lossy().to_string())?;
    fs::rename(&temp_path, path)
        .with_code("config_replace_failed", "替换配置文件失败")
        .with_ctx("path", path.to_string_lossy().to_string())
}

#[cfg(test)]
#[path = "../tests/store/store_tests.rs"]
mod tests;
