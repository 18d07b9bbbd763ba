use arsenal_core::{AppResult, ResultExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Flat string key/value settings file kept alongside the primary config
/// for backward compatibility. Every key holds a JSON-encoded value; loads
/// fall back here when the primary config is corrupt.
#[derive(Debug, Clone)]
pub struct SettingsMirror {
    path: PathBuf,
}

impl SettingsMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads one key, deserializing its JSON payload. Absent keys and
    /// malformed payloads both read as `None`; a corrupt mirror must degrade
    /// to defaults, not fail the load.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.read_entries()?;
        let raw = entries.get(key)?;
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(
                    event = "settings_mirror_value_invalid",
                    key,
                    error = error.to_string()
                );
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        self.set_batch(&[(key, serde_json::to_string(value).with_code(
            "settings_mirror_serialize_failed",
            "序列化设置项失败",
        )?)])
    }

    /// Writes several keys in one pass; values are pre-encoded JSON strings.
    pub fn set_batch(&self, entries: &[(&str, String)]) -> AppResult<()> {
        let mut current = self.read_entries().unwrap_or_default();
        for (key, value) in entries {
            current.insert((*key).to_string(), value.clone());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_code("settings_mirror_dir_create_failed", "创建设置目录失败")
                .with_ctx("path", parent.to_string_lossy().to_string())?;
        }

        let serialized = serde_json::to_string_pretty(&current)
            .with_code("settings_mirror_serialize_failed", "序列化设置失败")?;
        fs::write(&self.path, serialized)
            .with_code("settings_mirror_write_failed", "写入设置文件失败")
            .with_ctx("path", self.path.to_string_lossy().to_string())
    }

    pub fn encode<T: Serialize>(value: &T) -> AppResult<String> {
        serde_json::to_string(value)
            .with_code("settings_mirror_serialize_failed", "序列化设置项失败")
    }

    fn read_entries(&self) -> Option<BTreeMap<String, String>> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(error) => {
                tracing::warn!(
                    event = "settings_mirror_file_invalid",
                    path = self.path.to_string_lossy().to_string(),
                    error = error.to_string()
                );
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/store/mirror_tests.rs"]
mod tests;
