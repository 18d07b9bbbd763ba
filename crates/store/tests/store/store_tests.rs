use super::*;

use arsenal_core::models::ToolKind;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("arsenal-store-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn sample_record(name: &str, category: &str) -> ToolRecord {
    ToolRecord::new(name, format!("C:/tools/{name}.exe"), category, ToolKind::Exe)
}

#[test]
fn should_start_from_defaults_when_nothing_is_on_disk() {
    let dir = temp_dir();
    let store = ConfigStore::load(StorePaths::under(&dir));

    assert_eq!(store.state().categories, default_categories());
    assert!(store.tools().is_empty());
    assert_eq!(store.state().theme, "light");
    assert_eq!(store.state().view_mode, "list");
    assert!(store.state().show_status_bar);
    assert!(store.state().auto_refresh);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_roundtrip_state_through_save_and_load() {
    let dir = temp_dir();
    let paths = StorePaths::under(&dir);

    let mut store = ConfigStore::load(paths.clone());
    store.add_tool(sample_record("Nmap", "信息收集"));
    store.add_to_favorites("Nmap");
    store.add_to_recent("Nmap");
    store.set_theme("dark");
    store.save().expect("save state");

    let reloaded = ConfigStore::load(paths);
    assert_eq!(reloaded.state(), store.state());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_fall_back_to_mirror_when_config_file_is_corrupt() {
    let dir = temp_dir();
    let paths = StorePaths::under(&dir);

    let mut store = ConfigStore::load(paths.clone());
    store.add_tool(sample_record("Sqlmap", "漏洞利用"));
    store.set_theme("dark");
    store.save().expect("save state");

    fs::write(&paths.config_path, "{{{ not json").expect("corrupt config");

    let recovered = ConfigStore::load(paths);
    assert_eq!(recovered.tools().len(), 1);
    assert_eq!(recovered.tools()[0].name, "Sqlmap");
    assert_eq!(recovered.state().theme, "dark");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_survive_both_files_corrupt() {
    let dir = temp_dir();
    let paths = StorePaths::under(&dir);
    fs::write(&paths.config_path, "broken").expect("corrupt config");
    fs::write(&paths.settings_path, "broken").expect("corrupt mirror");

    let store = ConfigStore::load(paths);
    assert_eq!(store.state(), &ConfigState::default());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_update_tool_preserving_id_and_launch_stats() {
    let dir = temp_dir();
    let mut store = ConfigStore::load(StorePaths::under(&dir));

    let mut record = sample_record("Dirsearch", "信息收集");
    record.record_launch();
    let id = record.id.clone();
    let stamp = record.last_launch.clone();
    store.add_tool(record);

    let mut edited = sample_record("Dirsearch v2", "漏洞扫描");
    edited.kind = ToolKind::Python;
    edited.args = "-u http://target".to_string();
    store.update_tool(&id, edited).expect("update tool");

    let updated = store.find_tool(&id).expect("tool present");
    assert_eq!(updated.id, id);
    assert_eq!(updated.name, "Dirsearch v2");
    assert_eq!(updated.category, "漏洞扫描");
    assert_eq!(updated.kind, ToolKind::Python);
    assert_eq!(updated.launch_count, 1);
    assert_eq!(updated.last_launch, stamp);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_report_missing_tool_on_update_and_remove() {
    let dir = temp_dir();
    let mut store = ConfigStore::load(StorePaths::under(&dir));

    let error = store
        .update_tool("no-such-id", sample_record("X", "信息收集"))
        .expect_err("unknown id");
    assert_eq!(error.code, "tool_not_found");
    assert!(store.remove_tool("no-such-id").is_err());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_rename_category_and_move_its_tools() {
    let dir = temp_dir();
    let mut store = ConfigStore::load(StorePaths::under(&dir));
    store.add_tool(sample_record("Nmap", "信息收集"));
    store.add_tool(sample_record("Sqlmap", "漏洞利用"));

    store.rename_category("信息收集", "侦察").expect("rename");

    assert!(store.state().categories.iter().any(|c| c == "侦察"));
    assert!(!store.state().categories.iter().any(|c| c == "信息收集"));
    assert_eq!(store.find_tool_by_name("Nmap").category, "侦察");
    assert_eq!(store.find_tool_by_name("Sqlmap").category, "漏洞利用");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_remove_category_and_drop_its_tools() {
    let dir = temp_dir();
    let mut store = ConfigStore::load(StorePaths::under(&dir));
    store.add_tool(sample_record("Nmap", "信息收集"));
    store.add_tool(sample_record("Sqlmap", "漏洞利用"));

    let dropped = store.remove_category("信息收集").expect("remove");
    assert_eq!(dropped, 1);
    assert_eq!(store.tools().len(), 1);
    assert_eq!(store.tools()[0].name, "Sqlmap");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_reject_duplicate_and_blank_categories() {
    let dir = temp_dir();
    let mut store = ConfigStore::load(StorePaths::under(&dir));

    assert_eq!(
        store.add_category("信息收集").expect_err("duplicate").code,
        "category_exists"
    );
    assert_eq!(
        store.add_category("   ").expect_err("blank").code,
        "category_name_empty"
    );
    store.add_category("自定义").expect("new category");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_bound_recent_tools_and_move_repeats_to_front() {
    let dir = temp_dir();
    let mut store = ConfigStore::load(StorePaths::under(&dir));

    for index in 0..25 {
        store.add_to_recent(&format!("tool-{index}"));
    }
    assert_eq!(store.state().recent_tools.len(), RECENT_TOOLS_LIMIT);
    assert_eq!(store.state().recent_tools[0], "tool-24");

    store.add_to_recent("tool-10");
    assert_eq!(store.state().recent_tools.len(), RECENT_TOOLS_LIMIT);
    assert_eq!(store.state().recent_tools[0], "tool-10");
    assert_eq!(
        store
            .state()
            .recent_tools
            .iter()
            .filter(|name| name.as_str() == "tool-10")
            .count(),
        1
    );
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_bound_search_history_and_ignore_blank_queries() {
    let dir = temp_dir();
    let mut store = ConfigStore::load(StorePaths::under(&dir));

    store.add_search_history("   ");
    assert!(store.state().search_history.is_empty());

    for index in 0..12 {
        store.add_search_history(&format!("query-{index}"));
    }
    assert_eq!(store.state().search_history.len(), SEARCH_HISTORY_LIMIT);
    assert_eq!(store.state().search_history[0], "query-11");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_keep_favorites_unique() {
    let dir = temp_dir();
    let mut store = ConfigStore::load(StorePaths::under(&dir));

    store.add_to_favorites("Nmap");
    store.add_to_favorites("Nmap");
    assert_eq!(store.state().favorites, vec!["Nmap".to_string()]);

    store.remove_from_favorites("Nmap");
    assert!(store.state().favorites.is_empty());
    let _ = fs::remove_dir_all(dir);
}

impl ConfigStore {
    fn find_tool_by_name(&self, name: &str) -> &ToolRecord {
        self.tools()
            .iter()
            .find(|record| record.name == name)
            .expect("tool by name")
    }
}
