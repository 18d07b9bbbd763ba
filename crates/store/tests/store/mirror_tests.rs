use super::*;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("arsenal-mirror-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn should_return_none_for_absent_key() {
    let dir = temp_dir();
    let mirror = SettingsMirror::new(dir.join("settings.json"));

    let value: Option<String> = mirror.get("theme");
    assert!(value.is_none());
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_roundtrip_value_through_set_and_get() {
    let dir = temp_dir();
    let mirror = SettingsMirror::new(dir.join("settings.json"));

    mirror.set("theme", &"dark".to_string()).expect("set theme");
    mirror
        .set("recent_tools", &vec!["Nmap".to_string(), "Burp".to_string()])
        .expect("set recents");

    assert_eq!(mirror.get::<String>("theme"), Some("dark".to_string()));
    assert_eq!(
        mirror.get::<Vec<String>>("recent_tools"),
        Some(vec!["Nmap".to_string(), "Burp".to_string()])
    );
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_merge_batch_writes_with_existing_keys() {
    let dir = temp_dir();
    let mirror = SettingsMirror::new(dir.join("settings.json"));

    mirror.set("theme", &"light".to_string()).expect("set theme");
    mirror
        .set_batch(&[
            ("view_mode", SettingsMirror::encode(&"grid").expect("encode")),
            ("auto_refresh", SettingsMirror::encode(&false).expect("encode")),
        ])
        .expect("batch write");

    assert_eq!(mirror.get::<String>("theme"), Some("light".to_string()));
    assert_eq!(mirror.get::<String>("view_mode"), Some("grid".to_string()));
    assert_eq!(mirror.get::<bool>("auto_refresh"), Some(false));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_read_none_for_malformed_value_payload() {
    let dir = temp_dir();
    let path = dir.join("settings.json");
    fs::write(&path, r#"{"theme": "not-json-encoded"}"#).expect("seed file");

    let mirror = SettingsMirror::new(path);
    assert_eq!(mirror.get::<Vec<String>>("theme"), None);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn should_read_none_when_file_is_corrupt() {
    let dir = temp_dir();
    let path = dir.join("settings.json");
    fs::write(&path, "{{{{ broken").expect("seed file");

    let mirror = SettingsMirror::new(path.clone());
    assert_eq!(mirror.get::<String>("theme"), None);

    // A write replaces the corrupt file instead of failing.
    mirror.set("theme", &"dark".to_string()).expect("set over corrupt");
    assert_eq!(mirror.get::<String>("theme"), Some("dark".to_string()));
    let _ = fs::remove_dir_all(dir);
}
