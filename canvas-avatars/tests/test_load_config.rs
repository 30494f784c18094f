use canvas_avatars::load_config::{
    load_config, locate_settings, SettingsFormat, ACCESS_TOKEN_ENV,
};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const SETTINGS_JSON: &str = r#"{
    "working_path": "/srv/avatars",
    "images_path": "images",
    "csv_directory": "roster",
    "csv_filename": "students.csv",
    "domain": "school.instructure.com",
    "access_token": "file-token",
    "log_filename": "logs/upload.log"
}"#;

const SETTINGS_YAML: &str = r#"
working_path: /srv/avatars
images_path: /data/images
csv_directory: roster
csv_filename: students.csv
domain: school.instructure.com
log_filename: upload.log
"#;

/// This test ensures a JSON settings file loads and derived paths resolve against working_path.
#[test]
#[serial]
fn test_load_config_json_resolves_relative_paths() {
    env::remove_var(ACCESS_TOKEN_ENV);
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    write(&path, SETTINGS_JSON).unwrap();

    let settings = load_config(&path).expect("Settings should load");

    assert_eq!(settings.access_token, "file-token");
    assert_eq!(settings.domain, "school.instructure.com");
    assert_eq!(settings.images_dir(), PathBuf::from("/srv/avatars/images"));
    assert_eq!(
        settings.roster_path(),
        PathBuf::from("/srv/avatars/roster/students.csv")
    );
    assert_eq!(
        settings.log_path(),
        PathBuf::from("/srv/avatars/logs/upload.log")
    );
}

/// This test ensures the YAML parser is chosen for .yml files and the token comes from env.
#[test]
#[serial]
fn test_load_config_yaml_takes_token_from_env() {
    env::set_var(ACCESS_TOKEN_ENV, "env-token");
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.yml");
    write(&path, SETTINGS_YAML).unwrap();

    let settings = load_config(&path).expect("Settings should load");
    env::remove_var(ACCESS_TOKEN_ENV);

    assert_eq!(settings.access_token, "env-token");
    assert_eq!(settings.images_dir(), PathBuf::from("/data/images"));
}

/// This test ensures the env token overrides the one in the file.
#[test]
#[serial]
fn test_env_token_overrides_file_token() {
    env::set_var(ACCESS_TOKEN_ENV, "env-token");
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    write(&path, SETTINGS_JSON).unwrap();

    let settings = load_config(&path).expect("Settings should load");
    env::remove_var(ACCESS_TOKEN_ENV);

    assert_eq!(settings.access_token, "env-token");
}

/// This test ensures a run without any token is refused up front.
#[test]
#[serial]
fn test_load_config_errors_without_token() {
    env::remove_var(ACCESS_TOKEN_ENV);
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.yaml");
    write(&path, SETTINGS_YAML).unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(
        err.to_string().contains("access token"),
        "Missing token error expected, got: {err}"
    );
}

/// This test ensures that invalid content and unknown extensions are reported as such.
#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    env::remove_var(ACCESS_TOKEN_ENV);
    let dir = tempdir().unwrap();

    let yaml = dir.path().join("settings.yaml");
    write(&yaml, b"not-yaml: [:::").unwrap();
    let msg = load_config(&yaml).unwrap_err().to_string();
    assert!(msg.contains("YAML"), "Parse error expected, got: {msg}");

    let json = dir.path().join("settings.json");
    write(&json, b"{ \"domain\": ").unwrap();
    let msg = load_config(&json).unwrap_err().to_string();
    assert!(msg.contains("JSON"), "Parse error expected, got: {msg}");

    let toml = dir.path().join("settings.toml");
    write(&toml, b"domain = 'x'").unwrap();
    let msg = load_config(&toml).unwrap_err().to_string();
    assert!(msg.contains("Unsupported"), "Extension error expected, got: {msg}");
}

#[test]
fn test_settings_format_from_path() {
    let cases = [
        ("a.json", Some(SettingsFormat::Json)),
        ("a.JSON", Some(SettingsFormat::Json)),
        ("a.yaml", Some(SettingsFormat::Yaml)),
        ("a.yml", Some(SettingsFormat::Yaml)),
        ("a.txt", None),
        ("settings", None),
    ];
    for (path, expected) in cases {
        assert_eq!(SettingsFormat::from_path(Path::new(path)), expected, "{path}");
    }
}

#[test]
fn test_locate_settings_is_deterministic() {
    let dir = tempdir().unwrap();
    write(dir.path().join("b.yaml"), SETTINGS_YAML).unwrap();
    write(dir.path().join("a.json"), SETTINGS_JSON).unwrap();
    write(dir.path().join("notes.txt"), "ignore me").unwrap();

    // Without a preferred name, the first supported file by name wins.
    assert_eq!(locate_settings(dir.path()).unwrap(), dir.path().join("a.json"));

    // A preferred name beats name order.
    write(dir.path().join("settings.yml"), SETTINGS_YAML).unwrap();
    assert_eq!(
        locate_settings(dir.path()).unwrap(),
        dir.path().join("settings.yml")
    );
    write(dir.path().join("settings.json"), SETTINGS_JSON).unwrap();
    assert_eq!(
        locate_settings(dir.path()).unwrap(),
        dir.path().join("settings.json")
    );
}

#[test]
fn test_locate_settings_errors_when_nothing_supported() {
    let dir = tempdir().unwrap();
    write(dir.path().join("readme.md"), "no settings here").unwrap();
    assert!(locate_settings(dir.path()).is_err());
    assert!(locate_settings(&dir.path().join("missing")).is_err());
}
