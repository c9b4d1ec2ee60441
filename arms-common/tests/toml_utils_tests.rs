//! Unit tests for atomic TOML config writes

use arms_common::config::{write_toml_config, LoggingConfig, TomlConfig};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_atomic_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("arms-wm.toml");

    write_toml_config(&TomlConfig::default(), &target).unwrap();

    assert!(target.exists());
    assert!(!temp_dir.path().join("arms-wm.toml.tmp").exists());
}

#[test]
fn test_atomic_write_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested").join("arms-wm.toml");

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/srv/arms")),
        port: Some(5050),
        logging: LoggingConfig {
            level: "warn".to_string(),
            file: Some(PathBuf::from("/var/log/arms.log")),
        },
        ..TomlConfig::default()
    };

    write_toml_config(&config, &target).unwrap();

    let content = std::fs::read_to_string(&target).unwrap();
    assert!(content.contains("root_folder"));
    let parsed: TomlConfig = toml::from_str(&content).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_atomic_write_replaces_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("arms-wm.toml");
    std::fs::write(&target, "port = 1\n").unwrap();

    let config = TomlConfig {
        port: Some(2),
        ..TomlConfig::default()
    };
    write_toml_config(&config, &target).unwrap();

    assert_eq!(TomlConfig::load_or_default(&target).port, Some(2));
}
