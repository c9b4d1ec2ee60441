//! Unit tests for configuration resolution and graceful degradation
//!
//! Covers:
//! - Missing or malformed TOML files never abort startup
//! - Root folder priority: CLI → environment → TOML → compiled default
//! - Root folder layout (database file, uploads directory)
//! - Merging of overrides, TOML values and defaults
//!
//! Tests that touch ARMS_ROOT_FOLDER / ARMS_ROOT are marked #[serial] so they
//! never race each other.

use arms_common::analysis::KeyScope;
use arms_common::config::{
    CompiledDefaults, LoggingConfig, RootFolderInitializer, RootFolderResolver, ServiceSettings,
    SettingOverrides, TomlConfig, DEFAULT_MAX_UPLOAD_BYTES, ROOT_ENV, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_root_env() {
    env::remove_var(ROOT_FOLDER_ENV);
    env::remove_var(ROOT_ENV);
}

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.log_level, "info");
    assert!(defaults.log_file.is_none());
    assert_eq!(defaults.port, 5000);
    assert_eq!(defaults.bind_address, "127.0.0.1");

    #[cfg(target_os = "linux")]
    {
        assert!(defaults.root_folder.ends_with("arms"));
    }
}

#[test]
#[serial]
fn test_resolver_cli_arg_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/arms-env-root");

    let resolver =
        RootFolderResolver::new("test-module").with_cli_arg(Some(PathBuf::from("/tmp/arms-cli")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/arms-cli"));

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_env_var_root_folder() {
    clear_root_env();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/arms-test-env-folder");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/arms-test-env-folder"));

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_root_folder_env_takes_precedence() {
    clear_root_env();
    env::set_var(ROOT_FOLDER_ENV, "/tmp/arms-priority-1");
    env::set_var(ROOT_ENV, "/tmp/arms-priority-2");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/arms-priority-1"));

    clear_root_env();
}

#[test]
#[serial]
fn test_resolver_missing_config_file_uses_default() {
    clear_root_env();

    // A module name that will never have a config file
    let root_folder = RootFolderResolver::new("nonexistent-test-module-12345").resolve();

    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
fn test_initializer_layout() {
    let root = PathBuf::from("/tmp/arms-test-root");
    let initializer = RootFolderInitializer::new(root.clone());

    assert_eq!(initializer.database_path(), root.join("arms_workflow.db"));
    assert_eq!(initializer.uploads_dir(), root.join("uploads"));
}

#[test]
fn test_initializer_creates_nested_directories_idempotently() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("level1").join("level2");
    let initializer = RootFolderInitializer::new(root.clone());

    assert!(!initializer.database_exists());
    initializer.ensure_directory_exists().unwrap();
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert!(initializer.uploads_dir().is_dir());
}

#[test]
fn test_load_missing_config_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = TomlConfig::load_or_default(&temp_dir.path().join("absent.toml"));
    assert_eq!(config, TomlConfig::default());
    assert_eq!(config.upload.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
}

#[test]
fn test_load_malformed_config_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "port = \"not a number\"\n[logging\n").unwrap();

    assert_eq!(TomlConfig::load_or_default(&path), TomlConfig::default());
}

#[test]
fn test_partial_config_fills_in_defaults() {
    let toml_str = r#"
        port = 8080
        [metrics]
        key_scope = "all_rows"
    "#;

    let config: TomlConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.port, Some(8080));
    assert_eq!(config.metrics.key_scope, KeyScope::AllRows);
    assert_eq!(config.logging, LoggingConfig::default());
    assert!(config.root_folder.is_none());
}

#[test]
fn test_settings_prefer_overrides_then_toml() {
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/srv/arms")),
        bind_address: Some("0.0.0.0".to_string()),
        port: Some(8080),
        logging: LoggingConfig {
            level: "debug".to_string(),
            file: None,
        },
        ..TomlConfig::default()
    };

    let overrides = SettingOverrides {
        root_folder: Some(PathBuf::from("/data/arms")),
        port: Some(9000),
        key_scope: Some(KeyScope::AllRows),
        ..SettingOverrides::default()
    };

    let settings = ServiceSettings::resolve("test-module", overrides, &toml);
    assert_eq!(settings.root_folder, PathBuf::from("/data/arms"));
    assert_eq!(settings.port, 9000);
    assert_eq!(settings.bind_address, "0.0.0.0");
    assert_eq!(settings.log_level, "debug");
    assert_eq!(settings.key_scope, KeyScope::AllRows);
    assert_eq!(settings.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert_eq!(settings.listen_address(), "0.0.0.0:9000");
}

#[test]
#[serial]
fn test_settings_fall_back_to_compiled_defaults() {
    clear_root_env();

    let settings = ServiceSettings::resolve(
        "nonexistent-test-module-12345",
        SettingOverrides::default(),
        &TomlConfig::default(),
    );
    let defaults = CompiledDefaults::for_current_platform();

    assert_eq!(settings.root_folder, defaults.root_folder);
    assert_eq!(settings.port, 5000);
    assert_eq!(settings.log_level, "info");
    assert_eq!(settings.key_scope, KeyScope::FirstRow);
    assert!(settings.static_assets.is_none());
}
