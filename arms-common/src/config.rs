//! Configuration loading and root folder resolution
//!
//! Every setting is resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal: it is logged and the
//! defaults are used.

use crate::analysis::KeyScope;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Primary root folder environment variable
pub const ROOT_FOLDER_ENV: &str = "ARMS_ROOT_FOLDER";
/// Alternative root folder environment variable
pub const ROOT_ENV: &str = "ARMS_ROOT";
/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "arms_workflow.db";
/// Upload directory name inside the root folder
pub const UPLOADS_DIR: &str = "uploads";
/// Default request body limit for uploads (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Upload section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_upload_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Metrics section of the TOML config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Which rows' keys the column resolver inspects
    pub key_scope: KeyScope,
}

/// TOML config file contents. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub logging: LoggingConfig,
    pub upload: UploadConfig,
    pub metrics: MetricsConfig,
    pub static_assets: Option<PathBuf>,
}

impl TomlConfig {
    /// Load a config file, falling back to defaults when it is missing or
    /// malformed
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!("Loaded config file {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring malformed config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Could not read config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Write a config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = target.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, target)?;

    Ok(())
}

/// Platform defaults used when nothing else configures a setting
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            // ~/.local/share/arms (or /var/lib/arms for system-wide)
            dirs::data_local_dir()
                .map(|d| d.join("arms"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/arms"))
        } else if cfg!(target_os = "macos") {
            dirs::data_dir()
                .map(|d| d.join("arms"))
                .unwrap_or_else(|| PathBuf::from("/Library/Application Support/arms"))
        } else if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .map(|d| d.join("arms"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\arms"))
        } else {
            PathBuf::from("./arms_data")
        };

        Self {
            root_folder,
            bind_address: "127.0.0.1".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Config file location for a module: `<config dir>/arms/<module>.toml`
///
/// On Linux a system-wide `/etc/arms/<module>.toml` is used when the user
/// file does not exist.
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    let file_name = format!("{}.toml", module_name);
    let user_config = dirs::config_dir().map(|d| d.join("arms").join(&file_name));

    if cfg!(target_os = "linux") {
        if let Some(path) = &user_config {
            if path.exists() {
                return user_config;
            }
        }
        let system_config = PathBuf::from("/etc/arms").join(&file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    user_config
}

/// Resolves the root folder (database and uploads live under it)
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    /// Highest-priority override from the command line
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        for var in [ROOT_FOLDER_ENV, ROOT_ENV] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        if let Some(path) = config_file_path(&self.module_name) {
            if let Some(root) = TomlConfig::load_or_default(&path).root_folder {
                return root;
            }
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder layout and names the files inside it
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root folder and its uploads directory (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.uploads_dir())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }
}

/// Values supplied on the command line (clap also folds environment
/// variables into these)
#[derive(Debug, Clone, Default)]
pub struct SettingOverrides {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub key_scope: Option<KeyScope>,
    pub static_assets: Option<PathBuf>,
}

/// Fully resolved service settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub key_scope: KeyScope,
    pub static_assets: Option<PathBuf>,
}

impl ServiceSettings {
    /// Merge overrides, config file and defaults
    pub fn resolve(module_name: &str, overrides: SettingOverrides, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();

        let root_folder = match overrides.root_folder {
            Some(root) => root,
            None => RootFolderResolver::new(module_name).resolve(),
        };

        Self {
            root_folder,
            bind_address: overrides
                .bind_address
                .or_else(|| toml.bind_address.clone())
                .unwrap_or(defaults.bind_address),
            port: overrides.port.or(toml.port).unwrap_or(defaults.port),
            log_level: overrides
                .log_level
                .unwrap_or_else(|| toml.logging.level.clone()),
            log_file: toml.logging.file.clone().or(defaults.log_file),
            max_upload_bytes: overrides
                .max_upload_bytes
                .unwrap_or(toml.upload.max_upload_bytes),
            key_scope: overrides.key_scope.unwrap_or(toml.metrics.key_scope),
            static_assets: overrides.static_assets.or_else(|| toml.static_assets.clone()),
        }
    }

    /// Socket address string for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
