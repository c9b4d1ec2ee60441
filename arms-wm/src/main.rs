//! arms-wm - ARMS workflow manager service
//!
//! Accepts spreadsheet uploads, computes dashboard metrics over their rows,
//! and turns rows into tracked tasks stored in SQLite.

use anyhow::{Context, Result};
use arms_common::analysis::KeyScope;
use arms_common::config::{
    config_file_path, write_toml_config, RootFolderInitializer, ServiceSettings,
    SettingOverrides, TomlConfig,
};
use arms_common::db::init_database;
use arms_wm::{build_router, AppState};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const MODULE_NAME: &str = "arms-wm";

/// Command-line arguments for arms-wm
#[derive(Parser, Debug)]
#[command(name = "arms-wm")]
#[command(about = "ARMS workflow manager: spreadsheet metrics and task tracking")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "ARMS_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Root folder holding the database and uploads
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Config file (defaults to the per-user arms-wm.toml)
    #[arg(short, long, env = "ARMS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive when RUST_LOG is unset
    #[arg(long, env = "ARMS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Maximum request body size in bytes
    #[arg(long, env = "ARMS_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Rows inspected when resolving columns: first_row or all_rows
    #[arg(long, env = "ARMS_KEY_SCOPE", value_parser = parse_key_scope)]
    key_scope: Option<KeyScope>,

    /// Directory of static front-end files to serve
    #[arg(long, env = "ARMS_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    init_config: bool,
}

fn parse_key_scope(value: &str) -> Result<KeyScope, String> {
    match value {
        "first_row" => Ok(KeyScope::FirstRow),
        "all_rows" => Ok(KeyScope::AllRows),
        other => Err(format!("expected first_row or all_rows, got {:?}", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| config_file_path(MODULE_NAME));
    let toml_config = config_path
        .as_deref()
        .map(TomlConfig::load_or_default)
        .unwrap_or_default();

    let overrides = SettingOverrides {
        root_folder: args.root_folder,
        bind_address: args.bind_address,
        port: args.port,
        log_level: args.log_level,
        max_upload_bytes: args.max_upload_bytes,
        key_scope: args.key_scope,
        static_assets: args.static_dir,
    };
    let settings = ServiceSettings::resolve(MODULE_NAME, overrides, &toml_config);

    init_tracing(&settings.log_level, settings.log_file.as_deref())?;

    // Build identification first, before any slow startup work
    info!(
        "Starting ARMS workflow manager (arms-wm) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if args.init_config {
        let target = config_path.context("No config directory available on this platform")?;
        write_toml_config(&effective_config(&settings, toml_config), &target)?;
        info!("Wrote configuration to {}", target.display());
        return Ok(());
    }

    let initializer = RootFolderInitializer::new(settings.root_folder.clone());
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(pool.clone(), initializer.uploads_dir(), &settings);
    let app = build_router(state);

    let address = settings.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;
    info!("arms-wm listening on http://{}", address);
    info!("Health check: http://{}/api/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }

    Ok(())
}

/// Settings as a config file, keeping file-only values from `base`
fn effective_config(settings: &ServiceSettings, base: TomlConfig) -> TomlConfig {
    let mut config = base;
    config.root_folder = Some(settings.root_folder.clone());
    config.bind_address = Some(settings.bind_address.clone());
    config.port = Some(settings.port);
    config.logging.level = settings.log_level.clone();
    config.upload.max_upload_bytes = settings.max_upload_bytes;
    config.metrics.key_scope = settings.key_scope;
    config.static_assets = settings.static_assets.clone();
    config
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_scope() {
        assert_eq!(parse_key_scope("first_row").unwrap(), KeyScope::FirstRow);
        assert_eq!(parse_key_scope("all_rows").unwrap(), KeyScope::AllRows);
        assert!(parse_key_scope("every_row").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "arms-wm",
            "--port",
            "5100",
            "--key-scope",
            "all_rows",
            "--root-folder",
            "/srv/arms",
        ])
        .unwrap();

        assert_eq!(args.port, Some(5100));
        assert_eq!(args.key_scope, Some(KeyScope::AllRows));
        assert_eq!(args.root_folder, Some(PathBuf::from("/srv/arms")));
        assert!(!args.init_config);
    }
}
