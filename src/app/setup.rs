//! This module handles the initial setup of the application.
use super::args::AppArgs;
use super::config::ConsoleConfig;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Contains all the necessary components for the application to run.
///
/// This struct is created by the `prepare` function and passed to
/// `server::run`.
pub struct PreparedApp {
    /// The command-line arguments.
    pub args: AppArgs,
    /// The effective settings after applying CLI overrides.
    pub config: ConsoleConfig,
    /// The database instance.
    pub db: sled::Db,
}

/// Prepares the application for running.
///
/// This function performs the following steps:
/// 1. Configures logging.
/// 2. Resolves the settings from the config file and CLI.
/// 3. Prints a start banner.
/// 4. Creates the data directory.
/// 5. Opens the database.
///
/// # Errors
///
/// This function will return an error if any of the setup steps fail.
pub fn prepare(args: AppArgs) -> Result<PreparedApp> {
    configure_logging();

    let config = ConsoleConfig::resolve(&args)?;
    print_start_banner(&args, &config);

    std::fs::create_dir_all(&args.data_dir)?;

    let db_path = format!("{}/db", args.data_dir);
    let db = sled::open(&db_path)?;

    Ok(PreparedApp { args, config, db })
}

/// Configures logging for the application.
///
/// `RUST_LOG` takes precedence over the built-in filter.
fn configure_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,log_console=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Prints a banner with startup information.
fn print_start_banner(args: &AppArgs, config: &ConsoleConfig) {
    println!("🚀 Starting log console");
    println!("API: http://127.0.0.1:{}/api", args.port);
    println!("Producer socket: ws://127.0.0.1:{}/ws/producer", args.port);
    println!("Lines per tool: {}", config.max_entries_per_tool);
    println!("Data directory: {}", args.data_dir);
    println!();
}
