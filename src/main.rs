//! The main entry point for the log console.
use anyhow::Result;

/// Starts the console with the command-line arguments.
///
/// # Errors
///
/// Returns an error if setup fails or the server stops with an error.
#[tokio::main]
async fn main() -> Result<()> {
    log_console::app::launch().await
}
