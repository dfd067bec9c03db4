pub mod args;
pub mod config;
mod server;
mod setup;

pub use args::AppArgs;
pub use config::ConsoleConfig;

use anyhow::Result;

pub async fn launch() -> Result<()> {
    launch_with_args(AppArgs::from_cli()).await
}

pub async fn launch_with_args(args: AppArgs) -> Result<()> {
    let setup::PreparedApp { args, config, db } = setup::prepare(args)?;

    server::run(config, db, args.port).await
}
