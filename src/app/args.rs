use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "log-console")]
#[command(about = "Log telemetry console for a remote log producer")]
pub struct AppArgs {
    #[arg(long, default_value_t = 8640, help = "Port for the HTTP API and producer socket")]
    pub port: u16,

    #[arg(long, help = "Config file path (TOML)")]
    pub config: Option<String>,

    #[arg(long, default_value = "data", help = "Data directory")]
    pub data_dir: String,

    #[arg(long, help = "Lines kept per tool (overrides the config file)")]
    pub max_entries: Option<usize>,

    #[arg(long, help = "Seconds between config sync passes (overrides the config file)")]
    pub sync_interval_secs: Option<u64>,
}

impl AppArgs {
    pub fn from_cli() -> Self {
        <Self as Parser>::parse()
    }
}
