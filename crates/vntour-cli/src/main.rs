mod keywords;
mod monitor;
mod trends;
mod youtube;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keywords::KeywordsCommands;
use monitor::MonitorArgs;
use trends::TrendsCommands;
use youtube::YoutubeCommands;

#[derive(Debug, Parser)]
#[command(name = "vntour")]
#[command(about = "Vietnam tourism signal collectors: Google Trends, YouTube hashtags, job monitor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Destination keyword preparation
    Keywords {
        #[command(subcommand)]
        command: KeywordsCommands,
    },
    /// Google Trends fetching and analysis
    Trends {
        #[command(subcommand)]
        command: TrendsCommands,
    },
    /// YouTube hashtag and per-province video collection
    Youtube {
        /// YouTube Data API key (overrides `YOUTUBE_API_KEY`)
        #[arg(long, global = true)]
        api_key: Option<String>,
        #[command(subcommand)]
        command: YoutubeCommands,
    },
    /// Watch a fetch job's log file and print progress
    Monitor(MonitorArgs),
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config =
        vntour_core::load_app_config().map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    init_tracing(&config.log_level);
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Keywords { command } => keywords::run(command),
        Commands::Trends { command } => trends::run(&config, command).await,
        Commands::Youtube { api_key, command } => {
            youtube::run(&config, api_key.as_deref(), command).await
        }
        Commands::Monitor(args) => monitor::run(&config, args).await,
    }
}
