use std::path::PathBuf;

use clap::{Parser, Subcommand};
use seed::Network;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the stored catalog with a JSON file or http(s) URL.
    Import {
        source: String,

        #[arg(long, env = "REDIS_URL")]
        redis_url: String,
    },

    /// Write the stored catalog (or the built-in one) to a JSON file.
    Export {
        path: PathBuf,

        #[arg(long, env = "REDIS_URL")]
        redis_url: Option<String>,
    },

    /// Resolve every site's icon from this machine and report what wins.
    Icons {
        /// Catalog file or URL; defaults to the built-in catalog.
        #[arg(long)]
        source: Option<String>,

        #[arg(long, value_enum, default_value_t = Network::Auto)]
        network: Network,

        /// Time allowed per icon candidate.
        #[arg(long, default_value_t = 4000)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match Args::parse().command {
        Command::Import { source, redis_url } => seed::import(&source, &redis_url).await,
        Command::Export { path, redis_url } => seed::export(&path, redis_url.as_deref()).await,
        Command::Icons {
            source,
            network,
            timeout_ms,
        } => seed::icons(source.as_deref(), network, timeout_ms).await,
    }
}
