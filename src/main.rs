use anyhow::{Context, Result};
use clap::Parser;
use log::info;

mod config;
mod datetime;
mod handlers;
mod kimai;
mod markdown;
mod rpc;
mod summary;
mod tools;

use config::KimaiConfig;
use kimai::KimaiClient;

/// MCP server for the Kimai 2 time tracking API.
///
/// Speaks JSON-RPC over stdio; configure the target instance with the
/// `KIMAI_BASE_URL` and `KIMAI_API_TOKEN` environment variables.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Logs go to stderr; stdout belongs to the JSON-RPC channel.
fn setup_logger(verbose: bool) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .context("Failed to initialize logger")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose)?;

    let config = KimaiConfig::from_env().context("Failed to load Kimai configuration")?;
    info!("Using Kimai instance at {}", config.base_url);
    let client = KimaiClient::new(&config).context("Failed to create Kimai client")?;

    rpc::serve(tokio::io::stdin(), tokio::io::stdout(), &client).await
}
