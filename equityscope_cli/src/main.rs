mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use equityscope_lib::{CachedClient, Config};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "equityscope")]
#[command(about = "Screen equities by sector valuation and inspect single tickers")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// TOML config file (defaults to $EQUITYSCOPE_CONFIG when set)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available markets
    Markets(commands::markets::MarketsArgs),
    /// List the ticker symbols of a market
    Universe(commands::universe::UniverseArgs),
    /// List the sectors of a market with ticker counts
    Sectors(commands::sectors::SectorsArgs),
    /// Quartile-ranked valuation table for one sector
    Sector(Box<commands::sector::SectorArgs>),
    /// Company info, price history, and dividends for one ticker
    Ticker(commands::ticker::TickerArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("equityscope=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    let config = Config::load(cli.config.as_deref())?;
    let client = CachedClient::from_config(&config)?;

    match &cli.command {
        Commands::Markets(args) => commands::markets::run(args, &client, &format)?,
        Commands::Universe(args) => commands::universe::run(args, &client, &format).await?,
        Commands::Sectors(args) => commands::sectors::run(args, &client, &format).await?,
        Commands::Sector(args) => commands::sector::run(args.as_ref(), &client, &format).await?,
        Commands::Ticker(args) => commands::ticker::run(args, &client, &format).await?,
    }

    Ok(())
}
