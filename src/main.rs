use anyhow::Result;
use clap::{Parser, Subcommand};
use deal_hunter::config::DEFAULT_SNAPSHOT_PATH;
use deal_hunter::{featured, DealHunter, HunterConfig, JsonFileStore};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "deal_hunter", version, about = "Scan fares and keep the cheapest deal per destination")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search every configured destination and rewrite the snapshot (default)
    Scan,

    /// Print the featured deal from the current snapshot
    Card {
        #[arg(long, env = "HUNTER_SNAPSHOT_PATH", default_value = DEFAULT_SNAPSHOT_PATH)]
        snapshot: PathBuf,

        /// Emit the card as JSON instead of a headline
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("deal_hunter=info,reqwest=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}

async fn scan() -> Result<()> {
    let config = HunterConfig::from_env()?;
    info!(
        origin = %config.origin,
        destinations = config.destinations.len(),
        days_ahead = config.days_ahead,
        "Deal hunter starting"
    );

    let mut hunter = DealHunter::from_config(config)?;
    let summary = hunter.run().await?;

    info!(
        "Mission complete in {:.2}s: {} deals ({} live, {} simulated) saved to {}",
        summary.elapsed.as_secs_f64(),
        summary.deals,
        summary.live,
        summary.simulated,
        summary.snapshot_path.display()
    );
    Ok(())
}

fn card(snapshot: PathBuf, json: bool) -> Result<()> {
    let store = JsonFileStore::new(snapshot);
    match featured(&store)? {
        Some(card) if json => println!("{}", serde_json::to_string_pretty(&card)?),
        Some(card) => println!("{}", card.headline()),
        None => warn!(path = %store.path().display(), "No deals to render yet"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Scan) {
        Command::Scan => scan().await,
        Command::Card { snapshot, json } => card(snapshot, json),
    }
}
