use clap::Parser;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use neoxbridge::cli::commands::{ask, chat, config as config_cmd, inspect};
use neoxbridge::cli::{self, Args, Commands};
use neoxbridge::error::NeoxResult;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("neoxbridge=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(args).await {
        error!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(mut args: Args) -> NeoxResult<()> {
    info!("🌉 NeoXBridge v{}", neoxbridge::VERSION);

    let command = args.command.take().unwrap_or(Commands::Chat);
    let config = cli::load_config(&args).await?;

    match command {
        Commands::Chat => chat::handle_chat(config).await,
        Commands::Ask { message } => ask::handle_ask(config, message).await,
        Commands::Validate { address } => inspect::handle_validate(&address),
        Commands::Balance { address } => inspect::handle_balance(&config, &address).await,
        Commands::Scan { target } => inspect::handle_scan(&config, &target).await,
        Commands::Config { action } => config_cmd::handle_config(&config, action).await,
    }
}
