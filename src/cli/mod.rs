use clap::{Parser, Subcommand};

use crate::config::{ConfigManager, NeoxConfig};
use crate::error::NeoxResult;
use crate::neo::Network;

pub mod commands;
pub mod ui;

#[derive(Parser)]
#[command(name = "neoxbridge")]
#[command(about = "🌉 NeoXBridge - Neo N3 in plain language")]
#[command(long_about = "A conversational assistant for the Neo N3 blockchain: balances, security scans, chain data, price alerts and NEO/GAS transfers")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Neo network to use (overrides NEO_NETWORK)
    #[arg(long, global = true, value_parser = parse_network)]
    pub network: Option<Network>,

    /// Disable demo mode for this run
    #[arg(long, global = true)]
    pub live: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session (default)
    Chat,

    /// Send a single message to the assistant
    Ask {
        /// Message to send
        message: String,
    },

    /// Validate a Neo N3 address offline
    Validate {
        /// Address to check
        address: String,
    },

    /// Show the NEO/GAS and token balances of an address
    Balance {
        /// Address to look up
        address: String,
    },

    /// Security scan of an address, token contract or URL
    Scan {
        /// Address, 0x contract hash or URL
        target: String,
    },

    /// Configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show which services are configured
    Status,
    /// Print the config file location
    Path,
}

fn parse_network(value: &str) -> Result<Network, String> {
    value.parse().map_err(|e: crate::error::NeoxError| e.to_string())
}

/// Loads file and environment configuration, then applies command-line flags.
pub async fn load_config(args: &Args) -> NeoxResult<NeoxConfig> {
    let mut config = ConfigManager::new().load_config().await?;
    if let Some(network) = args.network {
        config.neo.network = network;
    }
    if args.live {
        config.demo_mode = false;
    }
    Ok(config)
}
