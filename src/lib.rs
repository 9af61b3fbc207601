//! # NeoXBridge - Neo N3 in plain language
//!
//! NeoXBridge turns chat messages into Neo N3 operations: it classifies each
//! message into an intent, validates its parameters and calls one external
//! service (the OneGate explorer, GoPlus security API, CoinGecko or an LLM).
//!
//! ## Features
//!
//! - **Address & Key Handling**: Neo N3 address validation, hex/WIF key import and address derivation
//! - **Chain Data**: Balances, blocks, NFTs, transfer history and governance via OneGate
//! - **Security Scans**: Address, token contract and URL risk reports via GoPlus Labs
//! - **Price Alerts**: CoinGecko quotes and an in-memory alert book
//! - **Transfers**: Confirmed NEO/GAS transfers, simulated in demo mode
//! - **LLM Support**: OpenAI-compatible and Ollama providers with keyword fallback
//!
//! ## Usage
//!
//! ```rust,no_run
//! use neoxbridge::{agents::Agent, config::ConfigManager};
//!
//! #[tokio::main]
//! async fn main() -> neoxbridge::error::NeoxResult<()> {
//!     let config = ConfigManager::new().load_config().await?;
//!     let mut agent = Agent::from_config(config).await?;
//!
//!     let response = agent.process_message("block height").await;
//!     println!("{}", response.message);
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod neo;
pub mod prices;
pub mod providers;
pub mod security;
pub mod wallet;

// Re-export commonly used types
pub use agents::{Agent, AgentResponse, Services};
pub use config::{ConfigManager, NeoxConfig};
pub use error::{NeoxError, NeoxResult};
pub use neo::{Address, Network, ScriptHash};
pub use wallet::WalletSession;

/// Current version of NeoXBridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
