// Neo N3 primitives: Base58Check, addresses, script hashes and asset amounts
pub mod address;
pub mod amount;
pub mod base58;

use serde::{Deserialize, Serialize};

use crate::error::{NeoxError, NeoxResult};

pub use address::{validate as validate_address, Address, AddressCheck, InvalidReason, ScriptHash};
pub use amount::Asset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl Network {
    pub fn default_explorer_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://explorer.onegate.space/api",
            Network::Testnet => "https://testmagnet.explorer.onegate.space/api",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl std::str::FromStr for Network {
    type Err = NeoxError;

    fn from_str(s: &str) -> NeoxResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            _ => Err(NeoxError::invalid_input(format!("Unknown network: {}", s))),
        }
    }
}
